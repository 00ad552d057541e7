// Mapping of collector and topology failures onto HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use thiserror::Error;

use crate::topology::TopologyError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error("{0:#}")]
    Collector(#[from] anyhow::Error),
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Topology(TopologyError::NotFound { .. }) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Topology(TopologyError::Consistency(_)) => {
                (StatusCode::CONFLICT, "consistency_violation")
            }
            ApiError::Topology(TopologyError::Malformed(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "malformed_snapshot")
            }
            ApiError::Collector(_) => (StatusCode::INTERNAL_SERVER_ERROR, "collector"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!(error = %message, "snapshot collection failed");
        } else {
            tracing::debug!(error = %message, kind, "topology query failed");
        }
        (
            status,
            axum::Json(serde_json::json!({
                "error": kind,
                "message": message,
            })),
        )
            .into_response()
    }
}
