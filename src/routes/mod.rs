// HTTP routes: each request takes a fresh snapshot and answers one topology query

mod error;
mod http;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::collector::SysfsCollector;
use crate::topology::{Snapshot, Topology};

pub use error::ApiError;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) collector: Arc<SysfsCollector>,
}

impl AppState {
    async fn snapshot(&self) -> Result<Snapshot, ApiError> {
        self.collector.snapshot().await.map_err(ApiError::Collector)
    }

    async fn topology(&self) -> Result<Topology, ApiError> {
        let snapshot = self.snapshot().await?;
        Ok(Topology::build(&snapshot)?)
    }
}

pub fn app(collector: Arc<SysfsCollector>) -> Router {
    let state = AppState { collector };
    Router::new()
        .route("/", get(|| async { "hostnet: host network topology" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/snapshot", get(http::snapshot_handler)) // GET /api/snapshot
        .route("/api/graph", get(http::graph_handler)) // GET /api/graph
        .route("/api/networks/bridgeless", get(http::bridgeless_handler)) // GET /api/networks/bridgeless
        .route("/api/networks/{network}", get(http::network_handler)) // GET /api/networks/:network
        .route("/api/devices/{device}", get(http::device_handler)) // GET /api/devices/:device
        .route("/api/nics/{nic}/bonding", get(http::nic_bonding_handler)) // GET /api/nics/:nic/bonding
        .route("/api/bondings/{bonding}", get(http::bonding_handler)) // GET /api/bondings/:bonding
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
