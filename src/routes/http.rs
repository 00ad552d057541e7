// GET handlers: version, snapshot and topology queries

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Serialize;

use super::{ApiError, AppState};

/// GET /version — returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/snapshot — the raw facts the topology is built from.
pub(super) async fn snapshot_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.snapshot().await?))
}

pub(super) async fn graph_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.topology().await?.graph()))
}

pub(super) async fn bridgeless_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let topology = state.topology().await?;
    let networks: Vec<String> = topology
        .bridgeless_networks()
        .into_iter()
        .map(str::to_string)
        .collect();
    Ok(axum::Json(networks))
}

/// GET /api/networks/:network — NICs, VLAN tag and bonding carrying the network.
pub(super) async fn network_handler(
    State(state): State<AppState>,
    Path(network): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let topology = state.topology().await?;
    Ok(axum::Json(topology.decompose(&network)?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Attachment {
    network: String,
    vlan: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeviceView {
    device: String,
    networks: Vec<String>,
    attachments: Vec<Attachment>,
    vlans: Vec<String>,
}

/// GET /api/devices/:device — networks riding on a NIC, bonding or VLAN.
pub(super) async fn device_handler(
    State(state): State<AppState>,
    Path(device): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let topology = state.topology().await?;
    let view = DeviceView {
        networks: topology
            .networks_for_device(&device)
            .into_iter()
            .map(str::to_string)
            .collect(),
        attachments: topology
            .networks_and_vlans_for_device(&device)
            .map(|(network, vlan)| Attachment {
                network: network.to_string(),
                vlan: vlan.map(str::to_string),
            })
            .collect(),
        vlans: topology
            .vlans_for_device(&device)
            .map(str::to_string)
            .collect(),
        device,
    };
    Ok(axum::Json(view))
}

/// GET /api/nics/:nic/bonding — the bonding a NIC is enslaved to, or null.
pub(super) async fn nic_bonding_handler(
    State(state): State<AppState>,
    Path(nic): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let topology = state.topology().await?;
    let bonding = topology.bonding_for_nic(&nic)?;
    Ok(axum::Json(serde_json::json!({
        "nic": nic,
        "bonding": bonding,
    })))
}

/// GET /api/bondings/:bonding — slaves, and whether several networks share the bond.
pub(super) async fn bonding_handler(
    State(state): State<AppState>,
    Path(bonding): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let topology = state.topology().await?;
    let slaves = topology.nics_for_bonding(&bonding)?;
    let shared = topology.is_bonding_shared(&bonding)?;
    Ok(axum::Json(serde_json::json!({
        "bonding": bonding,
        "slaves": slaves,
        "shared": shared,
    })))
}
