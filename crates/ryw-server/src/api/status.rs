//! Health and replication status endpoints

use crate::RywServer;
use axum::extract::{Json, State};
use ryw_core::{PositionSource, TxNumber};
use serde::Serialize;
use std::sync::Arc;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests
    pub status: &'static str,
    /// Server version
    pub version: &'static str,
}

/// Replication status response
#[derive(Debug, Serialize)]
pub struct ReplicationStatusResponse {
    /// Instance named by the leader marker
    pub primary_instance: String,
    /// This process
    pub current_instance: String,
    /// Whether this process is the primary
    pub current_is_primary: bool,
    /// Local replication position
    pub tx_number: TxNumber,
    /// Internal address of the primary, when discovery is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_address: Option<String>,
}

/// Liveness probe
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Current role and replication position of this node
pub async fn replication_status(
    State(server): State<Arc<RywServer>>,
) -> Json<ReplicationStatusResponse> {
    let info = server.engine.resolver().resolve().await;
    let tx_number = server.engine.position().tx_number().await;
    let primary_address = server
        .discovery
        .as_ref()
        .map(|discovery| discovery.primary_address(&info));

    Json(ReplicationStatusResponse {
        primary_instance: info.primary_instance,
        current_instance: info.current_instance,
        current_is_primary: info.current_is_primary,
        tx_number,
        primary_address,
    })
}
