//! ryw Server - axum adapter for read-your-writes consistency
//!
//! Wraps any router with the transactional consistency middleware and ships
//! a small status API:
//! - GET /health - Liveness probe
//! - GET /replication/status - Role and replication position of this node
//!
//! Reads carrying a `txnum` cookie wait for this node to catch up, or are
//! replayed to the primary. Writes on a replica are replayed straight away;
//! writes on the primary get a fresh cookie.

use axum::{Router, middleware as axum_middleware, routing::get};
use ryw_core::{ConsistencyEngine, InstanceDiscovery, WriteGate};
use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;

use config::Config;
use error::ServerError;
use middleware::ReplayRendering;

/// ryw server state
#[derive(Debug, Clone)]
pub struct RywServer {
    /// Read-path decisions
    pub engine: Arc<ConsistencyEngine>,
    /// Write-path enforcement and cookie minting
    pub gate: Arc<WriteGate>,
    /// Peer addresses, when app name and port are configured
    pub discovery: Option<InstanceDiscovery>,
    /// How replay directives are put on the wire
    pub rendering: ReplayRendering,
}

impl RywServer {
    /// Build server state from a validated configuration
    pub fn from_config(config: &Config) -> Result<Self, ServerError> {
        config.validate()?;

        let consistency = &config.consistency;
        let engine = ConsistencyEngine::from_config(consistency)?;
        let gate = WriteGate::from_config(consistency, config.cookie.clone())?;
        let discovery = match (&consistency.app_name, consistency.port) {
            (Some(_), Some(_)) => Some(InstanceDiscovery::from_config(consistency)?),
            _ => None,
        };

        Ok(Self {
            engine: Arc::new(engine),
            gate: Arc::new(gate),
            discovery,
            rendering: config.replay,
        })
    }
}

/// Put the consistency middleware in front of `router`
pub fn with_consistency(router: Router, server: Arc<RywServer>) -> Router {
    router.layer(axum_middleware::from_fn_with_state(
        server,
        middleware::transactional_consistency,
    ))
}

/// Status routes behind the consistency middleware
pub fn router(server: Arc<RywServer>) -> Router {
    let app = Router::new()
        .route("/health", get(api::status::health))
        .route("/replication/status", get(api::status::replication_status))
        .with_state(server.clone());
    with_consistency(app, server)
}
