// Handlers module - API endpoint processors
//
// - POST /v1/operations
// - GET  /healthz

pub mod operations;

use crate::gateway::service::GroundedRequestGateway;

/// Shared application state for Axum handlers
#[derive(Clone)]
pub struct AppState {
    pub gateway: GroundedRequestGateway,
}

impl AppState {
    pub fn new(gateway: GroundedRequestGateway) -> Self {
        Self { gateway }
    }
}
