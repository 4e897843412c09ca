// Operations Handler - /v1/operations
//
// JSON in, normalized OperationResult out. Every failure is rendered with a
// generic message and an opaque type; provider text never reaches the client.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::debug;

use super::AppState;
use crate::gateway::error::GatewayError;
use crate::models::{OperationRequest, OperationResult};

pub const GENERIC_ERROR_MESSAGE: &str = "request could not be processed";

/// Client-facing wrapper for gateway failures
#[derive(Debug)]
pub struct ApiError(pub GatewayError);

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Auth(_) | GatewayError::Transport { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "type": self.0.kind(),
                "message": GENERIC_ERROR_MESSAGE,
                "retryable": self.0.is_retryable()
            }
        });
        (self.status_code(), Json(body)).into_response()
    }
}

/// POST /v1/operations
pub async fn handle_execute(
    State(state): State<AppState>,
    payload: Result<Json<OperationRequest>, JsonRejection>,
) -> Result<Json<OperationResult>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!("Rejected operation body: status={}", rejection.status());
        ApiError(GatewayError::Validation("malformed request body".to_string()))
    })?;

    let result = state.gateway.execute(request).await?;
    Ok(Json(result))
}

/// GET /healthz
pub async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "api_key_configured": state.gateway.has_api_key()
    }))
}
