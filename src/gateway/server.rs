// Gateway Server - Route assembly, middleware stack, and server lifecycle

use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tracing::{error, info};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::gateway::error::GatewayError;
use crate::gateway::handlers::{operations, AppState};
use crate::gateway::service::GroundedRequestGateway;
use crate::models::ServerConfig;

/// Assemble routes and middleware
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/v1/operations", post(operations::handle_execute))
        .route("/healthz", get(operations::handle_health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// GatewayServer - Server lifecycle management
// ============================================================================

#[derive(Clone)]
pub struct GatewayServer {
    shutdown_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
    pub local_addr: std::net::SocketAddr,
}

impl GatewayServer {
    /// Bind and start serving in a background task
    pub async fn start(
        config: &ServerConfig,
        gateway: GroundedRequestGateway,
    ) -> Result<(Self, tokio::task::JoinHandle<()>), GatewayError> {
        let app = build_router(AppState::new(gateway), config.max_body_bytes);

        let addr = format!("{}:{}", config.bind_host(), config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| GatewayError::Config(format!("Failed to bind {}: {}", addr, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| GatewayError::Config(format!("Failed to read bound address: {}", e)))?;

        info!("Gateway server started at http://{}", local_addr);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
                info!("Gateway server shutting down");
            };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!("Gateway server error: {}", e);
            }
        });

        let server = Self {
            shutdown_tx: Arc::new(Mutex::new(Some(shutdown_tx))),
            local_addr,
        };
        Ok((server, handle))
    }

    /// Signal graceful shutdown. Idempotent.
    pub async fn stop(&self) {
        if let Some(tx) = self.shutdown_tx.lock().await.take() {
            let _ = tx.send(());
            info!("Gateway server stop signal sent");
        }
    }
}
