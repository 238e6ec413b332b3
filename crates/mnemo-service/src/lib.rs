//! HTTP embedding and vector-search service for mnemo.
//!
//! The service owns the embedding model and the vector index, and exposes
//! four operations over HTTP with JSON bodies:
//!
//! - `POST /index`  — embed and upsert documents into a namespace
//! - `POST /search` — top-k similarity search across one or more namespaces
//! - `POST /clear`  — drop a namespace
//! - `GET  /health` — readiness (model warm-up state + collections)
//! - `GET  /status` — health plus per-namespace document counts
//!
//! The process is designed to be spawned by `mnemo-client`: once the
//! listener is bound it prints `MNEMO LISTENING <url>` on stdout, and once
//! the embedding model finishes warm-up it prints `MNEMO MODEL_READY`.
//! Model loading is asynchronous relative to process start — requests that
//! need the model fail with `model_not_ready` until warm-up completes.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{ModelConfig, ModelKind, ServiceConfig};
pub use error::{Result, ServiceError};
pub use state::AppState;

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use mnemo_types::handshake;

/// The mnemo embedding service.
pub struct Service {
    state: AppState,
}

impl Service {
    /// Create a service from configuration.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        Ok(Self {
            state: AppState::new(config)?,
        })
    }

    /// Create a service from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Access the application state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        use axum::routing::{get, post};

        Router::new()
            .route("/health", get(routes::health_handler))
            .route("/status", get(routes::status_handler))
            .route("/index", post(routes::index_handler))
            .route("/search", post(routes::search_handler))
            .route("/clear", post(routes::clear_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind, announce, warm up the model, and serve until shutdown.
    ///
    /// Announcements go to stdout for the launcher handshake; port 0 in the
    /// config resolves to the ephemeral port actually bound.
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.state.config.bind_address)
            .await
            .map_err(|e| ServiceError::Internal(format!("Failed to bind: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| ServiceError::Internal(format!("Failed to read bound address: {e}")))?;

        self.announce_listening(addr);

        // Model warm-up runs alongside serving; /health reports readiness.
        let state = self.state.clone();
        tokio::spawn(async move {
            if state.warm_up().await {
                println!("{}", handshake::MODEL_READY);
                use std::io::Write;
                let _ = std::io::stdout().flush();
            }
        });

        let router = self.router();
        info!(%addr, "serving");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServiceError::Internal(format!("Server error: {e}")))?;

        info!("shut down");
        Ok(())
    }

    fn announce_listening(&self, addr: SocketAddr) {
        println!("{}", handshake::listening_line(&format!("http://{addr}")));
        use std::io::Write;
        let _ = std::io::stdout().flush();
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_before_warmup() {
        let service = Service::new(ServiceConfig::default()).unwrap();
        let app = service.router();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let health: mnemo_types::HealthResponse = serde_json::from_slice(&body).unwrap();

        assert!(!health.model_loaded);
        assert_eq!(health.status, mnemo_types::HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_search_before_warmup_is_model_not_ready() {
        let service = Service::new(ServiceConfig::default()).unwrap();
        let app = service.router();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/search")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"namespaces":["tools"],"query":"hi"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let err: mnemo_types::ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.code, "model_not_ready");
    }
}
