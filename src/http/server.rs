//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the health handler
//! - Wire up middleware (tracing, timeout)
//! - Serve until the shutdown broadcast fires, then report the listener closed

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::health::HealthReport;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub health: HealthReport,
}

/// HTTP listening interface of the service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &ServiceConfig, health: HealthReport) -> Self {
        let state = AppState { health };
        let router = Self::build_router(config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown` fires. `closed` flips to `true` once
    /// the listener has stopped and in-flight requests have drained.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
        closed: watch::Sender<bool>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let result = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server no longer accepting connections");
            })
            .await;

        closed.send_replace(true);
        tracing::info!("HTTP server stopped");
        result
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.health.current();
    let status = if snapshot.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(snapshot.as_ref().clone()))
}
