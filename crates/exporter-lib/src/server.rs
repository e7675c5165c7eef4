//! HTTP scrape server
//!
//! Serves the gauge registry in the Prometheus text format on `/metrics`
//! along with liveness and readiness probes. Requests only read shared
//! state, so they never wait on a poll cycle.

use crate::health::{PollHealth, Status};
use crate::registry::MetricRegistry;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Default scrape port
pub const DEFAULT_LISTEN_PORT: u16 = 9761;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health: PollHealth,
    pub registry: MetricRegistry,
}

impl AppState {
    pub fn new(health: PollHealth, registry: MetricRegistry) -> Self {
        Self { health, registry }
    }
}

/// Health check response - returns 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health.health().await;

    let status_code = match health.status {
        Status::Healthy => StatusCode::OK,
        Status::Degraded => StatusCode::OK, // Still serving last known values
        Status::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.registry.render() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        ),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain; charset=utf-8")],
                format!("failed to encode metrics: {e}"),
            )
        }
    }
}

/// Create the scrape router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Bind the listener on all interfaces
pub async fn bind(port: u16) -> anyhow::Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Scrape listener bound");
    Ok(listener)
}

/// Serve on an already bound listener until the server fails
pub async fn serve_on(listener: TcpListener, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %listener.local_addr()?, "Starting scrape server");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Bind and serve on `port`
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let listener = bind(port).await?;
    serve_on(listener, state).await
}
