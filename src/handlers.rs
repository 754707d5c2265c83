use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::config::Config;
use crate::limiter::RateLimiter;

/// Shared application state: the decision engine plus the loaded config.
#[derive(Clone)]
pub struct AppState {
    pub engine: RateLimiter,
    pub config: Arc<Config>,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub name_server: String,
    pub status: u16,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub redis_connected: bool,
}

/// Rate-limited demo endpoint echoing the configured server name.
pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(RootResponse {
        name_server: state.config.server_name.clone(),
        status: StatusCode::OK.as_u16(),
    })
}

/// Health check endpoint. Reports degraded rather than failing when Redis is
/// unreachable; with a fail-closed limiter the process still serves denials.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let redis_connected = state.engine.ping().await.is_ok();

    let status = if redis_connected { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        redis_connected,
    })
}
