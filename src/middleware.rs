use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::net::SocketAddr;
use tracing::info;

use crate::handlers::AppState;

/// Per-request rate limiting keyed by client IP.
///
/// Builds one `Limiter` per request from the configured window and limit;
/// a denied decision short-circuits with 429 and a `Retry-After` header.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let limiter = state.engine.limiter(
        state.config.limit_window(),
        state.config.max_requests,
        get_client_ip(&request),
    );

    if limiter.allow().await {
        return next.run(request).await;
    }

    info!(client_ip = %limiter.key(), "rate limit exceeded");

    let retry_after = state.config.window().as_secs().max(1);
    let body = Json(serde_json::json!({
        "error": "rate_limit_exceeded",
        "message": "Request rate limit exceeded",
        "name_server": state.config.server_name.clone(),
        "status": StatusCode::TOO_MANY_REQUESTS.as_u16(),
    }));

    let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
    response
        .headers_mut()
        .insert("Retry-After", retry_after.to_string().parse().unwrap());
    response
        .headers_mut()
        .insert("X-RateLimit-Limit", limiter.limit().to_string().parse().unwrap());
    response
}

fn get_client_ip(request: &Request) -> String {
    // Proxy headers take precedence over the connection address.
    if let Some(forwarded) = request.headers().get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(first_ip) = forwarded_str.split(',').next() {
                return first_ip.trim().to_string();
            }
        }
    }

    if let Some(real_ip) = request.headers().get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return ip_str.to_string();
        }
    }

    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}
