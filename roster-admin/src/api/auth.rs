//! Admin token middleware
//!
//! Requests must present the configured token as `Authorization: Bearer
//! <token>` or `X-Admin-Token: <token>`. No configured token disables the
//! check entirely.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use crate::AppState;

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

fn presented_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(value) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(token) = value.strip_prefix("Bearer ") {
            return Some(token.trim());
        }
    }
    headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
}

/// Constant-time comparison so the token cannot be probed byte by byte
fn tokens_match(expected: &str, presented: &str) -> bool {
    let (a, b) = (expected.as_bytes(), presented.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.admin_token.as_deref() else {
        return next.run(request).await;
    };

    let rejection = match presented_token(request.headers()) {
        Some(token) if tokens_match(expected, token) => None,
        Some(_) => Some("Invalid admin token"),
        None => Some("Missing admin token"),
    };

    match rejection {
        None => next.run(request).await,
        Some(message) => {
            warn!("Rejected admin request to {}: {}", request.uri().path(), message);
            unauthorized(message)
        }
    }
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
}
