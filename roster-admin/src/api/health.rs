//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    /// Table store in use (`sqlite`, `rest`)
    pub backend: &'static str,
    pub saving: bool,
}

/// GET /health
///
/// Does NOT require authentication and never touches the store.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        module: "roster-admin",
        version: env!("CARGO_PKG_VERSION"),
        backend: state.engine.backend(),
        saving: state.engine.is_saving(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
