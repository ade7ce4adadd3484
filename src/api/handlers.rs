//! First-party API handlers.

use axum::{Json, extract::State};
use serde::Serialize;

use super::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Liveness endpoint for deploy probes.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Runtime configuration for the frontend.
///
/// The UI fetches this at boot to learn mount points and display options.
/// The value in state is already sanitized; see `AppState::with_frontend_config`.
pub async fn frontend_config(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(state.frontend_config.as_ref().clone())
}
