//! Health and capability endpoints

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use super::ApiState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Voice capabilities response
#[derive(Serialize)]
pub struct Capabilities {
    pub stt_available: bool,
    pub tts_available: bool,
}

/// Liveness probe - is the service running?
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Report which voice capabilities are configured
///
/// A client downgrades to audio-only capture when `stt_available` is false.
async fn capabilities(State(state): State<Arc<ApiState>>) -> Json<Capabilities> {
    Json(Capabilities {
        stt_available: state.stt_available,
        tts_available: state.speech.is_some(),
    })
}

/// Build the health router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/capabilities", get(capabilities))
        .with_state(state)
}
