//! Diagnostic endpoint for the chat-completion provider

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;

use super::ApiState;

/// Prompt sent on every diagnostic call
const GREETING_PROMPT: &str = "Say hello from the Mafia game backend!";

/// Build the diagnostics router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/test-openai", get(test_openai))
        .with_state(state)
}

#[derive(Serialize)]
struct TestResponse {
    result: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Round-trip a fixed greeting through the chat provider
async fn test_openai(State(state): State<Arc<ApiState>>) -> Response {
    let Some(chat) = state.chat.as_ref() else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "OpenAI request failed".to_string(),
            }),
        )
            .into_response();
    };

    match chat.complete(GREETING_PROMPT).await {
        Ok(result) => Json(TestResponse { result }).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "diagnostic chat call failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
