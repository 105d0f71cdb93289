//! Text-to-speech proxy endpoint
//!
//! Validates the request, forwards it to the speech provider, and streams
//! the MP3 payload back. Every call is a fresh provider round trip: no
//! retry, no rate limiting, no caching, no state between calls.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Serialize;
use serde_json::Value;

use super::ApiState;
use crate::provider::{MAX_TTS_INPUT_CHARS, Voice};

/// Build the TTS router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/tts", post(synthesize))
        .with_state(state)
}

/// Synthesize text to speech
///
/// Returns raw MP3 bytes with an explicit `Content-Length`.
async fn synthesize(
    State(state): State<Arc<ApiState>>,
    Json(body): Json<Value>,
) -> Result<Response, TtsError> {
    let text = body
        .get("text")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .ok_or(TtsError::TextRequired)?;

    if text.chars().count() > MAX_TTS_INPUT_CHARS {
        return Err(TtsError::TextTooLong);
    }

    let voice = match body.get("voice").filter(|value| !value.is_null()) {
        None => state.default_voice,
        Some(value) => {
            let name = value
                .as_str()
                .ok_or_else(|| TtsError::UnsupportedVoice(value.to_string()))?;
            Voice::from_str(name).map_err(|_| TtsError::UnsupportedVoice(name.to_string()))?
        }
    };

    let speech = state.speech.as_ref().ok_or(TtsError::NotConfigured)?;

    let audio = speech
        .synthesize(text, voice)
        .await
        .map_err(|e| TtsError::SynthesisFailed(e.to_string()))?;

    tracing::debug!(chars = text.chars().count(), %voice, bytes = audio.len(), "speech synthesized");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "audio/mpeg".to_string()),
            (header::CONTENT_LENGTH, audio.len().to_string()),
        ],
        audio,
    )
        .into_response())
}

/// TTS endpoint errors, rendered as a flat `{error}` body
#[derive(Debug)]
enum TtsError {
    TextRequired,
    TextTooLong,
    UnsupportedVoice(String),
    NotConfigured,
    SynthesisFailed(String),
}

impl IntoResponse for TtsError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
        }

        let (status, error) = match self {
            Self::TextRequired => (
                StatusCode::BAD_REQUEST,
                "Text is required and must be a string".to_string(),
            ),
            Self::TextTooLong => (
                StatusCode::BAD_REQUEST,
                "Text must be 4096 characters or less".to_string(),
            ),
            Self::UnsupportedVoice(name) => (
                StatusCode::BAD_REQUEST,
                format!("Voice must be one of alloy, echo, fable, onyx, nova, shimmer; got {name}"),
            ),
            Self::NotConfigured => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "OpenAI API key not configured".to_string(),
            ),
            Self::SynthesisFailed(message) if !message.is_empty() => {
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
            Self::SynthesisFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate speech".to_string(),
            ),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
