//! HTTP API server for the parlor gateway

pub mod diagnostics;
pub mod health;
pub mod tts;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::provider::{ChatProvider, SpeechProvider, Voice};

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Speech synthesis provider.
    /// Absent when no API key is configured.
    pub speech: Option<Arc<dyn SpeechProvider>>,

    /// Chat completion provider for the diagnostic route.
    /// Absent when no API key is configured.
    pub chat: Option<Arc<dyn ChatProvider>>,

    /// Whether finalized-segment transcription is available
    pub stt_available: bool,

    /// Voice used when a request does not select one
    pub default_voice: Voice,
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Create a new API server
    #[must_use]
    pub const fn new(state: Arc<ApiState>, port: u16) -> Self {
        Self { state, port }
    }

    /// Build the router with all routes
    #[must_use]
    pub fn router(state: Arc<ApiState>) -> Router {
        // CORS layer for cross-origin requests from the web UI
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .merge(tts::router(state.clone()))
            .merge(diagnostics::router(state.clone()))
            .merge(health::router(state))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, Self::router(self.state))
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
