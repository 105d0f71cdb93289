//! Error types for the parlor gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the parlor gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Client-correctable request error
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Hosted provider call failed
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Audio device or stream error
    #[error("audio error: {0}")]
    Audio(String),

    /// Audio payload could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// A required capability is missing in this environment
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// Microphone access refused
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
