//! Parlor Gateway - voice table for a single-player Mafia party game
//!
//! This library provides the pieces behind the game's voice table:
//! - A stateless HTTP proxy to the hosted TTS and chat APIs
//! - TTS playback with overlapping utterances and guaranteed cleanup
//! - Microphone capture with finalized-segment transcription
//! - The append-only transcript and derived session flags
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 Parlor Gateway                   │
//! │   HTTP API  │  Capture  │  Playback  │  Session  │
//! └────────────────────────┬─────────────────────────┘
//!                          │
//! ┌────────────────────────▼─────────────────────────┐
//! │              Hosted provider (OpenAI)            │
//! │        TTS  │  Whisper STT  │  Chat              │
//! └──────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod provider;
pub mod session;
pub mod voice;

pub use config::{Config, VoiceConfig};
pub use error::{Error, Result};
pub use provider::{ChatProvider, MAX_TTS_INPUT_CHARS, SpeechProvider, Transcriber, Voice};
pub use session::{Agent, GameSession, Role, SessionEvent, TranscriptEntry};
pub use voice::{
    AudioCapture, AudioOutput, CpalOutput, PlaybackManager, PlaybackOutcome, SpeechCapture,
};
