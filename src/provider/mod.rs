//! Hosted provider clients
//!
//! Speech synthesis, segment transcription, and chat completion are each a
//! single HTTP call to the hosted provider, behind a trait so the playback
//! and capture layers can be exercised without network access.

mod openai;

pub use openai::{OpenAiChat, OpenAiSpeech, OpenAiTranscriber};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Maximum accepted TTS input length, in characters
pub const MAX_TTS_INPUT_CHARS: usize = 4096;

/// TTS voice selection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    Alloy,
    Echo,
    Fable,
    Onyx,
    #[default]
    Nova,
    Shimmer,
}

impl Voice {
    /// All supported voices
    pub const ALL: [Self; 6] = [
        Self::Alloy,
        Self::Echo,
        Self::Fable,
        Self::Onyx,
        Self::Nova,
        Self::Shimmer,
    ];

    /// Wire name of the voice
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alloy => "alloy",
            Self::Echo => "echo",
            Self::Fable => "fable",
            Self::Onyx => "onyx",
            Self::Nova => "nova",
            Self::Shimmer => "shimmer",
        }
    }
}

impl std::fmt::Display for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Voice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|voice| voice.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("unsupported voice: {s}")))
    }
}

/// Synthesizes speech from text
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize text to MP3 audio bytes
    ///
    /// # Errors
    ///
    /// Returns error if the provider call fails
    async fn synthesize(&self, text: &str, voice: Voice) -> Result<Vec<u8>>;
}

/// Produces chat completions
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Complete a single-turn prompt
    ///
    /// # Errors
    ///
    /// Returns error if the provider call fails
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Transcribes recorded speech to text
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe WAV audio to text
    ///
    /// # Errors
    ///
    /// Returns error if the provider call fails
    async fn transcribe(&self, wav: &[u8]) -> Result<String>;
}
