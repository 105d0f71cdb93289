//! Configuration for the parlor gateway

use crate::provider::Voice;

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// `OpenAI` API key, the only secret this gateway reads
    pub openai_api_key: Option<String>,

    /// HTTP API port
    pub port: u16,

    /// Voice processing configuration
    pub voice: VoiceConfig,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// TTS model tier (e.g. "tts-1")
    pub tts_model: String,

    /// Voice used when a request does not select one
    pub tts_voice: Voice,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f64,

    /// STT model for segment transcription (e.g. "whisper-1")
    pub stt_model: String,

    /// Chat model for the diagnostic route (e.g. "gpt-4o-mini")
    pub chat_model: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            tts_model: "tts-1".to_string(),
            tts_voice: Voice::Nova,
            tts_speed: 1.0,
            stt_model: "whisper-1".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    #[must_use]
    pub fn from_env(port: u16) -> Self {
        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        Self {
            openai_api_key,
            port,
            voice: VoiceConfig::default(),
        }
    }
}
