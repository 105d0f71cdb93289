//! Shared test doubles

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use parlor_gateway::api::{ApiServer, ApiState};
use parlor_gateway::provider::{ChatProvider, SpeechProvider, Voice};
use parlor_gateway::voice::AudioOutput;
use parlor_gateway::{Error, Result};

/// Speech provider returning a canned clip, recording each call
pub struct FakeSpeech {
    fail: bool,
    calls: Mutex<Vec<(String, Voice)>>,
}

impl FakeSpeech {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Calls recorded so far, in order
    pub fn calls(&self) -> Vec<(String, Voice)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechProvider for FakeSpeech {
    async fn synthesize(&self, text: &str, voice: Voice) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push((text.to_string(), voice));
        if self.fail {
            return Err(Error::Upstream("synthesis exploded".to_string()));
        }
        Ok(b"ID3 fake mp3 payload".to_vec())
    }
}

/// Chat provider returning a fixed greeting
pub struct FakeChat {
    fail: bool,
}

impl FakeChat {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self { fail: false })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { fail: true })
    }
}

#[async_trait]
impl ChatProvider for FakeChat {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        if self.fail {
            return Err(Error::Upstream("chat exploded".to_string()));
        }
        Ok("Hello from the Mafia game backend!".to_string())
    }
}

/// How the fake output behaves for each play call
pub enum OutputBehavior {
    /// Pretend to play for this long, polling the cancel flag
    Play(Duration),
    /// Fail decoding
    DecodeError,
    /// Fail mid-stream
    StreamError,
}

/// Output double standing in for the speaker device
pub struct FakeOutput {
    behavior: OutputBehavior,
    completed: AtomicUsize,
}

impl FakeOutput {
    pub fn playing_for(clip: Duration) -> Arc<Self> {
        Arc::new(Self {
            behavior: OutputBehavior::Play(clip),
            completed: AtomicUsize::new(0),
        })
    }

    pub fn with(behavior: OutputBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            completed: AtomicUsize::new(0),
        })
    }

    /// Number of clips played to their natural end
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }
}

impl AudioOutput for FakeOutput {
    fn play(&self, _mp3: &[u8], cancel: &AtomicBool) -> Result<()> {
        match self.behavior {
            OutputBehavior::Play(clip) => {
                let start = std::time::Instant::now();
                while start.elapsed() < clip {
                    if cancel.load(Ordering::Relaxed) {
                        return Ok(());
                    }
                    std::thread::sleep(Duration::from_millis(5));
                }
                self.completed.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            OutputBehavior::DecodeError => Err(Error::Decode("not an mp3".to_string())),
            OutputBehavior::StreamError => Err(Error::Audio("stream died".to_string())),
        }
    }
}

/// Build a router over fake providers
pub fn test_router(
    speech: Option<Arc<dyn SpeechProvider>>,
    chat: Option<Arc<dyn ChatProvider>>,
) -> axum::Router {
    let state = Arc::new(ApiState {
        stt_available: speech.is_some(),
        default_voice: Voice::Nova,
        speech,
        chat,
    });
    ApiServer::router(state)
}
