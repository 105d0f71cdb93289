//! Speech capture adapter
//!
//! Runs two capture mechanisms in parallel while recording: finalized
//! utterance segments transcribed through the STT provider, and a raw clip
//! of the whole take assembled on stop. When no transcriber is configured
//! the adapter falls back to audio-only capture and reports transcription
//! as unavailable.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::Result;
use crate::provider::Transcriber;
use crate::voice::{AudioCapture, CAPTURE_SAMPLE_RATE, UtteranceSegmenter, samples_to_wav};

/// Capture strategy, chosen once at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Segment transcription plus raw clip capture
    Transcribing,
    /// Raw clip capture only; transcription unavailable
    AudioOnly,
}

/// Events emitted while recording
#[derive(Debug)]
pub enum CaptureEvent {
    /// A finalized utterance segment was transcribed
    SegmentFinalized {
        text: String,
        /// Time since the recording started
        elapsed: Duration,
    },
    /// Transcription is unavailable in this environment
    TranscriptionUnavailable { reason: String },
    /// A finalized segment could not be transcribed
    TranscriptionFailed { message: String },
}

/// The raw audio captured across one recording, assembled on stop
#[derive(Debug)]
pub struct RecordedClip {
    /// WAV-encoded audio
    pub wav: Vec<u8>,
    /// Total recorded duration
    pub duration: Duration,
}

/// Captures microphone audio and emits finalized transcript segments
pub struct SpeechCapture {
    audio: AudioCapture,
    transcriber: Option<Arc<dyn Transcriber>>,
    segmenter: UtteranceSegmenter,
    events: mpsc::Sender<CaptureEvent>,
    started_at: Option<Instant>,
    clip: Vec<f32>,
}

impl SpeechCapture {
    /// Create a capture adapter
    ///
    /// The capture strategy is fixed here: passing `None` selects the
    /// audio-only fallback, reported on start.
    ///
    /// # Errors
    ///
    /// Returns error if the input device cannot be opened
    pub fn new(
        transcriber: Option<Arc<dyn Transcriber>>,
        events: mpsc::Sender<CaptureEvent>,
    ) -> Result<Self> {
        Ok(Self {
            audio: AudioCapture::new()?,
            transcriber,
            segmenter: UtteranceSegmenter::new(),
            events,
            started_at: None,
            clip: Vec::new(),
        })
    }

    /// The strategy this adapter was built with
    #[must_use]
    pub const fn mode(&self) -> CaptureMode {
        if self.transcriber.is_some() {
            CaptureMode::Transcribing
        } else {
            CaptureMode::AudioOnly
        }
    }

    /// Whether a recording is in progress
    #[must_use]
    pub const fn is_recording(&self) -> bool {
        self.started_at.is_some()
    }

    /// Start recording; redundant calls are ignored
    ///
    /// # Errors
    ///
    /// Returns error if the microphone cannot be started
    pub async fn start(&mut self) -> Result<()> {
        if self.started_at.is_some() {
            return Ok(());
        }

        self.audio.start()?;
        self.clip.clear();
        self.segmenter.reset();
        self.started_at = Some(Instant::now());

        if self.transcriber.is_none() {
            let _ = self
                .events
                .send(CaptureEvent::TranscriptionUnavailable {
                    reason: "Speech recognition not available. Audio is being recorded but not transcribed.".to_string(),
                })
                .await;
        }

        tracing::debug!(mode = ?self.mode(), "recording started");
        Ok(())
    }

    /// Drain newly captured samples, transcribing any finalized segment
    ///
    /// Call on a short interval while recording; does nothing when stopped.
    pub async fn poll(&mut self) {
        if self.started_at.is_none() {
            return;
        }

        let chunk = self.audio.take_buffer();
        if chunk.is_empty() {
            return;
        }

        self.clip.extend_from_slice(&chunk);

        if self.segmenter.process(&chunk) {
            let segment = self.segmenter.take_segment();
            self.transcribe_segment(&segment).await;
        }
    }

    async fn transcribe_segment(&mut self, segment: &[f32]) {
        let (Some(transcriber), Some(started_at)) = (self.transcriber.as_ref(), self.started_at)
        else {
            return;
        };

        let wav = match samples_to_wav(segment, CAPTURE_SAMPLE_RATE) {
            Ok(wav) => wav,
            Err(e) => {
                tracing::error!(error = %e, "segment encoding failed");
                return;
            }
        };

        let elapsed = started_at.elapsed();
        match transcriber.transcribe(&wav).await {
            Ok(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    let _ = self
                        .events
                        .send(CaptureEvent::SegmentFinalized {
                            text: text.to_string(),
                            elapsed,
                        })
                        .await;
                }
            }
            Err(e) => {
                let _ = self
                    .events
                    .send(CaptureEvent::TranscriptionFailed {
                        message: e.to_string(),
                    })
                    .await;
            }
        }
    }

    /// Stop recording and assemble the raw clip; redundant calls are ignored
    ///
    /// Returns `None` when not recording or when clip assembly fails.
    pub fn stop(&mut self) -> Option<RecordedClip> {
        let started_at = self.started_at.take()?;

        self.audio.stop();

        // Fold in anything captured since the last poll
        let tail = self.audio.take_buffer();
        self.clip.extend_from_slice(&tail);
        self.segmenter.reset();

        let samples = std::mem::take(&mut self.clip);
        let duration = started_at.elapsed();

        match samples_to_wav(&samples, CAPTURE_SAMPLE_RATE) {
            Ok(wav) => {
                tracing::debug!(bytes = wav.len(), ?duration, "recording stopped, clip assembled");
                Some(RecordedClip { wav, duration })
            }
            Err(e) => {
                tracing::error!(error = %e, "clip assembly failed");
                None
            }
        }
    }
}
