//! Voice processing module
//!
//! Microphone capture, utterance segmentation, and TTS playback.
//! Synthesis and transcription go through the providers in [`crate::provider`].

mod adapter;
mod capture;
mod output;
mod playback;
mod segmenter;

pub use adapter::{CaptureEvent, CaptureMode, RecordedClip, SpeechCapture};
pub use capture::{AudioCapture, CAPTURE_SAMPLE_RATE, samples_to_wav};
pub use output::{AudioOutput, CpalOutput};
pub use playback::{CompletionCallback, PlaybackId, PlaybackManager, PlaybackOutcome};
pub use segmenter::{SegmenterState, UtteranceSegmenter};
