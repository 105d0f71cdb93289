//! Energy-based utterance segmentation
//!
//! Stands in for a streaming recognizer: accumulates audio while the
//! microphone is hot and finalizes a segment once it has heard enough
//! speech followed by trailing silence.

/// Minimum RMS energy to classify a chunk as speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum speech content for a finalized segment (0.3s at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800;

/// Trailing silence that finalizes a segment (0.5s at 16kHz)
const SILENCE_SAMPLES: usize = 8000;

/// Segmenter state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SegmenterState {
    /// Waiting for speech
    #[default]
    Idle,
    /// Accumulating a candidate segment
    Listening,
}

/// Splits a continuous sample stream into finalized utterance segments
#[derive(Default)]
pub struct UtteranceSegmenter {
    state: SegmenterState,
    buffer: Vec<f32>,
    speech_run: usize,
    silence_run: usize,
}

impl UtteranceSegmenter {
    /// Create a new segmenter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed captured samples
    ///
    /// Returns true when a segment is finalized; retrieve it with
    /// [`Self::take_segment`].
    pub fn process(&mut self, samples: &[f32]) -> bool {
        let is_speech = rms_energy(samples) > ENERGY_THRESHOLD;

        match self.state {
            SegmenterState::Idle => {
                if is_speech {
                    self.state = SegmenterState::Listening;
                    self.buffer.clear();
                    self.buffer.extend_from_slice(samples);
                    self.speech_run = samples.len();
                    self.silence_run = 0;
                    tracing::trace!("speech onset");
                }
            }
            SegmenterState::Listening => {
                self.buffer.extend_from_slice(samples);

                if is_speech {
                    self.speech_run += samples.len();
                    self.silence_run = 0;
                } else {
                    self.silence_run += samples.len();
                }

                if self.silence_run > SILENCE_SAMPLES && self.speech_run > MIN_SPEECH_SAMPLES {
                    tracing::debug!(
                        samples = self.buffer.len(),
                        speech = self.speech_run,
                        "segment finalized"
                    );
                    return true;
                }

                // Noise blip with no real speech behind it
                if self.silence_run > SILENCE_SAMPLES * 2 {
                    tracing::trace!("segment timed out, resetting");
                    self.reset();
                }
            }
        }

        false
    }

    /// Take the finalized segment, returning the segmenter to idle
    pub fn take_segment(&mut self) -> Vec<f32> {
        self.state = SegmenterState::Idle;
        self.speech_run = 0;
        self.silence_run = 0;
        std::mem::take(&mut self.buffer)
    }

    /// Samples accumulated toward the current segment
    #[must_use]
    pub fn buffered(&self) -> &[f32] {
        &self.buffer
    }

    /// Reset to idle, dropping any partial segment
    pub fn reset(&mut self) {
        self.state = SegmenterState::Idle;
        self.buffer.clear();
        self.speech_run = 0;
        self.silence_run = 0;
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> SegmenterState {
        self.state
    }
}

/// RMS energy of a sample chunk
#[allow(clippy::cast_precision_loss)]
fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_of_silence_is_near_zero() {
        let silence = vec![0.0f32; 100];
        assert!(rms_energy(&silence) < 0.001);

        let loud = vec![0.5f32; 100];
        assert!(rms_energy(&loud) > 0.4);
    }

    #[test]
    fn empty_chunk_has_no_energy() {
        assert!(rms_energy(&[]) < f32::EPSILON);
    }
}
