//! Audio output to speakers
//!
//! [`AudioOutput`] is the seam between the playback lifecycle and the audio
//! hardware: one call decodes and plays one MP3 clip to completion,
//! honoring a cancel flag. [`CpalOutput`] is the device-backed
//! implementation.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use crate::{Error, Result};

/// Sample rate for playback (matches common TTS output)
const PLAYBACK_SAMPLE_RATE: u32 = 24000;

/// Plays one MP3 clip to the speakers
pub trait AudioOutput: Send + Sync {
    /// Decode and play `mp3` until it ends or `cancel` is set
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the payload cannot be decoded and
    /// [`Error::Audio`] if the output device or stream fails
    fn play(&self, mp3: &[u8], cancel: &AtomicBool) -> Result<()>;
}

/// Default output device via cpal
pub struct CpalOutput {
    config: StreamConfig,
}

impl CpalOutput {
    /// Open the default output device
    ///
    /// # Errors
    ///
    /// Returns error if no output device or suitable configuration exists
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host.default_output_device().ok_or_else(|| {
            Error::CapabilityUnavailable("no audio output device available".to_string())
        })?;

        let supported_config = device
            .supported_output_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
            })
            .or_else(|| {
                // Fallback: try stereo
                device.supported_output_configs().ok()?.find(|c| {
                    c.channels() == 2
                        && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                        && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
                })
            })
            .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(PLAYBACK_SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = PLAYBACK_SAMPLE_RATE,
            channels = config.channels,
            "audio output initialized"
        );

        Ok(Self { config })
    }

    /// Play raw f32 samples until they end or `cancel` is set
    ///
    /// # Errors
    ///
    /// Returns [`Error::Audio`] if the output device or stream fails
    pub fn play_samples(&self, samples: Vec<f32>, cancel: &AtomicBool) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device".to_string()))?;

        let config = self.config.clone();
        let channels = config.channels as usize;

        let sample_count = samples.len();
        let samples = Arc::new(Mutex::new(samples));
        let position = Arc::new(Mutex::new(0usize));
        let finished = Arc::new(AtomicBool::new(false));
        let errored = Arc::new(AtomicBool::new(false));

        let samples_cb = Arc::clone(&samples);
        let position_cb = Arc::clone(&position);
        let finished_cb = Arc::clone(&finished);
        let errored_cb = Arc::clone(&errored);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let samples = samples_cb.lock().unwrap();
                    let mut pos = position_cb.lock().unwrap();

                    for frame in data.chunks_mut(channels) {
                        let sample = if *pos < samples.len() {
                            samples[*pos]
                        } else {
                            finished_cb.store(true, Ordering::Relaxed);
                            0.0
                        };

                        for out in frame.iter_mut() {
                            *out = sample;
                        }

                        if *pos < samples.len() {
                            *pos += 1;
                        }
                    }
                },
                move |err| {
                    tracing::error!(error = %err, "audio playback error");
                    errored_cb.store(true, Ordering::Relaxed);
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        let duration_ms = (sample_count as u64 * 1000) / u64::from(PLAYBACK_SAMPLE_RATE);

        // Poll for completion, cancellation, or error, with a timeout guard
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(duration_ms + 500);

        while !finished.load(Ordering::Relaxed)
            && !cancel.load(Ordering::Relaxed)
            && !errored.load(Ordering::Relaxed)
        {
            if start.elapsed() > timeout {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
        }

        if finished.load(Ordering::Relaxed) {
            // Let the tail of the buffer drain
            std::thread::sleep(std::time::Duration::from_millis(100));
        }

        drop(stream);

        if errored.load(Ordering::Relaxed) {
            return Err(Error::Audio("output stream failed".to_string()));
        }

        tracing::debug!(samples = sample_count, "playback complete");
        Ok(())
    }
}

impl AudioOutput for CpalOutput {
    fn play(&self, mp3: &[u8], cancel: &AtomicBool) -> Result<()> {
        let samples = decode_mp3(mp3)?;
        self.play_samples(samples, cancel)
    }
}

/// Decode MP3 bytes to mono f32 samples
fn decode_mp3(mp3: &[u8]) -> Result<Vec<f32>> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3));
    let mut samples = Vec::new();

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if frame.channels == 2 {
                    // Stereo: average channels
                    samples.extend(frame.data.chunks(2).map(|chunk| {
                        let left = f32::from(chunk[0]) / 32768.0;
                        let right = f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                        f32::midpoint(left, right)
                    }));
                } else {
                    samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Decode(format!("MP3 decode error: {e}"))),
        }
    }

    if samples.is_empty() {
        return Err(Error::Decode("no audio frames in payload".to_string()));
    }

    Ok(samples)
}
