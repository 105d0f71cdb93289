//! TTS playback lifecycle
//!
//! Turns text into audible speech with freely overlapping utterances. Each
//! request moves through request, load, and play, and ends in exactly one
//! terminal state; the active-set owns every live handle and is the sole
//! source of truth for what is currently audible.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::Error;
use crate::provider::{SpeechProvider, Voice};
use crate::voice::AudioOutput;

/// Identifier for one in-flight utterance
pub type PlaybackId = u64;

/// Invoked exactly once when an utterance reaches a terminal state
pub type CompletionCallback = Box<dyn FnOnce(PlaybackOutcome) + Send + 'static>;

/// Terminal state of one utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Natural end of playback
    Completed,
    /// The synthesis request was rejected; no handle was created
    RequestFailed,
    /// The audio payload could not be decoded
    LoadFailed,
    /// The output device or stream failed mid-play
    PlaybackFailed,
    /// Force-stopped by [`PlaybackManager::stop_all`]
    Stopped,
}

/// One registered sound in the active-set
///
/// The completion callback lives here as an `Option` so that only the path
/// that removes the handle from the set can take and invoke it.
struct ActiveSound {
    cancel: Arc<AtomicBool>,
    on_done: Option<CompletionCallback>,
}

type ActiveSet = HashMap<PlaybackId, ActiveSound>;

/// Fetches TTS audio and tracks every concurrently playing utterance
pub struct PlaybackManager {
    speech: Arc<dyn SpeechProvider>,
    output: Arc<dyn AudioOutput>,
    active: Arc<Mutex<ActiveSet>>,
    next_id: AtomicU64,
}

impl PlaybackManager {
    /// Create a new playback manager
    #[must_use]
    pub fn new(speech: Arc<dyn SpeechProvider>, output: Arc<dyn AudioOutput>) -> Self {
        Self {
            speech,
            output,
            active: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Synthesize `text` and start playing it
    ///
    /// Playback overlaps freely with other utterances; starting a new one
    /// never interrupts or waits on another. `on_done` fires exactly once
    /// whichever way the utterance terminates. Returns `None` when the
    /// synthesis request fails, in which case `on_done` has already been
    /// invoked with [`PlaybackOutcome::RequestFailed`].
    pub async fn play(
        &self,
        text: &str,
        voice: Voice,
        on_done: CompletionCallback,
    ) -> Option<PlaybackId> {
        let mp3 = match self.speech.synthesize(text, voice).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "TTS request failed");
                on_done(PlaybackOutcome::RequestFailed);
                return None;
            }
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = Arc::new(AtomicBool::new(false));

        lock_active(&self.active).insert(
            id,
            ActiveSound {
                cancel: Arc::clone(&cancel),
                on_done: Some(on_done),
            },
        );
        tracing::debug!(id, bytes = mp3.len(), "utterance loaded");

        let output = Arc::clone(&self.output);
        let active = Arc::clone(&self.active);

        tokio::task::spawn_blocking(move || {
            let outcome = match output.play(&mp3, &cancel) {
                Ok(()) => PlaybackOutcome::Completed,
                Err(Error::Decode(e)) => {
                    tracing::error!(id, error = %e, "audio load failed");
                    PlaybackOutcome::LoadFailed
                }
                Err(e) => {
                    tracing::error!(id, error = %e, "audio playback failed");
                    PlaybackOutcome::PlaybackFailed
                }
            };

            // If the handle is gone, stop_all already released this
            // utterance and fired its callback.
            let sound = lock_active(&active).remove(&id);
            if let Some(mut sound) = sound {
                if let Some(on_done) = sound.on_done.take() {
                    on_done(outcome);
                }
            }
        });

        Some(id)
    }

    /// Stop every playing utterance and release its handle
    ///
    /// Snapshot semantics: every handle present when the call starts is
    /// cancelled and gets its completion callback (with
    /// [`PlaybackOutcome::Stopped`]) before this returns. An utterance whose
    /// synthesis request completes mid-stop registers afterwards and is left
    /// playing; best effort, not a strict guarantee.
    pub fn stop_all(&self) {
        let drained: Vec<ActiveSound> = {
            let mut active = lock_active(&self.active);
            active.drain().map(|(_, sound)| sound).collect()
        };

        let count = drained.len();
        for mut sound in drained {
            sound.cancel.store(true, Ordering::Relaxed);
            if let Some(on_done) = sound.on_done.take() {
                on_done(PlaybackOutcome::Stopped);
            }
        }

        if count > 0 {
            tracing::debug!(count, "stopped all playback");
        }
    }

    /// Number of utterances currently in the active-set
    #[must_use]
    pub fn active_count(&self) -> usize {
        lock_active(&self.active).len()
    }

    /// Whether anything is currently audible
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.active_count() > 0
    }
}

/// Lock the active-set, recovering from a poisoned lock
///
/// A playback thread that panicked has already lost its utterance; the set
/// itself stays usable.
fn lock_active(active: &Mutex<ActiveSet>) -> MutexGuard<'_, ActiveSet> {
    active.lock().unwrap_or_else(PoisonError::into_inner)
}
