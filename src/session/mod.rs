//! Game session state
//!
//! Owns the append-only transcript and the derived UI flags. All
//! transitions are driven by events from the capture adapter and the
//! playback manager; nothing here performs IO.

use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

/// One transcript line; appended once, never mutated or removed
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    pub id: String,
    pub speaker: String,
    pub message: String,
    /// Elapsed time since the recording started, formatted mm:ss
    pub timestamp: String,
    pub avatar_id: String,
}

/// Player role at the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    GameMaster,
    Mafia,
    Doctor,
    Investigator,
    Citizen,
}

impl Role {
    /// Display label for the avatar panel
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::GameMaster => "Game Master",
            Self::Mafia => "Mafia",
            Self::Doctor => "Doctor",
            Self::Investigator => "Investigator",
            Self::Citizen => "Citizen",
        }
    }
}

/// Static agent descriptor shown in the avatar panel
#[derive(Debug, Clone, Serialize)]
pub struct Agent {
    pub id: &'static str,
    pub name: &'static str,
    pub role: Role,
    pub is_active: bool,
}

/// The fixed seven-seat roster
#[must_use]
pub fn default_roster() -> Vec<Agent> {
    [
        ("gm", "Game Master", Role::GameMaster),
        ("agent1", "Agent 1", Role::Mafia),
        ("agent2", "Agent 2", Role::Doctor),
        ("agent3", "Agent 3", Role::Investigator),
        ("agent4", "Agent 4", Role::Citizen),
        ("agent5", "Agent 5", Role::Citizen),
        ("agent6", "Agent 6", Role::Citizen),
    ]
    .into_iter()
    .map(|(id, name, role)| Agent {
        id,
        name,
        role,
        is_active: false,
    })
    .collect()
}

/// Format an elapsed duration as mm:ss
#[must_use]
pub fn format_timestamp(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Events driving session state transitions
#[derive(Debug)]
pub enum SessionEvent {
    /// The microphone was toggled on
    RecordingStarted,
    /// The microphone was toggled off
    RecordingStopped,
    /// A finalized speech segment from the player
    SegmentFinalized { text: String, elapsed: Duration },
    /// Transcription degraded or failed; surfaced as a banner
    TranscriptionError { message: String },
    /// The microphone could not be started; recording state is reset
    CaptureFailed { message: String },
    /// An utterance began playing, optionally attributed to a roster agent
    PlaybackStarted { speaker_id: Option<String> },
    /// An utterance reached a terminal state
    PlaybackFinished,
}

/// Transcript and derived UI flags for one game session
#[derive(Debug)]
pub struct GameSession {
    transcript: Vec<TranscriptEntry>,
    roster: Vec<Agent>,
    is_recording: bool,
    playing: usize,
    active_speaker_id: Option<String>,
    transcription_error: Option<String>,
}

impl GameSession {
    /// Create a session seeded with the opening lines
    #[must_use]
    pub fn new() -> Self {
        let mut session = Self {
            transcript: Vec::new(),
            roster: default_roster(),
            is_recording: false,
            playing: 0,
            active_speaker_id: None,
            transcription_error: None,
        };

        session.append("Game Master", "Welcome to the game. Let's begin.", "00:00", "gm");
        session.append("Agent 1", "Hello everyone!", "00:05", "agent1");
        session
    }

    /// Apply one event
    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::RecordingStarted => {
                self.is_recording = true;
                self.transcription_error = None;
            }
            SessionEvent::RecordingStopped => {
                self.is_recording = false;
                self.transcription_error = None;
            }
            SessionEvent::SegmentFinalized { text, elapsed } => {
                let timestamp = format_timestamp(elapsed);
                self.append("You", &text, &timestamp, "player");
                self.transcription_error = None;
            }
            SessionEvent::TranscriptionError { message } => {
                self.transcription_error = Some(message);
            }
            SessionEvent::CaptureFailed { message } => {
                self.transcription_error = Some(message);
                self.is_recording = false;
            }
            SessionEvent::PlaybackStarted { speaker_id } => {
                self.playing += 1;
                if speaker_id.is_some() {
                    self.set_active_speaker(speaker_id);
                }
            }
            SessionEvent::PlaybackFinished => {
                self.playing = self.playing.saturating_sub(1);
                if self.playing == 0 {
                    self.set_active_speaker(None);
                }
            }
        }
    }

    fn set_active_speaker(&mut self, id: Option<String>) {
        for agent in &mut self.roster {
            agent.is_active = id.as_deref() == Some(agent.id);
        }
        self.active_speaker_id = id;
    }

    fn append(&mut self, speaker: &str, message: &str, timestamp: &str, avatar_id: &str) {
        self.transcript.push(TranscriptEntry {
            id: Uuid::new_v4().to_string(),
            speaker: speaker.to_string(),
            message: message.to_string(),
            timestamp: timestamp.to_string(),
            avatar_id: avatar_id.to_string(),
        });
    }

    /// The ordered transcript
    #[must_use]
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// The agent roster, with `is_active` tracking the current speaker
    #[must_use]
    pub fn roster(&self) -> &[Agent] {
        &self.roster
    }

    /// Whether the microphone is on
    #[must_use]
    pub const fn is_recording(&self) -> bool {
        self.is_recording
    }

    /// Whether any TTS utterance is currently in flight
    #[must_use]
    pub const fn is_playing_tts(&self) -> bool {
        self.playing > 0
    }

    /// The highlighted speaker, if any
    #[must_use]
    pub fn active_speaker_id(&self) -> Option<&str> {
        self.active_speaker_id.as_deref()
    }

    /// The visible transcription error banner, if any
    #[must_use]
    pub fn transcription_error(&self) -> Option<&str> {
        self.transcription_error.as_deref()
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}
