use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use parlor_gateway::api::{ApiServer, ApiState};
use parlor_gateway::provider::{OpenAiChat, OpenAiSpeech, OpenAiTranscriber};
use parlor_gateway::voice::{CaptureEvent, PlaybackManager, SpeechCapture};
use parlor_gateway::{
    AudioCapture, ChatProvider, Config, CpalOutput, GameSession, SessionEvent, SpeechProvider,
    Transcriber,
};

/// Parlor - voice table gateway for a single-player Mafia party game
#[derive(Parser)]
#[command(name = "parlor", version, about)]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "PARLOR_PORT", default_value = "8787")]
    port: u16,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS synthesis and playback
    TestTts {
        /// Text to speak
        #[arg(
            default_value = "Hello! This is a test of the text-to-speech system. The game is working correctly."
        )]
        text: String,
    },
    /// Run the local voice table: record, transcribe, print the transcript
    Table,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,parlor_gateway=info",
        1 => "info,parlor_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env(cli.port);

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker(),
            Command::TestTts { text } => test_tts(&config, &text).await,
            Command::Table => run_table(&config).await,
        };
    }

    serve(config).await
}

/// Serve the HTTP API
async fn serve(config: Config) -> anyhow::Result<()> {
    let state = Arc::new(build_state(&config));

    if state.speech.is_none() {
        tracing::warn!("OPENAI_API_KEY not set - /api/tts will fail until it is");
    }

    tracing::info!(port = config.port, "starting parlor gateway");

    let server = ApiServer::new(state, config.port);
    server.run().await?;

    Ok(())
}

/// Build API state from configuration
fn build_state(config: &Config) -> ApiState {
    let speech = config.openai_api_key.as_ref().and_then(|key| {
        OpenAiSpeech::new(
            key.clone(),
            config.voice.tts_model.clone(),
            config.voice.tts_speed,
        )
        .ok()
        .map(|provider| Arc::new(provider) as Arc<dyn SpeechProvider>)
    });

    let chat = config.openai_api_key.as_ref().and_then(|key| {
        OpenAiChat::new(key.clone(), config.voice.chat_model.clone())
            .ok()
            .map(|provider| Arc::new(provider) as Arc<dyn ChatProvider>)
    });

    ApiState {
        stt_available: config.openai_api_key.is_some(),
        default_voice: config.voice.tts_voice,
        speech,
        chat,
    }
}

/// Test microphone input
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    println!("Sample rate: {} Hz", capture.sample_rate());
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_buffer();
        let energy = calculate_rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working.");
    Ok(())
}

/// Calculate RMS energy
#[allow(clippy::cast_precision_loss)]
fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Test speaker output with a sine wave
fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let output = CpalOutput::new()?;

    // 2 seconds of 440Hz sine at the 24kHz playback rate, 30% volume
    let sample_rate = 24000u32;
    let frequency = 440.0f32;
    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..sample_rate * 2)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3
        })
        .collect();

    println!("Playing {} samples at {sample_rate} Hz...", samples.len());

    let cancel = std::sync::atomic::AtomicBool::new(false);
    output.play_samples(samples, &cancel)?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working.");
    Ok(())
}

/// Test TTS synthesis and playback
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let key = config
        .openai_api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY not set"))?;

    let speech = Arc::new(OpenAiSpeech::new(
        key,
        config.voice.tts_model.clone(),
        config.voice.tts_speed,
    )?);
    let output = Arc::new(CpalOutput::new()?);
    let manager = PlaybackManager::new(speech, output);

    let (tx, rx) = tokio::sync::oneshot::channel();

    println!("Synthesizing speech...");
    let id = manager
        .play(
            text,
            config.voice.tts_voice,
            Box::new(move |outcome| {
                let _ = tx.send(outcome);
            }),
        )
        .await;

    if id.is_none() {
        anyhow::bail!("TTS request failed");
    }

    println!("Playing audio...");
    let outcome = rx.await?;
    println!("Playback finished: {outcome:?}");

    println!("\n---");
    println!("If you heard the speech, TTS is working.");
    Ok(())
}

/// Run the local voice table
async fn run_table(config: &Config) -> anyhow::Result<()> {
    let mut session = GameSession::new();

    for entry in session.transcript() {
        println!("[{}] {}: {}", entry.timestamp, entry.speaker, entry.message);
    }

    let transcriber = config.openai_api_key.as_ref().and_then(|key| {
        OpenAiTranscriber::new(key.clone(), config.voice.stt_model.clone())
            .ok()
            .map(|t| Arc::new(t) as Arc<dyn Transcriber>)
    });

    let manager = match &config.openai_api_key {
        Some(key) => {
            let speech = Arc::new(OpenAiSpeech::new(
                key.clone(),
                config.voice.tts_model.clone(),
                config.voice.tts_speed,
            )?);
            let output = Arc::new(CpalOutput::new()?);
            Some(PlaybackManager::new(speech, output))
        }
        None => None,
    };

    // Game Master opener, spoken when TTS is configured
    if let Some(manager) = &manager {
        let (tx, rx) = tokio::sync::oneshot::channel();
        session.apply(SessionEvent::PlaybackStarted {
            speaker_id: Some("gm".to_string()),
        });

        let started = manager
            .play(
                "Welcome to the game. Let's begin.",
                config.voice.tts_voice,
                Box::new(move |outcome| {
                    let _ = tx.send(outcome);
                }),
            )
            .await;

        if started.is_some() {
            let _ = rx.await;
        }
        session.apply(SessionEvent::PlaybackFinished);
    }

    let (events_tx, mut events_rx) = tokio::sync::mpsc::channel(16);
    let mut capture = SpeechCapture::new(transcriber, events_tx)?;

    if let Err(e) = capture.start().await {
        session.apply(SessionEvent::CaptureFailed {
            message: "Failed to access microphone. Please check permissions.".to_string(),
        });
        anyhow::bail!("microphone unavailable: {e}");
    }
    session.apply(SessionEvent::RecordingStarted);

    println!("\nRecording. Speak, then pause; Ctrl-C to stop.\n");

    let mut poll = tokio::time::interval(Duration::from_millis(100));
    loop {
        tokio::select! {
            _ = poll.tick() => capture.poll().await,
            Some(event) = events_rx.recv() => match event {
                CaptureEvent::SegmentFinalized { text, elapsed } => {
                    session.apply(SessionEvent::SegmentFinalized { text, elapsed });
                    if let Some(entry) = session.transcript().last() {
                        println!("[{}] {}: {}", entry.timestamp, entry.speaker, entry.message);
                    }
                }
                CaptureEvent::TranscriptionUnavailable { reason }
                | CaptureEvent::TranscriptionFailed { message: reason } => {
                    session.apply(SessionEvent::TranscriptionError { message: reason.clone() });
                    println!("! {reason}");
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let clip = capture.stop();
    session.apply(SessionEvent::RecordingStopped);
    if let Some(manager) = &manager {
        manager.stop_all();
    }

    if let Some(clip) = clip {
        println!(
            "\nCaptured {} bytes of WAV audio over {:.1}s",
            clip.wav.len(),
            clip.duration.as_secs_f64()
        );
    }

    Ok(())
}
