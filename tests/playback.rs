//! Playback lifecycle integration tests
//!
//! Exercises the per-utterance state machine against fake providers and a
//! fake output device; no network or audio hardware required.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use parlor_gateway::Voice;
use parlor_gateway::voice::{CompletionCallback, PlaybackManager, PlaybackOutcome};

mod common;
use common::{FakeOutput, FakeSpeech, OutputBehavior};

type Outcomes = Arc<Mutex<Vec<PlaybackOutcome>>>;

fn recorder(outcomes: &Outcomes) -> CompletionCallback {
    let outcomes = Arc::clone(outcomes);
    Box::new(move |outcome| outcomes.lock().unwrap().push(outcome))
}

async fn wait_for(condition: impl Fn() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_request_fires_exactly_one_callback() {
    let output = FakeOutput::playing_for(Duration::from_millis(30));
    let manager = PlaybackManager::new(FakeSpeech::ok(), output.clone());
    let outcomes = Outcomes::default();

    for i in 0..5 {
        let id = manager
            .play(&format!("line {i}"), Voice::Nova, recorder(&outcomes))
            .await;
        assert!(id.is_some());
    }

    wait_for(|| outcomes.lock().unwrap().len() == 5).await;

    assert!(
        outcomes
            .lock()
            .unwrap()
            .iter()
            .all(|outcome| *outcome == PlaybackOutcome::Completed)
    );
    assert_eq!(manager.active_count(), 0);
    assert_eq!(output.completed(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn utterances_overlap_without_interfering() {
    let output = FakeOutput::playing_for(Duration::from_millis(300));
    let manager = PlaybackManager::new(FakeSpeech::ok(), output.clone());
    let outcomes = Outcomes::default();

    let first = manager.play("first", Voice::Nova, recorder(&outcomes)).await;
    let second = manager
        .play("second", Voice::Shimmer, recorder(&outcomes))
        .await;

    assert!(first.is_some());
    assert!(second.is_some());
    assert_ne!(first, second);

    // Both are in the active-set at once; neither blocked the other
    assert_eq!(manager.active_count(), 2);
    assert!(manager.is_playing());

    wait_for(|| outcomes.lock().unwrap().len() == 2).await;

    assert!(
        outcomes
            .lock()
            .unwrap()
            .iter()
            .all(|outcome| *outcome == PlaybackOutcome::Completed)
    );
    assert_eq!(manager.active_count(), 0);
    assert!(!manager.is_playing());
    assert_eq!(output.completed(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stop_all_drains_the_active_set_before_returning() {
    let output = FakeOutput::playing_for(Duration::from_secs(10));
    let manager = PlaybackManager::new(FakeSpeech::ok(), output.clone());
    let outcomes = Outcomes::default();

    for _ in 0..3 {
        manager.play("endless", Voice::Nova, recorder(&outcomes)).await;
    }
    assert_eq!(manager.active_count(), 3);

    manager.stop_all();

    // Every callback fired and the set emptied before stop_all returned
    let fired = outcomes.lock().unwrap().clone();
    assert_eq!(fired.len(), 3);
    assert!(fired.iter().all(|outcome| *outcome == PlaybackOutcome::Stopped));
    assert_eq!(manager.active_count(), 0);

    // Cancelled playback threads wind down without completing any clip
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(output.completed(), 0);
    assert_eq!(outcomes.lock().unwrap().len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stop_all_with_nothing_playing_is_a_noop() {
    let manager = PlaybackManager::new(
        FakeSpeech::ok(),
        FakeOutput::playing_for(Duration::from_millis(10)),
    );

    manager.stop_all();
    assert_eq!(manager.active_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn request_failure_fires_callback_without_a_handle() {
    let manager = PlaybackManager::new(
        FakeSpeech::failing(),
        FakeOutput::playing_for(Duration::from_millis(10)),
    );
    let outcomes = Outcomes::default();

    let id = manager.play("doomed", Voice::Nova, recorder(&outcomes)).await;

    assert!(id.is_none());
    assert_eq!(
        outcomes.lock().unwrap().clone(),
        vec![PlaybackOutcome::RequestFailed]
    );
    assert_eq!(manager.active_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn decode_failure_releases_the_handle() {
    let manager = PlaybackManager::new(
        FakeSpeech::ok(),
        FakeOutput::with(OutputBehavior::DecodeError),
    );
    let outcomes = Outcomes::default();

    let id = manager.play("garbled", Voice::Nova, recorder(&outcomes)).await;
    assert!(id.is_some());

    wait_for(|| outcomes.lock().unwrap().len() == 1).await;

    assert_eq!(
        outcomes.lock().unwrap().clone(),
        vec![PlaybackOutcome::LoadFailed]
    );
    assert_eq!(manager.active_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stream_failure_releases_the_handle() {
    let manager = PlaybackManager::new(
        FakeSpeech::ok(),
        FakeOutput::with(OutputBehavior::StreamError),
    );
    let outcomes = Outcomes::default();

    let id = manager.play("cursed", Voice::Nova, recorder(&outcomes)).await;
    assert!(id.is_some());

    wait_for(|| outcomes.lock().unwrap().len() == 1).await;

    assert_eq!(
        outcomes.lock().unwrap().clone(),
        vec![PlaybackOutcome::PlaybackFailed]
    );
    assert_eq!(manager.active_count(), 0);
}
