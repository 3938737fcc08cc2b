//! Editor-session behavior: best-effort remote deletes and the
//! cancellable auto-advance window.

mod support;

use std::sync::Arc;
use std::time::Duration;

use redline::config::EngineConfig;
use redline::remote::RemoteError;
use redline::session::EditorSession;

use support::{suggestion, MockAnalysis, StaticAuth};

fn session_with(analysis: &Arc<MockAnalysis>) -> EditorSession {
    EditorSession::new(
        Arc::new(StaticAuth),
        Arc::clone(analysis) as Arc<dyn redline::remote::AnalysisService>,
        &EngineConfig::default(),
    )
}

fn three_suggestions() -> Vec<redline_core::types::Suggestion> {
    vec![
        suggestion("a", 0, 3, "Teh", "The"),
        suggestion("b", 4, 7, "cta", "cat"),
        suggestion("c", 8, 11, "sta", "sat"),
    ]
}

#[tokio::test(start_paused = true)]
async fn resolving_deletes_remotely_and_advances_after_the_delay() {
    let analysis = MockAnalysis::new();
    let session = session_with(&analysis);
    session.sync_suggestions(&three_suggestions());

    let resolution = session.resolve_suggestion("a", true).await;
    assert!(resolution.was_active);
    assert!(!resolution.all_resolved);

    // Inside the feedback window the cursor still shows the resolved id.
    assert_eq!(session.state().active_suggestion_id.as_deref(), Some("a"));

    tokio::time::sleep(Duration::from_millis(400)).await;
    let state = session.state();
    assert_eq!(state.active_suggestion_id.as_deref(), Some("b"), "advanced to the same slot");
    assert_eq!(state.available_suggestions, ["b", "c"]);
    assert_eq!(state.resolved_suggestions, ["a"]);
    assert_eq!(analysis.deleted.lock().unwrap().as_slice(), ["a"]);
}

#[tokio::test(start_paused = true)]
async fn manual_navigation_wins_over_a_pending_advance() {
    let analysis = MockAnalysis::new();
    let session = session_with(&analysis);
    session.sync_suggestions(&three_suggestions());

    session.resolve_suggestion("a", true).await;
    // The writer jumps to "c" before the 300 ms window elapses.
    assert!(session.navigate_to_index(1));
    assert_eq!(session.state().active_suggestion_id.as_deref(), Some("c"));

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(
        session.state().active_suggestion_id.as_deref(),
        Some("c"),
        "the late auto-advance must not override the manual choice"
    );
}

#[tokio::test(start_paused = true)]
async fn failed_remote_delete_does_not_block_resolution() {
    let analysis = MockAnalysis::new();
    let session = session_with(&analysis);
    session.sync_suggestions(&three_suggestions());
    analysis.queue_delete_error(RemoteError::Network("offline".to_owned()));

    let resolution = session.resolve_suggestion("b", false).await;
    assert!(!resolution.was_active);
    let state = session.state();
    assert_eq!(state.available_suggestions, ["a", "c"]);
    assert_eq!(state.resolved_suggestions, ["b"]);
    assert!(analysis.deleted.lock().unwrap().is_empty(), "the delete itself failed");
}

#[tokio::test(start_paused = true)]
async fn resolving_everything_signals_all_resolved_and_clears() {
    let analysis = MockAnalysis::new();
    let session = session_with(&analysis);
    session.sync_suggestions(&[suggestion("only", 0, 3, "Teh", "The")]);

    let resolution = session.resolve_suggestion("only", true).await;
    assert!(resolution.all_resolved);

    tokio::time::sleep(Duration::from_millis(400)).await;
    let state = session.state();
    assert_eq!(state.active_suggestion_id, None);
    assert!(state.available_suggestions.is_empty());
}

#[tokio::test(start_paused = true)]
async fn resync_supersedes_a_pending_advance() {
    let analysis = MockAnalysis::new();
    let session = session_with(&analysis);
    session.sync_suggestions(&three_suggestions());

    session.resolve_suggestion("a", true).await;
    // A recalculation lands before the advance commits; the resync decides
    // the new cursor, not the stale timer.
    session.sync_suggestions(&three_suggestions()[1..].to_vec());

    tokio::time::sleep(Duration::from_millis(400)).await;
    let state = session.state();
    assert_eq!(state.active_suggestion_id.as_deref(), Some("b"));
    assert_eq!(state.available_suggestions, ["b", "c"]);
}

#[tokio::test(start_paused = true)]
async fn reset_restores_resolved_suggestions() {
    let analysis = MockAnalysis::new();
    let session = session_with(&analysis);
    let list = three_suggestions();
    session.sync_suggestions(&list);

    session.resolve_suggestion("a", false).await;
    assert_eq!(session.state().resolved_suggestions, ["a"]);

    session.reset(&list);
    let state = session.state();
    assert!(state.resolved_suggestions.is_empty());
    assert_eq!(state.available_suggestions, ["a", "b", "c"]);
    assert_eq!(state.active_suggestion_id.as_deref(), Some("a"));
}
