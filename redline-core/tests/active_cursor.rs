//! Active-suggestion cursor: navigation bounds, resolution consistency,
//! resync behavior, and pending-advance supersession.

use redline_core::active::ActiveSuggestionManager;
use redline_core::types::{Suggestion, SuggestionKind, SuggestionPriority};

fn suggestion(id: &str) -> Suggestion {
    Suggestion {
        id: id.to_owned(),
        content_id: "post-1".to_owned(),
        start_offset: 0,
        end_offset: 1,
        text_to_replace: "x".to_owned(),
        replace_with: "y".to_owned(),
        reason: String::new(),
        priority: SuggestionPriority::Low,
        kind: SuggestionKind::Spelling,
        context_before: String::new(),
        context_after: String::new(),
        created_at: 0,
    }
}

fn seeded(ids: &[&str]) -> ActiveSuggestionManager {
    let list: Vec<Suggestion> = ids.iter().map(|id| suggestion(id)).collect();
    let mut mgr = ActiveSuggestionManager::new();
    mgr.sync_suggestions(&list);
    mgr
}

#[test]
fn seeding_activates_the_first_suggestion() {
    let mgr = seeded(&["a", "b", "c"]);
    let state = mgr.state();
    assert_eq!(state.active_suggestion_id.as_deref(), Some("a"));
    assert_eq!(state.current_index, 0);
    assert_eq!(state.available_suggestions, ["a", "b", "c"]);
    assert!(state.resolved_suggestions.is_empty());
}

#[test]
fn navigation_respects_bounds_without_wraparound() {
    let mut mgr = seeded(&["a", "b", "c"]);

    assert!(!mgr.navigate_previous(), "previous at index 0 must be rejected");
    assert_eq!(mgr.state().current_index, 0, "rejected navigation leaves state unchanged");

    assert!(mgr.navigate_next());
    assert!(mgr.navigate_next());
    assert_eq!(mgr.active_id(), Some("c"));

    assert!(!mgr.navigate_next(), "next at the last index must be rejected");
    assert_eq!(mgr.active_id(), Some("c"));
    assert_eq!(mgr.state().current_index, 2);
}

#[test]
fn navigate_to_index_jumps_directly() {
    let mut mgr = seeded(&["a", "b", "c", "d"]);
    assert!(mgr.navigate_to_index(2));
    assert_eq!(mgr.active_id(), Some("c"));
    assert!(!mgr.navigate_to_index(4), "out-of-bounds jump is rejected");
    assert_eq!(mgr.active_id(), Some("c"));
}

#[test]
fn resolving_moves_id_to_resolved_permanently() {
    let mut mgr = seeded(&["a", "b", "c"]);
    let res = mgr.resolve("b", false);
    assert!(!res.was_active);
    assert!(!res.all_resolved);

    let state = mgr.state();
    assert_eq!(state.available_suggestions, ["a", "c"]);
    assert_eq!(state.resolved_suggestions, ["b"]);

    // A later resync must not reintroduce a resolved id.
    let list: Vec<Suggestion> = ["a", "b", "c"].iter().map(|id| suggestion(id)).collect();
    mgr.sync_suggestions(&list);
    assert_eq!(mgr.state().available_suggestions, ["a", "c"]);
    assert_eq!(mgr.state().resolved_suggestions, ["b"]);
}

#[test]
fn resolving_twice_is_a_no_op() {
    let mut mgr = seeded(&["a", "b"]);
    mgr.resolve("b", false);
    let res = mgr.resolve("b", false);
    assert!(!res.was_active);
    assert_eq!(mgr.state().resolved_suggestions, ["b"]);
    assert_eq!(mgr.state().available_suggestions, ["a"]);
}

#[test]
fn auto_advance_prefers_the_same_index() {
    let mut mgr = seeded(&["a", "b", "c"]);
    assert!(mgr.navigate_to_index(1));

    let res = mgr.resolve("b", true);
    assert!(res.was_active);
    let pending = res.pending.expect("an advance must be planned");
    assert_eq!(pending.target_id.as_deref(), Some("c"), "same index now holds c");
    assert_eq!(pending.target_index, 1);

    // Until the commit, the cursor still shows the resolved suggestion.
    assert_eq!(mgr.active_id(), Some("b"));

    assert!(mgr.commit_pending_advance(pending.generation));
    assert_eq!(mgr.active_id(), Some("c"));
    assert_eq!(mgr.state().current_index, 1);
}

#[test]
fn auto_advance_steps_back_when_last_is_resolved() {
    let mut mgr = seeded(&["a", "b", "c"]);
    assert!(mgr.navigate_to_index(2));

    let res = mgr.resolve("c", true);
    let pending = res.pending.expect("an advance must be planned");
    assert_eq!(pending.target_id.as_deref(), Some("b"));
    assert_eq!(pending.target_index, 1);

    assert!(mgr.commit_pending_advance(pending.generation));
    assert_eq!(mgr.active_id(), Some("b"));
}

#[test]
fn resolving_the_final_suggestion_signals_all_resolved() {
    let mut mgr = seeded(&["only"]);
    let res = mgr.resolve("only", true);
    assert!(res.all_resolved);
    let pending = res.pending.expect("the clearing advance is still planned");
    assert_eq!(pending.target_id, None);

    assert!(mgr.commit_pending_advance(pending.generation));
    assert_eq!(mgr.active_id(), None);
    assert!(mgr.state().available_suggestions.is_empty());
}

#[test]
fn manual_navigation_supersedes_a_pending_advance() {
    let mut mgr = seeded(&["a", "b", "c"]);
    assert!(mgr.navigate_to_index(1));
    let res = mgr.resolve("b", true);
    let pending = res.pending.expect("advance planned");

    // The user navigates before the delay fires; the late commit must not
    // override the manual choice.
    assert!(mgr.navigate_to_index(0));
    assert!(!mgr.commit_pending_advance(pending.generation));
    assert_eq!(mgr.active_id(), Some("a"));
}

#[test]
fn a_second_resolution_supersedes_the_first_pending_advance() {
    let mut mgr = seeded(&["a", "b", "c"]);
    assert!(mgr.navigate_to_index(0));
    let first = mgr.resolve("a", true);
    let first_pending = first.pending.expect("advance planned");

    // The replacement ("b") is resolved through some other path before the
    // first advance commits.
    let second = mgr.resolve("b", false);
    assert!(!second.was_active);

    assert!(!mgr.commit_pending_advance(first_pending.generation));
    assert_eq!(mgr.state().available_suggestions, ["c"]);
}

#[test]
fn resync_keeps_the_active_suggestion_when_still_present() {
    let mut mgr = seeded(&["a", "b", "c"]);
    assert!(mgr.navigate_to_index(1));

    // "a" disappears (e.g. invalidated by an edit); "b" survives.
    let list: Vec<Suggestion> = ["b", "c", "d"].iter().map(|id| suggestion(id)).collect();
    mgr.sync_suggestions(&list);

    let state = mgr.state();
    assert_eq!(state.active_suggestion_id.as_deref(), Some("b"));
    assert_eq!(state.current_index, 0, "index recomputed against the new list");
}

#[test]
fn resync_falls_back_to_first_when_active_disappears() {
    let mut mgr = seeded(&["a", "b"]);
    let list: Vec<Suggestion> = ["x", "y"].iter().map(|id| suggestion(id)).collect();
    mgr.sync_suggestions(&list);
    assert_eq!(mgr.active_id(), Some("x"));

    mgr.sync_suggestions(&[]);
    assert_eq!(mgr.active_id(), None);
}

#[test]
fn reset_clears_resolutions_and_rebuilds() {
    let mut mgr = seeded(&["a", "b"]);
    mgr.resolve("a", false);
    assert_eq!(mgr.state().resolved_suggestions, ["a"]);

    let list: Vec<Suggestion> = ["a", "b"].iter().map(|id| suggestion(id)).collect();
    mgr.reset(&list);
    let state = mgr.state();
    assert!(state.resolved_suggestions.is_empty());
    assert_eq!(state.available_suggestions, ["a", "b"]);
    assert_eq!(state.active_suggestion_id.as_deref(), Some("a"));
}
