//! Active-suggestion cursor state machine.
//!
//! Owns which suggestion is highlighted in Review mode and how the cursor
//! moves: explicit next/previous/jump navigation, resync when the
//! underlying suggestion set changes, and resolution with a planned
//! auto-advance. The manager is fully synchronous — the cosmetic 300 ms
//! auto-advance delay lives in the session layer, which commits the
//! planned switch through [`ActiveSuggestionManager::commit_pending_advance`].
//! Every explicit action bumps a generation counter, so a delayed commit
//! whose generation no longer matches is simply ignored instead of
//! overriding a manual choice.

use crate::types::{ActiveSuggestionState, Suggestion};

/// A planned active-suggestion switch, applied after the UI feedback delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAdvance {
    /// The suggestion to activate; `None` clears the cursor (set emptied).
    pub target_id: Option<String>,
    /// Index the target occupies in the available list (0 when clearing).
    pub target_index: usize,
    /// Generation this plan belongs to; stale plans are dropped on commit.
    pub generation: u64,
}

/// Outcome of [`ActiveSuggestionManager::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Whether the resolved id was the active suggestion.
    pub was_active: bool,
    /// Whether the available set is now empty — "all resolved" signal.
    pub all_resolved: bool,
    /// The switch to apply after the feedback delay, when auto-advance was
    /// requested and the resolved id was active.
    pub pending: Option<PendingAdvance>,
}

/// Finite-state cursor over the current unresolved suggestion set.
#[derive(Debug, Default)]
pub struct ActiveSuggestionManager {
    /// Unresolved ids in arrival/position order.
    available: Vec<String>,
    /// Resolved ids in resolution order; grows monotonically until reset.
    resolved: Vec<String>,
    active: Option<String>,
    current_index: usize,
    generation: u64,
    pending: Option<PendingAdvance>,
}

impl ActiveSuggestionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation; pass to `commit_pending_advance` when scheduling
    /// the delayed switch.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Read-only snapshot for the rendering layer.
    pub fn state(&self) -> ActiveSuggestionState {
        ActiveSuggestionState {
            active_suggestion_id: self.active.clone(),
            current_index: self.current_index,
            available_suggestions: self.available.clone(),
            resolved_suggestions: self.resolved.clone(),
        }
    }

    /// Resyncs the cursor with an externally changed suggestion list.
    ///
    /// Available becomes every id in `suggestions` (list order) that has
    /// not been resolved this session. The previously active id is kept if
    /// still present; otherwise the first suggestion is activated, or the
    /// cursor cleared when the list is empty. Any pending auto-advance is
    /// superseded — the set it was planned against no longer exists.
    pub fn sync_suggestions(&mut self, suggestions: &[Suggestion]) {
        self.generation += 1;
        self.pending = None;
        self.available = suggestions
            .iter()
            .filter(|s| !self.resolved.iter().any(|r| r == &s.id))
            .map(|s| s.id.clone())
            .collect();

        let kept_index = self.active.as_deref().and_then(|id| self.index_of(id));
        match kept_index {
            Some(idx) => {
                self.current_index = idx;
            }
            None if !self.available.is_empty() => {
                self.active = Some(self.available[0].clone());
                self.current_index = 0;
            }
            None => {
                self.active = None;
                self.current_index = 0;
            }
        }
    }

    /// Activates the suggestion at `index`.
    ///
    /// Rejects out-of-bounds requests (`false`) without touching state —
    /// there is no wraparound.
    pub fn navigate_to_index(&mut self, index: usize) -> bool {
        if index >= self.available.len() {
            return false;
        }
        self.generation += 1;
        self.pending = None;
        self.active = Some(self.available[index].clone());
        self.current_index = index;
        true
    }

    /// Moves to the next suggestion; activates the first when no cursor is
    /// set. Returns `false` at the end of the list.
    pub fn navigate_next(&mut self) -> bool {
        let active = match self.active.clone() {
            None => return self.navigate_to_index(0),
            Some(id) => id,
        };
        match self.index_of(&active) {
            Some(idx) => self.navigate_to_index(idx + 1),
            // The active id was resolved and awaits its auto-advance: its
            // old slot now holds the following suggestion, so "next"
            // targets the slot itself (clamped at the end).
            None => match self.available.len().checked_sub(1) {
                Some(last) => self.navigate_to_index(self.current_index.min(last)),
                None => false,
            },
        }
    }

    /// Moves to the previous suggestion. Returns `false` at index 0 or
    /// when no cursor is set.
    pub fn navigate_previous(&mut self) -> bool {
        let current = match self.active.as_deref() {
            None => return false,
            Some(id) => self.index_of(id).unwrap_or(self.current_index),
        };
        match current.checked_sub(1) {
            Some(prev) => self.navigate_to_index(prev),
            None => false,
        }
    }

    /// Moves `id` from available to resolved.
    ///
    /// When the resolved id was active and `auto_advance` is set, the
    /// replacement (same index, or one back when the last suggestion was
    /// resolved) is *planned*, not applied: the cursor keeps showing the
    /// resolved suggestion so the UI can render feedback, and the session
    /// layer commits the plan after its delay. Resolving an id twice is a
    /// no-op.
    pub fn resolve(&mut self, id: &str, auto_advance: bool) -> Resolution {
        let Some(removed_idx) = self.index_of(id) else {
            return Resolution {
                was_active: false,
                all_resolved: self.available.is_empty(),
                pending: None,
            };
        };

        self.generation += 1;
        self.pending = None;
        self.available.remove(removed_idx);
        if !self.resolved.iter().any(|r| r == id) {
            self.resolved.push(id.to_owned());
        }

        let was_active = self.active.as_deref() == Some(id);
        let all_resolved = self.available.is_empty();

        if !was_active {
            // Keep the cursor on the same suggestion; its index may have
            // shifted left.
            let shifted = self.active.as_deref().and_then(|a| self.index_of(a));
            if let Some(idx) = shifted {
                self.current_index = idx;
            }
            return Resolution { was_active, all_resolved, pending: None };
        }

        if !auto_advance {
            self.active = None;
            self.current_index = 0;
            return Resolution { was_active, all_resolved, pending: None };
        }

        let pending = if all_resolved {
            PendingAdvance { target_id: None, target_index: 0, generation: self.generation }
        } else {
            let target_index = removed_idx.min(self.available.len() - 1);
            PendingAdvance {
                target_id: Some(self.available[target_index].clone()),
                target_index,
                generation: self.generation,
            }
        };
        self.pending = Some(pending.clone());
        Resolution { was_active, all_resolved, pending: Some(pending) }
    }

    /// Applies the pending advance planned at `generation`.
    ///
    /// Returns `false` when the plan was superseded by a later navigation,
    /// resolution, resync, or reset — the late timer must not override a
    /// manual choice.
    pub fn commit_pending_advance(&mut self, generation: u64) -> bool {
        // A mismatched generation means a newer action owns the pending
        // slot (or cleared it); leave whatever is there untouched.
        match self.pending.take_if(|p| p.generation == generation) {
            Some(p) => {
                self.active = p.target_id;
                self.current_index = p.target_index;
                true
            }
            None => false,
        }
    }

    /// Restarts the session: clears resolutions and rebuilds the cursor
    /// from the full list.
    pub fn reset(&mut self, suggestions: &[Suggestion]) {
        self.generation += 1;
        self.pending = None;
        self.resolved.clear();
        self.available = suggestions.iter().map(|s| s.id.clone()).collect();
        self.current_index = 0;
        self.active = self.available.first().cloned();
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.available.iter().position(|s| s == id)
    }
}
