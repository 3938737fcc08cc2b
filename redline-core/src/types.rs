//! Owned data types shared across the engine.
//!
//! All types are fully owned (no borrowed lifetimes) and serde-enabled so
//! they can cross the collaborator boundary — the analysis service delivers
//! suggestions as wire data, and snapshots are handed to the rendering
//! layer without lifetime entanglement.

use serde::{Deserialize, Serialize};

use crate::text;

/// How urgently a suggestion should be surfaced to the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionPriority {
    Low,
    Medium,
    High,
}

/// Which analysis pass produced a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    /// Full-sentence AI rewrite.
    Llm,
    /// Brand-voice compliance.
    Brand,
    /// Factual accuracy.
    Fact,
    Grammar,
    Spelling,
}

/// A positional edit suggestion anchored to a character range of a post.
///
/// Suggestions are immutable-until-replaced: the server assigns `id` once,
/// and the engine only ever shifts the offsets or drops the record. The
/// anchor invariant is `content[start_offset..end_offset] ==
/// text_to_replace` (character offsets); [`Suggestion::anchors_in`] checks
/// it against a given content string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// Stable server-assigned identifier.
    pub id: String,
    /// The post this suggestion belongs to.
    pub content_id: String,
    /// Start of the anchored range (character offset, inclusive).
    pub start_offset: usize,
    /// End of the anchored range (character offset, exclusive).
    pub end_offset: usize,
    /// Exact text the suggestion claims to sit on; staleness detector.
    pub text_to_replace: String,
    /// Proposed replacement text.
    pub replace_with: String,
    /// Human-readable explanation shown in the review panel.
    pub reason: String,
    pub priority: SuggestionPriority,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    /// Up to a sentence of surrounding text before the anchor, for
    /// re-anchoring heuristics in the rendering layer.
    pub context_before: String,
    /// Surrounding text after the anchor.
    pub context_after: String,
    /// Unix timestamp in milliseconds.
    pub created_at: i64,
}

impl Suggestion {
    /// Returns `true` when this suggestion's range and anchor text are
    /// valid against `content`.
    ///
    /// A `false` result means the suggestion is stale and must not be
    /// rendered — either the range no longer fits the document or the text
    /// underneath it changed.
    pub fn anchors_in(&self, content: &str) -> bool {
        if self.start_offset >= self.end_offset {
            return false;
        }
        match text::slice_chars(content, self.start_offset, self.end_offset) {
            Some(anchored) => anchored == self.text_to_replace,
            None => false,
        }
    }
}

/// The shape of a contiguous changed region between two document versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Insert,
    Delete,
    Replace,
}

/// A single contiguous changed region between an old and a new document.
///
/// `start_offset`/`end_offset` are character offsets into the *old*
/// content. Multiple edits between recalculation points collapse into one
/// region via prefix/suffix trimming, so a diff list holds at most one
/// entry per old/new pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDiff {
    pub kind: DiffKind,
    /// Start of the changed region in the old content (inclusive).
    pub start_offset: usize,
    /// End of the changed region in the old content (exclusive).
    pub end_offset: usize,
    /// Text removed from the old content (empty for pure inserts).
    pub old_text: String,
    /// Text present in the new content (empty for pure deletes).
    pub new_text: String,
    /// Unix timestamp in milliseconds at diff computation time.
    pub timestamp: i64,
}

impl ContentDiff {
    /// Signed character-count change this diff introduces.
    pub fn length_delta(&self) -> i64 {
        text::char_len(&self.new_text) as i64 - text::char_len(&self.old_text) as i64
    }

    /// Applies this diff to `old`, reconstructing the new content.
    ///
    /// Returns `None` when the diff does not fit `old` (offsets out of
    /// bounds or recorded `old_text` absent at the range) — the caller must
    /// treat that as a stale diff, never as partial output.
    pub fn apply_to(&self, old: &str) -> Option<String> {
        let current = text::slice_chars(old, self.start_offset, self.end_offset)?;
        if current != self.old_text {
            return None;
        }
        text::splice_chars(old, self.start_offset, self.end_offset, &self.new_text)
    }
}

/// Per-suggestion outcome of running a diff list through the offset
/// calculator. Ephemeral: recomputed (or replayed from cache) on every
/// recalculation, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionDelta {
    pub suggestion_id: String,
    pub old_start_offset: usize,
    pub old_end_offset: usize,
    pub new_start_offset: usize,
    pub new_end_offset: usize,
    /// `false` means the anchor overlapped a changed region and the
    /// suggestion must be dropped, not repaired.
    pub is_valid: bool,
    /// `true` iff the offsets actually moved.
    pub requires_update: bool,
}

/// A merged, deduplicated changed region in *new*-content coordinates.
///
/// Drives the "request fresh analysis for the edited text" decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedRange {
    /// Start character offset into the new content (inclusive).
    pub start: usize,
    /// End character offset into the new content (exclusive).
    pub end: usize,
}

impl ChangedRange {
    /// Character length of the range.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Half-open overlap test against a suggestion range.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        !(end <= self.start || start >= self.end)
    }
}

/// Everything a recalculation produces for the rendering layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculationResult {
    /// Survivors with corrected offsets; every entry anchors in the new
    /// content.
    pub updated_suggestions: Vec<Suggestion>,
    /// Ids of suggestions dropped because their anchor text was destroyed.
    pub invalidated_suggestions: Vec<String>,
    /// Freshly fetched suggestions, deduplicated by id against survivors.
    pub new_suggestions: Vec<Suggestion>,
    /// Merged changed regions that drove (or could drive) re-analysis.
    pub changed_ranges: Vec<ChangedRange>,
}

/// Read-only snapshot of the active-suggestion cursor.
///
/// Owned exclusively by `ActiveSuggestionManager`; the rendering layer
/// reads snapshots and issues navigation/resolution intents, never mutates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSuggestionState {
    /// The suggestion currently highlighted, if any.
    pub active_suggestion_id: Option<String>,
    /// Index of the active suggestion within `available_suggestions`.
    pub current_index: usize,
    /// Unresolved suggestion ids in arrival/position order.
    pub available_suggestions: Vec<String>,
    /// Accepted/rejected ids, monotonically growing for the post session.
    pub resolved_suggestions: Vec<String>,
}
