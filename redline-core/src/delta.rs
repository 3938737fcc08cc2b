//! Per-suggestion offset recalculation against a diff list.
//!
//! Infallible by contract: every suggestion yields exactly one
//! [`SuggestionDelta`], and "the anchor was destroyed" is a field on that
//! record (`is_valid = false`), never an error. The renderer drops invalid
//! suggestions; it must not attempt to repair them.

use crate::types::{ContentDiff, Suggestion, SuggestionDelta};

/// Computes an offset delta for each suggestion against `diffs`.
///
/// A suggestion whose `[start, end)` range overlaps any diff's old-range is
/// marked invalid with its offsets untouched. Otherwise the cumulative
/// length delta of every diff that ends at or before the suggestion's
/// start is applied to both offsets. Diffs are position-sorted (timestamp
/// as tiebreak) before accumulation so the result is deterministic when a
/// caller supplies more than one; the trim-based calculator emits at most
/// one per recalculation, so the scan is effectively O(suggestions).
pub fn calculate_deltas(diffs: &[ContentDiff], suggestions: &[Suggestion]) -> Vec<SuggestionDelta> {
    let mut ordered: Vec<&ContentDiff> = diffs.iter().collect();
    ordered.sort_by_key(|d| (d.start_offset, d.timestamp));

    suggestions
        .iter()
        .map(|s| delta_for(&ordered, s))
        .collect()
}

/// Builds the delta record for a single suggestion.
fn delta_for(ordered: &[&ContentDiff], suggestion: &Suggestion) -> SuggestionDelta {
    let overlapped = ordered.iter().any(|d| {
        !(suggestion.end_offset <= d.start_offset || suggestion.start_offset >= d.end_offset)
    });

    if overlapped {
        return SuggestionDelta {
            suggestion_id: suggestion.id.clone(),
            old_start_offset: suggestion.start_offset,
            old_end_offset: suggestion.end_offset,
            new_start_offset: suggestion.start_offset,
            new_end_offset: suggestion.end_offset,
            is_valid: false,
            requires_update: false,
        };
    }

    let shift: i64 = ordered
        .iter()
        .filter(|d| d.end_offset <= suggestion.start_offset)
        .map(|d| d.length_delta())
        .sum();

    // A diff that ends at or before the suggestion start can shrink the
    // document by at most the distance to that start, so the shifted
    // offsets stay non-negative; the max(0) guards the cast, not the math.
    let new_start = (suggestion.start_offset as i64 + shift).max(0) as usize;
    let new_end = (suggestion.end_offset as i64 + shift).max(0) as usize;

    SuggestionDelta {
        suggestion_id: suggestion.id.clone(),
        old_start_offset: suggestion.start_offset,
        old_end_offset: suggestion.end_offset,
        new_start_offset: new_start,
        new_end_offset: new_end,
        is_valid: true,
        requires_update: shift != 0,
    }
}
