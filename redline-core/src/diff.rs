//! Bounded content diffing between two document versions.
//!
//! The calculator trims the common prefix and common suffix of the two
//! strings and reports the remaining middle as a single contiguous changed
//! region. This is deliberately not a minimal-edit-script diff: downstream
//! offset arithmetic only needs a *safe bound* on the changed region, so a
//! whole-document replace is a correct (if coarse) answer when nothing is
//! shared. Two algorithmic paths keep cost bounded:
//!
//! - character-wise trim for documents under [`DiffCalculator::DEFAULT_LINE_THRESHOLD`]
//!   characters;
//! - line-wise trim for larger documents, with offsets still reported in
//!   characters.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::text;
use crate::types::{ContentDiff, DiffKind};

/// Returns the current Unix timestamp in milliseconds.
fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Computes the single changed region between two versions of a document.
#[derive(Debug, Clone)]
pub struct DiffCalculator {
    /// Documents at or above this many characters use the line-wise path.
    line_threshold: usize,
}

impl Default for DiffCalculator {
    fn default() -> Self {
        Self { line_threshold: Self::DEFAULT_LINE_THRESHOLD }
    }
}

impl DiffCalculator {
    /// Character count at which diffing switches from per-character to
    /// per-line comparison.
    pub const DEFAULT_LINE_THRESHOLD: usize = 10_000;

    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the line-path threshold (mainly for tests and tuning).
    pub fn with_line_threshold(line_threshold: usize) -> Self {
        Self { line_threshold }
    }

    /// Diffs `old` against `new`.
    ///
    /// Returns an empty vec iff the strings are equal, otherwise exactly
    /// one [`ContentDiff`] whose old-range plus `new_text` reconstructs
    /// `new` (see [`ContentDiff::apply_to`]).
    pub fn diff(&self, old: &str, new: &str) -> Vec<ContentDiff> {
        if old == new {
            return Vec::new();
        }

        let old_len = text::char_len(old);
        let new_len = text::char_len(new);
        let use_lines = old_len.max(new_len) >= self.line_threshold;

        let (prefix, suffix) = if use_lines {
            line_trim(old, new)
        } else {
            char_trim(old, new)
        };

        let old_middle_end = old_len - suffix;
        let new_middle_end = new_len - suffix;
        // slice_chars cannot fail here: prefix and suffix are bounded by
        // the shorter string during trimming.
        let old_text = text::slice_chars(old, prefix, old_middle_end)
            .unwrap_or_default()
            .to_owned();
        let new_text = text::slice_chars(new, prefix, new_middle_end)
            .unwrap_or_default()
            .to_owned();

        if old_text.is_empty() && new_text.is_empty() {
            return Vec::new();
        }

        let kind = if old_text.is_empty() {
            DiffKind::Insert
        } else if new_text.is_empty() {
            DiffKind::Delete
        } else {
            DiffKind::Replace
        };

        tracing::debug!(
            ?kind,
            start = prefix,
            end = old_middle_end,
            removed = old_text.len(),
            inserted = new_text.len(),
            "content diff computed"
        );

        vec![ContentDiff {
            kind,
            start_offset: prefix,
            end_offset: old_middle_end,
            old_text,
            new_text,
            timestamp: now_millis(),
        }]
    }
}

/// Character-wise common prefix/suffix lengths (in characters).
///
/// The suffix scan is capped at `min(old, new) - prefix` so the two trims
/// never claim the same character twice (e.g. `"aa"` → `"aaa"`).
fn char_trim(old: &str, new: &str) -> (usize, usize) {
    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();

    let max_shared = old_chars.len().min(new_chars.len());
    let mut prefix = 0;
    while prefix < max_shared && old_chars[prefix] == new_chars[prefix] {
        prefix += 1;
    }

    let max_suffix = max_shared - prefix;
    let mut suffix = 0;
    while suffix < max_suffix
        && old_chars[old_chars.len() - 1 - suffix] == new_chars[new_chars.len() - 1 - suffix]
    {
        suffix += 1;
    }

    (prefix, suffix)
}

/// Line-wise common prefix/suffix lengths, converted to character counts.
///
/// Compares whole lines (newline included) so the per-comparison cost on a
/// large document is one `&str` equality instead of a character walk. The
/// resulting region is at worst one line coarser on each side than the
/// character-wise answer, which downstream logic tolerates by design.
fn line_trim(old: &str, new: &str) -> (usize, usize) {
    let old_lines: Vec<&str> = old.split_inclusive('\n').collect();
    let new_lines: Vec<&str> = new.split_inclusive('\n').collect();

    let max_shared = old_lines.len().min(new_lines.len());
    let mut prefix_lines = 0;
    while prefix_lines < max_shared && old_lines[prefix_lines] == new_lines[prefix_lines] {
        prefix_lines += 1;
    }

    let max_suffix = max_shared - prefix_lines;
    let mut suffix_lines = 0;
    while suffix_lines < max_suffix
        && old_lines[old_lines.len() - 1 - suffix_lines]
            == new_lines[new_lines.len() - 1 - suffix_lines]
    {
        suffix_lines += 1;
    }

    let prefix = old_lines[..prefix_lines]
        .iter()
        .map(|l| text::char_len(l))
        .sum();
    let suffix = old_lines[old_lines.len() - suffix_lines..]
        .iter()
        .map(|l| text::char_len(l))
        .sum();

    (prefix, suffix)
}
