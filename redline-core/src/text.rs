//! Character-offset helpers.
//!
//! All offsets in the engine are zero-based character indices (Unicode
//! scalar values), not byte indices — suggestion ranges arrive from the
//! analysis service in character coordinates. These helpers convert a
//! half-open character range into a `&str` slice without ever splitting a
//! multi-byte sequence.

/// Returns the number of characters in `s`.
///
/// O(n) — documents are re-scanned per recalculation, which is bounded by
/// the editor's document size, not by keystroke frequency.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Converts the character index `idx` into a byte offset into `s`.
///
/// Returns `None` if `idx` is past the end of the string. `idx == char_len`
/// maps to `s.len()` so half-open ranges can include the string end.
pub fn byte_offset(s: &str, idx: usize) -> Option<usize> {
    if idx == 0 {
        return Some(0);
    }
    let mut seen = 0usize;
    for (byte, _) in s.char_indices() {
        if seen == idx {
            return Some(byte);
        }
        seen += 1;
    }
    // After the loop `seen` is the total character count; `idx == seen`
    // addresses the one-past-the-end position.
    (idx == seen).then_some(s.len())
}

/// Slices `s` by the half-open character range `[start, end)`.
///
/// Returns `None` when the range is inverted or extends past the end of the
/// string. An empty range at a valid position yields `Some("")`.
pub fn slice_chars(s: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }
    let b_start = byte_offset(s, start)?;
    let b_end = byte_offset(s, end)?;
    Some(&s[b_start..b_end])
}

/// Replaces the half-open character range `[start, end)` of `s` with
/// `replacement`, returning the new string.
///
/// Returns `None` on an out-of-bounds or inverted range.
pub fn splice_chars(s: &str, start: usize, end: usize, replacement: &str) -> Option<String> {
    if start > end {
        return None;
    }
    let b_start = byte_offset(s, start)?;
    let b_end = byte_offset(s, end)?;
    let mut out = String::with_capacity(s.len() - (b_end - b_start) + replacement.len());
    out.push_str(&s[..b_start]);
    out.push_str(replacement);
    out.push_str(&s[b_end..]);
    Some(out)
}
