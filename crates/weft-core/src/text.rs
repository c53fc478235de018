//! UTF-8 safe string truncation.
//!
//! `&str[..n]` panics when `n` falls inside a multi-byte character, so these
//! helpers snap to the nearest char boundary.

/// Truncate a string to at most `max_bytes` bytes at a char boundary.
///
/// Used for log previews where the budget is in bytes.
#[inline]
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Truncate a string to at most `max_chars` characters.
///
/// Used for UI previews where the budget is in characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
