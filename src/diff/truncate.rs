//! Character-bounded truncation of diff text.

use std::borrow::Cow;

/// Diff text capped to a character budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncatedDiff<'a> {
    pub text: Cow<'a, str>,
    pub truncated: bool,
    /// Character count before truncation.
    pub original_chars: usize,
}

/// Keep at most `max_chars` characters (not bytes) of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> TruncatedDiff<'_> {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => TruncatedDiff {
            text: Cow::Borrowed(&text[..byte_idx]),
            truncated: true,
            original_chars: text.chars().count(),
        },
        None => TruncatedDiff {
            text: Cow::Borrowed(text),
            truncated: false,
            original_chars: text.chars().count(),
        },
    }
}
