//! Head-and-tail windowing of over-long document text
//!
//! Tender documents put the object of the contract up front and the
//! penalties and annexes at the end, so both ends are kept and the middle is
//! dropped.

use std::borrow::Cow;

/// Text placed where the middle of a document was cut
pub const OMISSION_MARKER: &str = "\n\n[...]\n\n";

/// Keep the first `head` and last `tail` characters of `text` when it is
/// longer than `max` characters
///
/// Counts are in characters, never bytes, so multi-byte text is cut on
/// character boundaries.
pub fn window_text(text: &str, max: usize, head: usize, tail: usize) -> Cow<'_, str> {
    let len = text.chars().count();
    if len <= max {
        return Cow::Borrowed(text);
    }

    let head_end = byte_offset(text, head);
    let tail_start = byte_offset(text, len.saturating_sub(tail).max(head));

    let mut windowed =
        String::with_capacity(head_end + OMISSION_MARKER.len() + (text.len() - tail_start));
    windowed.push_str(&text[..head_end]);
    windowed.push_str(OMISSION_MARKER);
    windowed.push_str(&text[tail_start..]);
    Cow::Owned(windowed)
}

/// Byte offset of the `n`th character (or the end of the text)
fn byte_offset(text: &str, n: usize) -> usize {
    text.char_indices()
        .nth(n)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}
