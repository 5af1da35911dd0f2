//! Uniform truncation policy for extracted text.
//!
//! A single maximum length governs every text-bearing format; when exceeded,
//! the text is cut at a character boundary and the fixed marker appended.

/// Maximum extracted-text length in characters, shared by all formats.
pub const MAX_TEXT_LENGTH: usize = 10_000;

/// Marker appended when text is cut at [`MAX_TEXT_LENGTH`].
pub const TRUNCATION_MARKER: &str = "... [truncated]";

/// Truncate `text` to at most `max_chars` characters, appending
/// [`TRUNCATION_MARKER`] when a cut happened. Returns the (possibly
/// truncated) text and whether truncation occurred.
pub fn truncate_text(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (
            format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER),
            true,
        ),
        None => (text.to_string(), false),
    }
}
