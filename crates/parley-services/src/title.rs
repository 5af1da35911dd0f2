//! Conversation title generation helpers.
//!
//! The chat service asks the completion provider for a title with
//! [`TITLE_INSTRUCTION`]; the output is sanitized and hard-truncated here.
//! When the provider fails, [`fallback_title`] derives a deterministic title
//! from the first message and a timestamp instead.

use chrono::{DateTime, Utc};

/// Hard cap on conversation title length, in characters.
pub const TITLE_MAX_CHARS: usize = 50;

/// Prefix of the first message used by the fallback title, sized so the
/// prefix plus timestamp stays inside [`TITLE_MAX_CHARS`].
const FALLBACK_PREFIX_CHARS: usize = 25;

/// One-shot instruction prompt for title generation.
pub const TITLE_INSTRUCTION: &str = "Generate a short, descriptive title (max 50 characters) \
for a conversation that starts with the following user message. Only return the title, \
nothing else.";

/// Strip quote characters from a generated title and truncate to the cap.
pub fn sanitize_title(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '"' && *c != '\'')
        .collect();
    cleaned.chars().take(TITLE_MAX_CHARS).collect()
}

/// Deterministic title used when generation fails: a truncated prefix of the
/// first message plus a timestamp.
pub fn fallback_title(first_message: &str, now: DateTime<Utc>) -> String {
    let prefix: String = first_message
        .trim()
        .chars()
        .take(FALLBACK_PREFIX_CHARS)
        .collect();
    let title = format!("{}... ({})", prefix, now.format("%Y-%m-%d %H:%M"));
    title.chars().take(TITLE_MAX_CHARS).collect()
}

/// Default title for a conversation created without one.
pub fn default_title(now: DateTime<Utc>) -> String {
    format!("Conversation {}", now.format("%Y-%m-%d %H:%M"))
}
