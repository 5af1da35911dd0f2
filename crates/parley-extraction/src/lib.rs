//! Content extraction for uploaded files.
//!
//! The extractor turns raw bytes plus a MIME type into plain text for the
//! language-model context window, with structured metadata about what
//! happened. Extraction never fails across its boundary: unsupported formats,
//! decode errors, and missing capabilities all degrade to a placeholder (or
//! no text) plus an `error`/`type` field in the metadata, and the upload
//! proceeds regardless.

pub mod extractor;
pub mod truncate;
pub mod validator;

pub use extractor::{ContentExtractor, Extraction};
pub use truncate::{truncate_text, MAX_TEXT_LENGTH, TRUNCATION_MARKER};
pub use validator::{FileValidator, ValidationError};
