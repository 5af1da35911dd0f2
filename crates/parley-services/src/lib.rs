//! Completion-provider client and context assembly for Parley.
//!
//! `completion` holds the opaque text-completion boundary (trait plus an
//! OpenAI-compatible HTTP client); `context` builds the bounded message list
//! for a completion call; `title` generates and sanitizes conversation titles.

pub mod completion;
pub mod context;
pub mod title;

pub use completion::{ChatCompletionsClient, ChatMessage, CompletionClient};
pub use context::ContextAssembler;
