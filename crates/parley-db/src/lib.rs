//! Postgres repositories for Parley.
//!
//! Queries are runtime `sqlx::query_as` against the `migrations/` schema.
//! Each repository also implements a minimal store trait (see [`traits`]) so
//! services can be driven by in-memory fakes in tests.

pub mod conversations;
pub mod files;
pub mod messages;
pub mod traits;

pub use conversations::ConversationRepository;
pub use files::{FileRepository, NewStoredFile};
pub use messages::MessageRepository;
pub use traits::{ConversationStore, FileStore, MessageStore};
