//! Application state and sub-state extractors.
//!
//! All services are constructed once in `setup::services` and injected here;
//! handlers extract what they need via Axum's `State`/`FromRef` rather than
//! reaching for globals, so every collaborator can be swapped for a fake in
//! tests.

use crate::services::chat::ChatService;
use crate::services::ingest::FileIngestService;
use parley_core::Config;
use parley_db::{ConversationRepository, FileRepository, MessageRepository};
use parley_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

/// Database pool and repositories.
#[derive(Clone)]
#[allow(dead_code)] // Repositories are reachable via FromRef; not every build references each field
pub struct DbState {
    pub pool: PgPool,
    pub files: FileRepository,
    pub conversations: ConversationRepository,
    pub messages: MessageRepository,
}

/// Main application state: aggregates sub-states for dependency injection.
#[derive(Clone)]
pub struct AppState {
    pub db: DbState,
    pub ingest: FileIngestService,
    pub chat: ChatService,
    pub storage: Arc<dyn Storage>,
    pub config: Config,
    pub is_production: bool,
}

impl axum::extract::FromRef<Arc<AppState>> for DbState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.db.clone()
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
