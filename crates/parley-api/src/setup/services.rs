//! Service initialization and application state setup

use crate::services::chat::ChatService;
use crate::services::ingest::FileIngestService;
use crate::state::{AppState, DbState};
use anyhow::Result;
use parley_core::Config;
use parley_db::{ConversationRepository, FileRepository, MessageRepository};
use parley_extraction::{ContentExtractor, FileValidator};
use parley_services::{ChatCompletionsClient, ContextAssembler};
use parley_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Initialize all services and repositories, returning the application state.
///
/// Everything is constructed exactly once here and handed to request-handling
/// code by reference through `AppState` - no implicit globals.
pub fn initialize_services(
    config: &Config,
    pool: PgPool,
    storage: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    let file_db = FileRepository::new(pool.clone());
    let conversation_db = ConversationRepository::new(pool.clone());
    let message_db = MessageRepository::new(pool.clone());

    let validator = FileValidator::new(
        config.max_file_size_bytes,
        config.allowed_extensions.clone(),
        config.allowed_content_types.clone(),
    );
    let extractor = ContentExtractor::new();

    let ingest = FileIngestService::new(
        validator,
        extractor,
        storage.clone(),
        Arc::new(file_db.clone()),
    );

    if config.completion_api_key.is_empty() {
        tracing::warn!(
            "COMPLETION_API_KEY is not set; completion calls will fail and replies degrade to the fallback text"
        );
    }
    let completion = ChatCompletionsClient::new(
        config.completion_base_url.clone(),
        config.completion_api_key.clone(),
        config.completion_model.clone(),
        Duration::from_secs(config.completion_timeout_seconds),
    )?;

    let assembler = ContextAssembler::new(config.system_prompt.clone(), config.history_window);

    let chat = ChatService::new(
        Arc::new(conversation_db.clone()),
        Arc::new(message_db.clone()),
        Arc::new(file_db.clone()),
        Arc::new(completion),
        assembler,
        config.completion_max_tokens,
        config.completion_temperature,
        config.max_attachments_per_message,
    );

    let is_production = config.is_production();
    tracing::info!(
        environment = %config.environment,
        storage_backend = %storage.backend_type(),
        completion_model = %config.completion_model,
        history_window = config.history_window,
        "Services initialized"
    );

    Ok(Arc::new(AppState {
        db: DbState {
            pool,
            files: file_db,
            conversations: conversation_db,
            messages: message_db,
        },
        ingest,
        chat,
        storage,
        config: config.clone(),
        is_production,
    }))
}
