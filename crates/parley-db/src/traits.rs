//! Store trait abstractions for service-level testing
//!
//! These traits define the minimal interface the ingestion and chat services
//! need from the repositories, allowing in-memory fakes in tests without a
//! database.

use async_trait::async_trait;
use parley_core::models::{Attachment, Conversation, FileContent, Message, MessageRole, StoredFile};
use parley_core::AppError;
use uuid::Uuid;

use crate::conversations::ConversationRepository;
use crate::files::{FileRepository, NewStoredFile};
use crate::messages::MessageRepository;

/// File persistence operations needed by the ingestion service.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn find_by_hash(&self, content_hash: &str) -> Result<Option<StoredFile>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<StoredFile>, AppError>;

    /// Insert; `None` means a record with the same hash already exists.
    async fn insert(&self, file: NewStoredFile) -> Result<Option<StoredFile>, AppError>;

    /// Content projections in input order, missing ids omitted.
    async fn contents_by_ids(&self, ids: &[Uuid]) -> Result<Vec<FileContent>, AppError>;

    async fn delete_record(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Conversation persistence operations needed by the chat service.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create(&self, title: &str) -> Result<Conversation, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Conversation>, AppError>;

    async fn list(&self) -> Result<Vec<Conversation>, AppError>;

    async fn update_title(&self, id: Uuid, title: &str) -> Result<bool, AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Message persistence operations needed by the chat service.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn create(
        &self,
        conversation_id: Uuid,
        role: MessageRole,
        content: &str,
        attachments: Option<Vec<Attachment>>,
    ) -> Result<Message, AppError>;

    async fn list(&self, conversation_id: Uuid) -> Result<Vec<Message>, AppError>;

    async fn recent(&self, conversation_id: Uuid, limit: usize)
        -> Result<Vec<Message>, AppError>;
}

// Implementations for concrete repository types

#[async_trait]
impl FileStore for FileRepository {
    async fn find_by_hash(&self, content_hash: &str) -> Result<Option<StoredFile>, AppError> {
        self.find_by_hash(content_hash).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<StoredFile>, AppError> {
        self.find_by_id(id).await
    }

    async fn insert(&self, file: NewStoredFile) -> Result<Option<StoredFile>, AppError> {
        self.insert(file).await
    }

    async fn contents_by_ids(&self, ids: &[Uuid]) -> Result<Vec<FileContent>, AppError> {
        self.contents_by_ids(ids).await
    }

    async fn delete_record(&self, id: Uuid) -> Result<bool, AppError> {
        self.delete_record(id).await
    }
}

#[async_trait]
impl ConversationStore for ConversationRepository {
    async fn create(&self, title: &str) -> Result<Conversation, AppError> {
        self.create(title).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Conversation>, AppError> {
        self.get(id).await
    }

    async fn list(&self) -> Result<Vec<Conversation>, AppError> {
        self.list().await
    }

    async fn update_title(&self, id: Uuid, title: &str) -> Result<bool, AppError> {
        self.update_title(id, title).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        self.delete(id).await
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    async fn create(
        &self,
        conversation_id: Uuid,
        role: MessageRole,
        content: &str,
        attachments: Option<Vec<Attachment>>,
    ) -> Result<Message, AppError> {
        self.create(conversation_id, role, content, attachments)
            .await
    }

    async fn list(&self, conversation_id: Uuid) -> Result<Vec<Message>, AppError> {
        self.list(conversation_id).await
    }

    async fn recent(
        &self,
        conversation_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Message>, AppError> {
        self.recent(conversation_id, limit).await
    }
}
