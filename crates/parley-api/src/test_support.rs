//! In-memory fakes for service-level tests: no database, no network.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parley_core::models::{
    Attachment, Conversation, FileContent, Message, MessageRole, StoredFile,
};
use parley_core::AppError;
use parley_db::{ConversationStore, FileStore, MessageStore, NewStoredFile};
use parley_services::completion::{ChatMessage, CompletionClient};
use parley_storage::{Storage, StorageBackend, StorageError, StorageResult};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Strictly monotonic timestamps, so ordering assertions never tie.
fn next_instant() -> DateTime<Utc> {
    static COUNTER: AtomicI64 = AtomicI64::new(0);
    let offset = COUNTER.fetch_add(1, Ordering::SeqCst);
    Utc::now() + Duration::milliseconds(offset)
}

// ----- Storage -----

/// Blob store fake that records puts/deletes and can be told to fail.
pub struct MockStorage {
    puts: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
    fail_deletes: AtomicBool,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            puts: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            fail_deletes: AtomicBool::new(false),
        }
    }

    pub fn put_count(&self) -> usize {
        self.puts.lock().expect("lock").len()
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.lock().expect("lock").len()
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn put(
        &self,
        storage_key: &str,
        _content_type: &str,
        _data: Vec<u8>,
    ) -> StorageResult<String> {
        self.puts.lock().expect("lock").push(storage_key.to_string());
        Ok(self.public_url(storage_key))
    }

    fn public_url(&self, storage_key: &str) -> String {
        format!("http://files.test/{}", storage_key)
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::DeleteFailed("simulated failure".to_string()));
        }
        self.deletes
            .lock()
            .expect("lock")
            .push(storage_key.to_string());
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

// ----- File store -----

pub struct InMemoryFileStore {
    files: tokio::sync::Mutex<Vec<StoredFile>>,
}

impl InMemoryFileStore {
    pub fn new() -> Self {
        Self {
            files: tokio::sync::Mutex::new(Vec::new()),
        }
    }

    pub async fn count(&self) -> usize {
        self.files.lock().await.len()
    }
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    async fn find_by_hash(&self, content_hash: &str) -> Result<Option<StoredFile>, AppError> {
        Ok(self
            .files
            .lock()
            .await
            .iter()
            .find(|f| f.content_hash == content_hash)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<StoredFile>, AppError> {
        Ok(self.files.lock().await.iter().find(|f| f.id == id).cloned())
    }

    async fn insert(&self, file: NewStoredFile) -> Result<Option<StoredFile>, AppError> {
        let mut files = self.files.lock().await;
        if files.iter().any(|f| f.content_hash == file.content_hash) {
            return Ok(None);
        }
        let now = next_instant();
        let stored = StoredFile {
            id: Uuid::new_v4(),
            original_filename: file.original_filename,
            content_type: file.content_type,
            file_size: file.file_size,
            storage_key: file.storage_key,
            content_hash: file.content_hash,
            extracted_text: file.extracted_text,
            metadata: file.metadata,
            created_at: now,
            updated_at: now,
        };
        files.push(stored.clone());
        Ok(Some(stored))
    }

    async fn contents_by_ids(&self, ids: &[Uuid]) -> Result<Vec<FileContent>, AppError> {
        let files = self.files.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| files.iter().find(|f| f.id == *id))
            .cloned()
            .map(FileContent::from)
            .collect())
    }

    async fn delete_record(&self, id: Uuid) -> Result<bool, AppError> {
        let mut files = self.files.lock().await;
        let before = files.len();
        files.retain(|f| f.id != id);
        Ok(files.len() < before)
    }
}

// ----- Conversation store -----

pub struct InMemoryConversationStore {
    conversations: tokio::sync::Mutex<Vec<Conversation>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self {
            conversations: tokio::sync::Mutex::new(Vec::new()),
        }
    }

    /// Bump `updated_at`, mirroring the transactional touch the real message
    /// repository performs on append.
    pub async fn touch(&self, id: Uuid) {
        let mut conversations = self.conversations.lock().await;
        if let Some(conversation) = conversations.iter_mut().find(|c| c.id == id) {
            conversation.updated_at = next_instant();
        }
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create(&self, title: &str) -> Result<Conversation, AppError> {
        let now = next_instant();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.conversations.lock().await.push(conversation.clone());
        Ok(conversation)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Conversation>, AppError> {
        Ok(self
            .conversations
            .lock()
            .await
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Conversation>, AppError> {
        let mut conversations = self.conversations.lock().await.clone();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(conversations)
    }

    async fn update_title(&self, id: Uuid, title: &str) -> Result<bool, AppError> {
        let mut conversations = self.conversations.lock().await;
        match conversations.iter_mut().find(|c| c.id == id) {
            Some(conversation) => {
                conversation.title = title.to_string();
                conversation.updated_at = next_instant();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut conversations = self.conversations.lock().await;
        let before = conversations.len();
        conversations.retain(|c| c.id != id);
        Ok(conversations.len() < before)
    }
}

// ----- Message store -----

pub struct InMemoryMessageStore {
    messages: tokio::sync::Mutex<Vec<Message>>,
    conversations: Arc<InMemoryConversationStore>,
}

impl InMemoryMessageStore {
    /// Link a conversation store so appends bump its `updated_at`, matching
    /// the real repository's transaction.
    pub fn linked(conversations: Arc<InMemoryConversationStore>) -> Self {
        Self {
            messages: tokio::sync::Mutex::new(Vec::new()),
            conversations,
        }
    }

    pub async fn count(&self, conversation_id: Uuid) -> usize {
        self.messages
            .lock()
            .await
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .count()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn create(
        &self,
        conversation_id: Uuid,
        role: MessageRole,
        content: &str,
        attachments: Option<Vec<Attachment>>,
    ) -> Result<Message, AppError> {
        let message = Message {
            id: Uuid::new_v4(),
            conversation_id,
            role,
            content: content.to_string(),
            attachments,
            created_at: next_instant(),
        };
        self.messages.lock().await.push(message.clone());
        self.conversations.touch(conversation_id).await;
        Ok(message)
    }

    async fn list(&self, conversation_id: Uuid) -> Result<Vec<Message>, AppError> {
        Ok(self
            .messages
            .lock()
            .await
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    async fn recent(
        &self,
        conversation_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Message>, AppError> {
        let all: Vec<Message> = self
            .messages
            .lock()
            .await
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        let start = all.len().saturating_sub(limit);
        Ok(all[start..].to_vec())
    }
}

// ----- Completion client -----

/// Completion fake with a scripted reply, a failure switch, and prompt capture.
pub struct ScriptedCompletion {
    reply: Mutex<String>,
    fail: AtomicBool,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedCompletion {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Mutex::new(reply.to_string()),
            fail: AtomicBool::new(false),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(&self, reply: &str) {
        *self.reply.lock().expect("lock") = reply.to_string();
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn last_prompt(&self) -> Option<Vec<ChatMessage>> {
        self.prompts.lock().expect("lock").last().cloned()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        _max_tokens: u32,
        _temperature: f32,
    ) -> anyhow::Result<String> {
        self.prompts.lock().expect("lock").push(messages);
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("simulated provider failure");
        }
        Ok(self.reply.lock().expect("lock").clone())
    }
}
