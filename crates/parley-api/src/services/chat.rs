//! Conversation orchestration: message persistence and AI reply generation.
//!
//! The conversation write always completes: a failed completion call is
//! logged and replaced with a fixed fallback reply, so the user message and
//! an agent message are both persisted regardless of provider health.

use chrono::Utc;
use parley_core::models::{
    Attachment, Conversation, ConversationResponse, FileContent, Message, MessageRole,
    SendMessageResponse,
};
use parley_core::AppError;
use parley_db::{ConversationStore, FileStore, MessageStore};
use parley_services::completion::{ChatMessage, CompletionClient};
use parley_services::context::ContextAssembler;
use parley_services::title;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Reply persisted when the completion provider fails.
pub const FALLBACK_REPLY: &str =
    "I apologize, but I couldn't generate a response at this time. Please try again.";

/// Sampling parameters for title generation (short, low-variance output).
const TITLE_MAX_TOKENS: u32 = 20;
const TITLE_TEMPERATURE: f32 = 0.3;

#[derive(Clone)]
pub struct ChatService {
    conversations: Arc<dyn ConversationStore>,
    messages: Arc<dyn MessageStore>,
    files: Arc<dyn FileStore>,
    completion: Arc<dyn CompletionClient>,
    assembler: Arc<ContextAssembler>,
    max_tokens: u32,
    temperature: f32,
    max_attachments: usize,
}

impl ChatService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        conversations: Arc<dyn ConversationStore>,
        messages: Arc<dyn MessageStore>,
        files: Arc<dyn FileStore>,
        completion: Arc<dyn CompletionClient>,
        assembler: ContextAssembler,
        max_tokens: u32,
        temperature: f32,
        max_attachments: usize,
    ) -> Self {
        Self {
            conversations,
            messages,
            files,
            completion,
            assembler: Arc::new(assembler),
            max_tokens,
            temperature,
            max_attachments,
        }
    }

    /// Persist a user message and generate the agent reply.
    ///
    /// Only `user` messages can be sent; the agent side of the conversation is
    /// always produced here. Nothing is persisted when validation fails.
    #[tracing::instrument(skip(self, content, attachments), fields(conversation_id = %conversation_id))]
    pub async fn send_message(
        &self,
        conversation_id: Uuid,
        role: MessageRole,
        content: &str,
        attachments: Option<Vec<Attachment>>,
    ) -> Result<SendMessageResponse, AppError> {
        if role != MessageRole::User {
            return Err(AppError::InvalidInput(
                "Only 'user' messages can be sent; agent replies are generated".to_string(),
            ));
        }

        if let Some(list) = &attachments {
            if list.len() > self.max_attachments {
                return Err(AppError::BadRequest(format!(
                    "Too many attachments: {} (max {})",
                    list.len(),
                    self.max_attachments
                )));
            }
        }

        if self.conversations.get(conversation_id).await?.is_none() {
            return Err(AppError::NotFound("Conversation not found".to_string()));
        }

        // History is read before the new message lands so the window holds
        // only prior messages.
        let history = self
            .messages
            .recent(conversation_id, self.assembler.history_window())
            .await?;

        let user_message = self
            .messages
            .create(
                conversation_id,
                MessageRole::User,
                content,
                attachments.clone(),
            )
            .await?;

        let reply = self
            .generate_reply(content, attachments.as_deref(), &history)
            .await;

        let agent_message = self
            .messages
            .create(conversation_id, MessageRole::Agent, &reply, None)
            .await?;

        Ok(SendMessageResponse {
            user_message,
            agent_message,
        })
    }

    async fn generate_reply(
        &self,
        content: &str,
        attachments: Option<&[Attachment]>,
        history: &[Message],
    ) -> String {
        let contents = match self.resolve_contents(attachments, history).await {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(error = %e, "Attachment content resolution failed, degrading to summaries");
                HashMap::new()
            }
        };

        let prompt = self
            .assembler
            .build_messages(content, attachments, None, history, &contents);

        match self
            .completion
            .complete(prompt, self.max_tokens, self.temperature)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "Completion call failed, using fallback reply");
                FALLBACK_REPLY.to_string()
            }
        }
    }

    /// Batch-resolve extracted content for every file referenced by the
    /// history window or the current attachments.
    async fn resolve_contents(
        &self,
        attachments: Option<&[Attachment]>,
        history: &[Message],
    ) -> Result<HashMap<Uuid, FileContent>, AppError> {
        let mut lists: Vec<&[Attachment]> = history
            .iter()
            .filter_map(|m| m.attachments.as_deref())
            .collect();
        if let Some(current) = attachments {
            lists.push(current);
        }

        let ids = ContextAssembler::referenced_file_ids(lists);
        let contents = self.files.contents_by_ids(&ids).await?;
        Ok(contents.into_iter().map(|c| (c.id, c)).collect())
    }

    pub async fn create_conversation(
        &self,
        title: Option<String>,
    ) -> Result<Conversation, AppError> {
        let title = match title {
            Some(t) if !t.trim().is_empty() => t,
            _ => title::default_title(Utc::now()),
        };
        self.conversations.create(&title).await
    }

    /// Create a conversation, send its first message, and auto-generate a
    /// title from that message.
    pub async fn start_conversation(
        &self,
        content: &str,
        attachments: Option<Vec<Attachment>>,
    ) -> Result<(Conversation, SendMessageResponse), AppError> {
        let conversation = self
            .conversations
            .create(&title::default_title(Utc::now()))
            .await?;

        let exchange = self
            .send_message(conversation.id, MessageRole::User, content, attachments)
            .await?;

        let generated = self.generate_title(content).await;
        self.conversations
            .update_title(conversation.id, &generated)
            .await?;

        let conversation = self
            .conversations
            .get(conversation.id)
            .await?
            .unwrap_or(conversation);

        Ok((conversation, exchange))
    }

    async fn generate_title(&self, first_message: &str) -> String {
        let prompt = vec![
            ChatMessage::new("system", title::TITLE_INSTRUCTION),
            ChatMessage::new("user", first_message),
        ];

        match self
            .completion
            .complete(prompt, TITLE_MAX_TOKENS, TITLE_TEMPERATURE)
            .await
        {
            Ok(raw) => {
                let sanitized = title::sanitize_title(&raw);
                if sanitized.is_empty() {
                    title::fallback_title(first_message, Utc::now())
                } else {
                    sanitized
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Title generation failed, using fallback");
                title::fallback_title(first_message, Utc::now())
            }
        }
    }

    /// All conversations with nested messages, most recently updated first.
    pub async fn list_conversations(&self) -> Result<Vec<ConversationResponse>, AppError> {
        let conversations = self.conversations.list().await?;
        let mut responses = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let messages = self.messages.list(conversation.id).await?;
            responses.push(ConversationResponse::new(conversation, messages));
        }
        Ok(responses)
    }

    pub async fn get_conversation(
        &self,
        id: Uuid,
    ) -> Result<Option<ConversationResponse>, AppError> {
        let Some(conversation) = self.conversations.get(id).await? else {
            return Ok(None);
        };
        let messages = self.messages.list(id).await?;
        Ok(Some(ConversationResponse::new(conversation, messages)))
    }

    /// Delete a conversation and, by ownership, all of its messages.
    pub async fn delete_conversation(&self, id: Uuid) -> Result<bool, AppError> {
        self.conversations.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        InMemoryConversationStore, InMemoryFileStore, InMemoryMessageStore, ScriptedCompletion,
    };
    use parley_core::models::AttachmentKind;

    struct Fixture {
        service: ChatService,
        conversations: Arc<InMemoryConversationStore>,
        messages: Arc<InMemoryMessageStore>,
        completion: Arc<ScriptedCompletion>,
    }

    fn fixture() -> Fixture {
        let conversations = Arc::new(InMemoryConversationStore::new());
        let messages = Arc::new(InMemoryMessageStore::linked(conversations.clone()));
        let files = Arc::new(InMemoryFileStore::new());
        let completion = Arc::new(ScriptedCompletion::replying("Sure, here is my analysis."));
        let service = ChatService::new(
            conversations.clone(),
            messages.clone(),
            files,
            completion.clone(),
            ContextAssembler::new("You are helpful.".to_string(), 10),
            1000,
            0.7,
            3,
        );
        Fixture {
            service,
            conversations,
            messages,
            completion,
        }
    }

    async fn conversation(fixture: &Fixture) -> Conversation {
        fixture
            .conversations
            .create("Test conversation")
            .await
            .expect("create")
    }

    #[tokio::test]
    async fn test_send_message_persists_user_and_agent_messages() {
        let fx = fixture();
        let convo = conversation(&fx).await;

        let exchange = fx
            .service
            .send_message(convo.id, MessageRole::User, "What happened?", None)
            .await
            .expect("send");

        assert_eq!(exchange.user_message.role, MessageRole::User);
        assert_eq!(exchange.user_message.content, "What happened?");
        assert_eq!(exchange.agent_message.role, MessageRole::Agent);
        assert_eq!(exchange.agent_message.content, "Sure, here is my analysis.");
        assert_eq!(fx.messages.count(convo.id).await, 2);
    }

    #[tokio::test]
    async fn test_agent_role_rejected_and_nothing_persisted() {
        let fx = fixture();
        let convo = conversation(&fx).await;

        let err = fx
            .service
            .send_message(convo.id, MessageRole::Agent, "I am the agent", None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(fx.messages.count(convo.id).await, 0);
    }

    #[tokio::test]
    async fn test_missing_conversation_is_not_found() {
        let fx = fixture();
        let err = fx
            .service
            .send_message(Uuid::new_v4(), MessageRole::User, "hello?", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_completion_failure_degrades_to_fallback_reply() {
        let fx = fixture();
        let convo = conversation(&fx).await;
        fx.completion.fail(true);

        let exchange = fx
            .service
            .send_message(convo.id, MessageRole::User, "Still there?", None)
            .await
            .expect("send must not surface the provider failure");

        assert_eq!(exchange.agent_message.content, FALLBACK_REPLY);
        // User message persisted despite the failure.
        assert_eq!(fx.messages.count(convo.id).await, 2);
    }

    #[tokio::test]
    async fn test_prompt_has_system_first_window_and_current_last() {
        let fx = fixture();
        let convo = conversation(&fx).await;

        for i in 0..15 {
            fx.service
                .send_message(convo.id, MessageRole::User, &format!("msg {}", i), None)
                .await
                .expect("send");
        }

        let prompt = fx.completion.last_prompt().expect("prompt captured");
        assert_eq!(prompt[0].role, "system");
        assert_eq!(prompt.last().unwrap().role, "user");
        assert_eq!(prompt.last().unwrap().content, "msg 14");
        // system + 10-message window + current
        assert_eq!(prompt.len(), 12);
    }

    #[tokio::test]
    async fn test_too_many_attachments_is_client_error() {
        let fx = fixture();
        let convo = conversation(&fx).await;

        let attachment = Attachment {
            kind: AttachmentKind::File,
            name: "f".to_string(),
            url: "/api/v0/files/4b4b2ecd-5f5a-4f68-9809-0a5bd2f0f9a3".to_string(),
            size: None,
            mime_type: None,
            metadata: None,
        };
        let err = fx
            .service
            .send_message(
                convo.id,
                MessageRole::User,
                "see these",
                Some(vec![attachment.clone(), attachment.clone(), attachment.clone(), attachment]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(fx.messages.count(convo.id).await, 0);
    }

    #[tokio::test]
    async fn test_start_conversation_generates_title() {
        let fx = fixture();
        fx.completion.reply("\"Quarterly Filing Review\"");

        let (conversation, exchange) = fx
            .service
            .start_conversation("Please review the quarterly filing", None)
            .await
            .expect("start");

        assert_eq!(conversation.title, "Quarterly Filing Review");
        assert_eq!(exchange.user_message.content, "Please review the quarterly filing");
        assert_eq!(fx.messages.count(conversation.id).await, 2);
    }

    #[tokio::test]
    async fn test_start_conversation_title_falls_back_on_failure() {
        let fx = fixture();
        fx.completion.fail(true);

        let (conversation, _exchange) = fx
            .service
            .start_conversation("Please review the quarterly filing", None)
            .await
            .expect("start");

        assert!(!conversation.title.is_empty());
        assert!(conversation.title.chars().count() <= title::TITLE_MAX_CHARS);
        assert!(conversation.title.starts_with("Please review the quarter"));
    }

    #[tokio::test]
    async fn test_create_conversation_default_title_when_omitted() {
        let fx = fixture();
        let conversation = fx
            .service
            .create_conversation(None)
            .await
            .expect("create");
        assert!(conversation.title.starts_with("Conversation "));

        let named = fx
            .service
            .create_conversation(Some("Budget planning".to_string()))
            .await
            .expect("create");
        assert_eq!(named.title, "Budget planning");
    }

    #[tokio::test]
    async fn test_list_conversations_most_recent_first() {
        let fx = fixture();
        let first = conversation(&fx).await;
        let second = conversation(&fx).await;

        // Touch the first conversation after the second was created.
        fx.service
            .send_message(first.id, MessageRole::User, "bump", None)
            .await
            .expect("send");

        let listed = fx.service.list_conversations().await.expect("list");
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[1].id, second.id);
        assert_eq!(listed[0].messages.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_conversation_removes_it() {
        let fx = fixture();
        let convo = conversation(&fx).await;

        assert!(fx.service.delete_conversation(convo.id).await.expect("delete"));
        assert!(fx
            .service
            .get_conversation(convo.id)
            .await
            .expect("get")
            .is_none());
        assert!(!fx.service.delete_conversation(convo.id).await.expect("delete"));
    }
}
