//! Message repository.
//!
//! Appending a message and bumping the owning conversation's `updated_at`
//! happen in one transaction, so conversation ordering can never drift from
//! its message log.

use chrono::{DateTime, Utc};
use parley_core::models::{Attachment, Message, MessageRole};
use parley_core::AppError;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

/// Raw row: role as text, attachments as a JSONB array.
#[derive(Debug, FromRow)]
struct MessageRow {
    id: Uuid,
    conversation_id: Uuid,
    role: String,
    content: String,
    attachments: Option<Json<Vec<Attachment>>>,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    fn into_message(self) -> Result<Message, AppError> {
        let role: MessageRole = self.role.parse().map_err(|_| {
            AppError::Internal(format!(
                "Corrupt role '{}' on message {}",
                self.role, self.id
            ))
        })?;
        Ok(Message {
            id: self.id,
            conversation_id: self.conversation_id,
            role,
            content: self.content,
            attachments: self.attachments.map(|Json(a)| a),
            created_at: self.created_at,
        })
    }
}

#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(
        skip(self, content, attachments),
        fields(db.table = "messages", db.operation = "insert")
    )]
    pub async fn create(
        &self,
        conversation_id: Uuid,
        role: MessageRole,
        content: &str,
        attachments: Option<Vec<Attachment>>,
    ) -> Result<Message, AppError> {
        let mut tx = self.pool.begin().await?;

        let row: MessageRow = sqlx::query_as::<Postgres, MessageRow>(
            r#"
            INSERT INTO messages (id, conversation_id, role, content, attachments, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(conversation_id)
        .bind(role.as_str())
        .bind(content)
        .bind(attachments.map(Json))
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE conversations SET updated_at = NOW() WHERE id = $1")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        row.into_message()
    }

    /// All messages of a conversation, oldest first.
    #[tracing::instrument(skip(self), fields(db.table = "messages", db.operation = "select"))]
    pub async fn list(&self, conversation_id: Uuid) -> Result<Vec<Message>, AppError> {
        let rows: Vec<MessageRow> = sqlx::query_as::<Postgres, MessageRow>(
            "SELECT * FROM messages WHERE conversation_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MessageRow::into_message).collect()
    }

    /// The most recent `limit` messages, returned oldest first.
    #[tracing::instrument(skip(self), fields(db.table = "messages", db.operation = "select"))]
    pub async fn recent(
        &self,
        conversation_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Message>, AppError> {
        let rows: Vec<MessageRow> = sqlx::query_as::<Postgres, MessageRow>(
            r#"
            SELECT * FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(conversation_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut messages: Vec<Message> = rows
            .into_iter()
            .map(MessageRow::into_message)
            .collect::<Result<_, _>>()?;
        messages.reverse();
        Ok(messages)
    }
}
