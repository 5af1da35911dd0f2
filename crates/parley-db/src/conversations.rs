//! Conversation repository.

use parley_core::models::Conversation;
use parley_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

#[derive(Clone)]
pub struct ConversationRepository {
    pool: PgPool,
}

impl ConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(
        skip(self),
        fields(db.table = "conversations", db.operation = "insert")
    )]
    pub async fn create(&self, title: &str) -> Result<Conversation, AppError> {
        let conversation: Conversation = sqlx::query_as::<Postgres, Conversation>(
            r#"
            INSERT INTO conversations (id, title, created_at, updated_at)
            VALUES ($1, $2, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .fetch_one(&self.pool)
        .await?;

        Ok(conversation)
    }

    #[tracing::instrument(
        skip(self),
        fields(db.table = "conversations", db.operation = "select")
    )]
    pub async fn get(&self, id: Uuid) -> Result<Option<Conversation>, AppError> {
        let conversation: Option<Conversation> =
            sqlx::query_as::<Postgres, Conversation>("SELECT * FROM conversations WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(conversation)
    }

    /// All conversations, most recently updated first.
    #[tracing::instrument(
        skip(self),
        fields(db.table = "conversations", db.operation = "select")
    )]
    pub async fn list(&self) -> Result<Vec<Conversation>, AppError> {
        let conversations: Vec<Conversation> = sqlx::query_as::<Postgres, Conversation>(
            "SELECT * FROM conversations ORDER BY updated_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(conversations)
    }

    #[tracing::instrument(
        skip(self),
        fields(db.table = "conversations", db.operation = "update")
    )]
    pub async fn update_title(&self, id: Uuid, title: &str) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE conversations SET title = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(title)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a conversation; messages cascade via the foreign key.
    #[tracing::instrument(
        skip(self),
        fields(db.table = "conversations", db.operation = "delete")
    )]
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
