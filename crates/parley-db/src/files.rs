//! Stored-file repository.
//!
//! Dedup is content-addressed: `content_hash` carries a unique index, and
//! inserts go through `ON CONFLICT DO NOTHING` so two concurrent uploads of
//! identical bytes can never both create a row.

use parley_core::models::{FileContent, StoredFile};
use parley_core::AppError;
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Postgres};
use std::collections::HashMap;
use uuid::Uuid;

/// Column values for a new stored-file row; the id and timestamps are
/// assigned on insert.
#[derive(Debug, Clone)]
pub struct NewStoredFile {
    pub original_filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub storage_key: String,
    pub content_hash: String,
    pub extracted_text: Option<String>,
    pub metadata: JsonValue,
}

#[derive(Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "stored_files", db.operation = "select"))]
    pub async fn find_by_hash(&self, content_hash: &str) -> Result<Option<StoredFile>, AppError> {
        let file: Option<StoredFile> = sqlx::query_as::<Postgres, StoredFile>(
            "SELECT * FROM stored_files WHERE content_hash = $1",
        )
        .bind(content_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(file)
    }

    #[tracing::instrument(skip(self), fields(db.table = "stored_files", db.operation = "select"))]
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<StoredFile>, AppError> {
        let file: Option<StoredFile> =
            sqlx::query_as::<Postgres, StoredFile>("SELECT * FROM stored_files WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(file)
    }

    /// Insert a new record. Returns `None` when another record with the same
    /// content hash already exists (a concurrent duplicate upload won the
    /// race); the caller then reuses the existing record.
    #[tracing::instrument(
        skip(self, file),
        fields(db.table = "stored_files", db.operation = "insert")
    )]
    pub async fn insert(&self, file: NewStoredFile) -> Result<Option<StoredFile>, AppError> {
        let row: Option<StoredFile> = sqlx::query_as::<Postgres, StoredFile>(
            r#"
            INSERT INTO stored_files (
                id, original_filename, content_type, file_size,
                storage_key, content_hash, extracted_text, metadata,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
            ON CONFLICT (content_hash) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&file.original_filename)
        .bind(&file.content_type)
        .bind(file.file_size)
        .bind(&file.storage_key)
        .bind(&file.content_hash)
        .bind(&file.extracted_text)
        .bind(&file.metadata)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Extracted-content projections for the given ids, input order preserved;
    /// ids with no record are silently omitted.
    #[tracing::instrument(skip(self), fields(db.table = "stored_files", db.operation = "select"))]
    pub async fn contents_by_ids(&self, ids: &[Uuid]) -> Result<Vec<FileContent>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let files: Vec<StoredFile> = sqlx::query_as::<Postgres, StoredFile>(
            "SELECT * FROM stored_files WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_id: HashMap<Uuid, StoredFile> =
            files.into_iter().map(|f| (f.id, f)).collect();

        Ok(ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .map(FileContent::from)
            .collect())
    }

    /// Delete the row for `id`; returns whether a row existed.
    #[tracing::instrument(skip(self), fields(db.table = "stored_files", db.operation = "delete"))]
    pub async fn delete_record(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM stored_files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
