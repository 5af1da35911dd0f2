//! File ingestion: validate, hash, deduplicate, extract, store.
//!
//! Dedup is content-addressed. Re-uploading identical bytes under any
//! filename reuses the existing record and never writes a second blob; the
//! unique hash index makes this hold under concurrent uploads too.
//!
//! Batch semantics: every file is validated before any side effect, so a
//! validation failure rejects the whole batch cleanly. After validation,
//! files process sequentially; a server fault on file N fails the request
//! while files before N stay persisted.

use parley_core::models::{FileContent, FileInfoResponse, FileUploadResult};
use parley_core::AppError;
use parley_db::{FileStore, NewStoredFile};
use parley_extraction::{ContentExtractor, FileValidator};
use parley_storage::{keys, Storage, StorageError};
use serde_json::json;
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

/// Length of the hash prefix recorded as upload provenance.
const UPLOAD_MARKER_LEN: usize = 16;

/// One file payload from an upload request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Clone)]
pub struct FileIngestService {
    validator: Arc<FileValidator>,
    extractor: Arc<ContentExtractor>,
    storage: Arc<dyn Storage>,
    files: Arc<dyn FileStore>,
}

impl FileIngestService {
    pub fn new(
        validator: FileValidator,
        extractor: ContentExtractor,
        storage: Arc<dyn Storage>,
        files: Arc<dyn FileStore>,
    ) -> Self {
        Self {
            validator: Arc::new(validator),
            extractor: Arc::new(extractor),
            storage,
            files,
        }
    }

    /// Upload a batch of files; one result per input, order preserved.
    pub async fn upload(
        &self,
        files: Vec<UploadedFile>,
    ) -> Result<Vec<FileUploadResult>, AppError> {
        // All validation runs before any storage side effect.
        for file in &files {
            self.validator
                .validate(&file.filename, &file.content_type, file.data.len())?;
        }

        let mut results = Vec::with_capacity(files.len());
        for file in files {
            results.push(self.upload_one(file).await?);
        }
        Ok(results)
    }

    async fn upload_one(&self, file: UploadedFile) -> Result<FileUploadResult, AppError> {
        let content_hash = hex::encode(Sha256::digest(&file.data));

        if let Some(existing) = self.files.find_by_hash(&content_hash).await? {
            tracing::info!(
                file_id = %existing.id,
                filename = %file.filename,
                existing_filename = %existing.original_filename,
                "Duplicate upload detected by content hash, reusing stored file"
            );
            let url = self.storage.public_url(&existing.storage_key);
            return Ok(FileUploadResult::from_stored(&existing, url, true));
        }

        // Extraction degrades internally; it never aborts the upload.
        let extraction = self
            .extractor
            .extract(&file.data, &file.content_type, &file.filename);

        let storage_key = keys::object_key(&file.filename);
        let file_size = file.data.len() as i64;
        let extension = keys::extension_of(&file.filename);
        let url = self
            .storage
            .put(&storage_key, &file.content_type, file.data)
            .await
            .map_err(AppError::from)?;

        let metadata = merged_metadata(
            extraction.metadata,
            file_size,
            extension.as_deref(),
            &content_hash,
        );

        let inserted = self
            .files
            .insert(NewStoredFile {
                original_filename: file.filename.clone(),
                content_type: file.content_type.clone(),
                file_size,
                storage_key: storage_key.clone(),
                content_hash: content_hash.clone(),
                extracted_text: extraction.text,
                metadata,
            })
            .await?;

        match inserted {
            Some(stored) => {
                tracing::info!(
                    file_id = %stored.id,
                    filename = %stored.original_filename,
                    size_bytes = stored.file_size,
                    has_extracted_content = stored.extracted_text.is_some(),
                    "File uploaded"
                );
                Ok(FileUploadResult::from_stored(&stored, url, false))
            }
            None => {
                // A concurrent upload of identical bytes won the insert race.
                // Our blob is unreferenced; clean it up off the request path.
                let storage = self.storage.clone();
                let orphan_key = storage_key.clone();
                tokio::spawn(async move {
                    if let Err(e) = storage.delete(&orphan_key).await {
                        tracing::debug!(
                            error = %e,
                            storage_key = %orphan_key,
                            "Failed to clean up orphan blob after concurrent duplicate upload"
                        );
                    }
                });

                let existing = self.files.find_by_hash(&content_hash).await?.ok_or_else(|| {
                    AppError::Internal(format!(
                        "Insert conflicted on hash {} but no record found",
                        content_hash
                    ))
                })?;
                let url = self.storage.public_url(&existing.storage_key);
                Ok(FileUploadResult::from_stored(&existing, url, true))
            }
        }
    }

    /// Metadata-only view of a stored file, `None` when absent.
    pub async fn file_info(&self, id: Uuid) -> Result<Option<FileInfoResponse>, AppError> {
        let Some(file) = self.files.find_by_id(id).await? else {
            return Ok(None);
        };
        let url = self.storage.public_url(&file.storage_key);
        Ok(Some(FileInfoResponse::from_stored(file, url)))
    }

    /// Extracted-content projections in input order; missing ids omitted.
    pub async fn files_content(&self, ids: &[Uuid]) -> Result<Vec<FileContent>, AppError> {
        self.files.contents_by_ids(ids).await
    }

    /// Delete blob then record; `false` when the id does not exist.
    ///
    /// The blob goes first: if blob deletion fails the record stays put and
    /// the error surfaces, so a record can never point at a half-deleted blob.
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let Some(file) = self.files.find_by_id(id).await? else {
            return Ok(false);
        };

        match self.storage.delete(&file.storage_key).await {
            Ok(()) => {}
            Err(StorageError::NotFound(_)) => {
                tracing::warn!(
                    file_id = %id,
                    storage_key = %file.storage_key,
                    "Blob already absent during delete, removing record"
                );
            }
            Err(e) => return Err(e.into()),
        }

        self.files.delete_record(id).await
    }
}

/// Merge extraction metadata with upload provenance.
fn merged_metadata(
    extraction: JsonValue,
    original_size: i64,
    extension: Option<&str>,
    content_hash: &str,
) -> JsonValue {
    let mut map = match extraction {
        JsonValue::Object(map) => map,
        other => {
            let mut map = serde_json::Map::new();
            if !other.is_null() {
                map.insert("extraction".to_string(), other);
            }
            map
        }
    };
    map.insert("original_size".to_string(), json!(original_size));
    map.insert("extension".to_string(), json!(extension));
    map.insert(
        "upload_marker".to_string(),
        json!(&content_hash[..UPLOAD_MARKER_LEN]),
    );
    JsonValue::Object(map)
}
