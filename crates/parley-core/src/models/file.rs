use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

/// A stored file record. The payload bytes live in the blob store under
/// `storage_key`; only metadata and extracted text are persisted relationally.
///
/// `content_hash` is the SHA-256 hex digest of the raw bytes and carries a
/// unique index: byte-identical uploads always resolve to one row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StoredFile {
    pub id: Uuid,
    pub original_filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub storage_key: String,
    pub content_hash: String,
    pub extracted_text: Option<String>,
    pub metadata: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredFile {
    pub fn has_extracted_content(&self) -> bool {
        self.extracted_text.is_some()
    }
}

/// Per-file result of an upload request, order-matched to the input files.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadResult {
    pub id: Uuid,
    pub file_name: String,
    pub file_url: String,
    pub file_size: i64,
    pub mime_type: String,
    pub metadata: JsonValue,
    pub has_extracted_content: bool,
    pub is_duplicate: bool,
}

impl FileUploadResult {
    pub fn from_stored(file: &StoredFile, file_url: String, is_duplicate: bool) -> Self {
        FileUploadResult {
            id: file.id,
            file_name: file.original_filename.clone(),
            file_url,
            file_size: file.file_size,
            mime_type: file.content_type.clone(),
            metadata: file.metadata.clone(),
            has_extracted_content: file.has_extracted_content(),
            is_duplicate,
        }
    }
}

/// Metadata-only view of a stored file (no payload bytes through this path).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileInfoResponse {
    pub id: Uuid,
    pub file_name: String,
    pub file_url: String,
    pub file_size: i64,
    pub mime_type: String,
    pub metadata: JsonValue,
    pub has_extracted_content: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileInfoResponse {
    pub fn from_stored(file: StoredFile, file_url: String) -> Self {
        FileInfoResponse {
            id: file.id,
            file_name: file.original_filename,
            file_url,
            file_size: file.file_size,
            mime_type: file.content_type,
            metadata: file.metadata,
            has_extracted_content: file.extracted_text.is_some(),
            created_at: file.created_at,
            updated_at: file.updated_at,
        }
    }
}

/// Extracted-content projection consumed by the context assembler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileContent {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub extracted_text: Option<String>,
    pub metadata: JsonValue,
}

impl From<StoredFile> for FileContent {
    fn from(file: StoredFile) -> Self {
        FileContent {
            id: file.id,
            filename: file.original_filename,
            content_type: file.content_type,
            extracted_text: file.extracted_text,
            metadata: file.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_stored_file() -> StoredFile {
        StoredFile {
            id: Uuid::new_v4(),
            original_filename: "report.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            file_size: 2048,
            storage_key: "uploads/abc123.pdf".to_string(),
            content_hash: "deadbeef".to_string(),
            extracted_text: Some("Page 1:\nHello".to_string()),
            metadata: json!({"page_count": 1}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_upload_result_from_stored() {
        let file = test_stored_file();
        let result = FileUploadResult::from_stored(
            &file,
            "https://bucket.s3.us-east-1.amazonaws.com/uploads/abc123.pdf".to_string(),
            false,
        );
        assert_eq!(result.id, file.id);
        assert_eq!(result.file_name, "report.pdf");
        assert_eq!(result.file_size, 2048);
        assert!(result.has_extracted_content);
        assert!(!result.is_duplicate);
    }

    #[test]
    fn test_upload_result_wire_shape_is_camel_case() {
        let file = test_stored_file();
        let result = FileUploadResult::from_stored(&file, "http://x/uploads/a.pdf".into(), true);
        let json = serde_json::to_value(&result).expect("serialize");
        assert!(json.get("fileName").is_some());
        assert!(json.get("fileUrl").is_some());
        assert!(json.get("mimeType").is_some());
        assert!(json.get("hasExtractedContent").is_some());
        assert_eq!(json.get("isDuplicate"), Some(&json!(true)));
    }

    #[test]
    fn test_file_content_from_stored_without_text() {
        let mut file = test_stored_file();
        file.extracted_text = None;
        let content = FileContent::from(file.clone());
        assert_eq!(content.filename, file.original_filename);
        assert!(content.extracted_text.is_none());
    }
}
