use crate::error::{ErrorResponse, HttpAppError};
use crate::services::ingest::UploadedFile;
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    Json,
};
use parley_core::models::FileUploadResult;
use parley_core::AppError;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub files: Vec<FileUploadResult>,
}

#[utoipa::path(
    post,
    path = "/api/v0/files",
    tag = "files",
    responses(
        (status = 200, description = "Files uploaded successfully", body = UploadResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart))]
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        HttpAppError(AppError::BadRequest(format!(
            "Invalid multipart request: {}",
            e
        )))
    })? {
        // Non-file form fields are ignored; only file parts are ingested.
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| {
                HttpAppError(AppError::BadRequest(format!(
                    "Failed to read file '{}': {}",
                    filename, e
                )))
            })?
            .to_vec();

        files.push(UploadedFile {
            filename,
            content_type,
            data,
        });
    }

    if files.is_empty() {
        return Err(HttpAppError(AppError::BadRequest(
            "No files provided".to_string(),
        )));
    }

    let results = state.ingest.upload(files).await.map_err(HttpAppError::from)?;

    Ok(Json(UploadResponse { files: results }))
}
