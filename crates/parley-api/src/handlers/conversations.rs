use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use parley_core::models::{Conversation, ConversationResponse};
use parley_core::AppError;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateConversationRequest {
    /// Optional title; a timestamp-based default is used when omitted.
    pub title: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v0/conversations",
    tag = "conversations",
    responses(
        (status = 200, description = "All conversations, most recently updated first", body = [ConversationResponse]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ConversationResponse>>, HttpAppError> {
    let conversations = state
        .chat
        .list_conversations()
        .await
        .map_err(HttpAppError::from)?;
    Ok(Json(conversations))
}

#[utoipa::path(
    get,
    path = "/api/v0/conversations/{id}",
    tag = "conversations",
    params(
        ("id" = Uuid, Path, description = "Conversation ID")
    ),
    responses(
        (status = 200, description = "Conversation with messages", body = ConversationResponse),
        (status = 404, description = "Conversation not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(conversation_id = %id))]
pub async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConversationResponse>, HttpAppError> {
    let conversation = state
        .chat
        .get_conversation(id)
        .await
        .map_err(HttpAppError::from)?
        .ok_or_else(|| HttpAppError(AppError::NotFound("Conversation not found".to_string())))?;

    Ok(Json(conversation))
}

#[utoipa::path(
    post,
    path = "/api/v0/conversations",
    tag = "conversations",
    request_body = CreateConversationRequest,
    responses(
        (status = 200, description = "Conversation created", body = Conversation),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn create_conversation(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CreateConversationRequest>,
) -> Result<Json<Conversation>, HttpAppError> {
    let conversation = state
        .chat
        .create_conversation(request.title)
        .await
        .map_err(HttpAppError::from)?;
    Ok(Json(conversation))
}

#[utoipa::path(
    delete,
    path = "/api/v0/conversations/{id}",
    tag = "conversations",
    params(
        ("id" = Uuid, Path, description = "Conversation ID")
    ),
    responses(
        (status = 204, description = "Conversation and its messages deleted"),
        (status = 404, description = "Conversation not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(conversation_id = %id))]
pub async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let deleted = state
        .chat
        .delete_conversation(id)
        .await
        .map_err(HttpAppError::from)?;

    if !deleted {
        return Err(HttpAppError(AppError::NotFound(
            "Conversation not found".to_string(),
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}
