use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use parley_core::models::{Attachment, Conversation, Message, MessageRole, SendMessageResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    /// Must be "user"; agent replies are generated, never submitted.
    pub role: String,
    pub content: String,
    pub attachments: Option<Vec<Attachment>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StartConversationRequest {
    pub content: String,
    pub attachments: Option<Vec<Attachment>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StartConversationResponse {
    pub conversation: Conversation,
    pub user_message: Message,
    pub agent_message: Message,
}

#[utoipa::path(
    post,
    path = "/api/v0/conversations/{id}/messages",
    tag = "conversations",
    params(
        ("id" = Uuid, Path, description = "Conversation ID")
    ),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Message persisted and agent reply generated", body = SendMessageResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Conversation not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(conversation_id = %id))]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, HttpAppError> {
    let role: MessageRole = request.role.parse().map_err(HttpAppError::from)?;

    let exchange = state
        .chat
        .send_message(id, role, &request.content, request.attachments)
        .await
        .map_err(HttpAppError::from)?;

    Ok(Json(exchange))
}

#[utoipa::path(
    post,
    path = "/api/v0/conversations/start",
    tag = "conversations",
    request_body = StartConversationRequest,
    responses(
        (status = 200, description = "Conversation created with first exchange and generated title", body = StartConversationResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn start_conversation(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<StartConversationRequest>,
) -> Result<Json<StartConversationResponse>, HttpAppError> {
    let (conversation, exchange) = state
        .chat
        .start_conversation(&request.content, request.attachments)
        .await
        .map_err(HttpAppError::from)?;

    Ok(Json(StartConversationResponse {
        conversation,
        user_message: exchange.user_message,
        agent_message: exchange.agent_message,
    }))
}
