//! OpenAPI documentation aggregation.

use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers::conversations::CreateConversationRequest;
use crate::handlers::messages::{
    SendMessageRequest, StartConversationRequest, StartConversationResponse,
};
use crate::handlers::upload::UploadResponse;
use parley_core::models::{
    Attachment, AttachmentKind, Conversation, ConversationResponse, FileInfoResponse,
    FileUploadResult, Message, MessageRole, SendMessageResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::upload::upload_files,
        crate::handlers::files::get_file_info,
        crate::handlers::files::delete_file,
        crate::handlers::conversations::list_conversations,
        crate::handlers::conversations::get_conversation,
        crate::handlers::conversations::create_conversation,
        crate::handlers::conversations::delete_conversation,
        crate::handlers::messages::send_message,
        crate::handlers::messages::start_conversation,
    ),
    components(schemas(
        UploadResponse,
        FileUploadResult,
        FileInfoResponse,
        Conversation,
        ConversationResponse,
        Message,
        MessageRole,
        Attachment,
        AttachmentKind,
        SendMessageRequest,
        SendMessageResponse,
        StartConversationRequest,
        StartConversationResponse,
        CreateConversationRequest,
        ErrorResponse,
    )),
    tags(
        (name = "files", description = "File upload, metadata, and deletion"),
        (name = "conversations", description = "Conversations, messages, and AI replies")
    )
)]
pub struct ApiDoc;
