pub mod conversation;
pub mod file;

pub use conversation::{
    Attachment, AttachmentKind, Conversation, ConversationResponse, Message, MessageRole,
    SendMessageResponse,
};
pub use file::{FileContent, FileInfoResponse, FileUploadResult, StoredFile};
