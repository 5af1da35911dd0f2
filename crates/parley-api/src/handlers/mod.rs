pub mod conversations;
pub mod files;
pub mod messages;
pub mod upload;
