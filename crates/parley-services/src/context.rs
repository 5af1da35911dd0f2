//! Context assembly for completion calls.
//!
//! Builds the ordered message list sent to the completion provider: system
//! prompt, optional extra context, a bounded window of prior messages with
//! their attachment content inlined, then the current user message. The
//! window always drops the oldest history first; the system prompt and the
//! current message are never dropped.

use parley_core::models::{Attachment, FileContent, Message};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::completion::ChatMessage;

/// Matches the conventional attachment URL shape and captures the file id.
fn file_reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"/api/v0/files/([0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})")
            .expect("file reference pattern is valid")
    })
}

/// Extract a stored-file id from an attachment URL, if the URL matches the
/// expected reference pattern.
pub fn attachment_file_id(url: &str) -> Option<Uuid> {
    let captures = file_reference_pattern().captures(url)?;
    Uuid::parse_str(&captures[1]).ok()
}

pub struct ContextAssembler {
    system_prompt: String,
    history_window: usize,
}

impl ContextAssembler {
    pub fn new(system_prompt: String, history_window: usize) -> Self {
        Self {
            system_prompt,
            history_window,
        }
    }

    pub fn history_window(&self) -> usize {
        self.history_window
    }

    /// All resolvable file ids referenced by the given attachment lists.
    /// Used to batch one content lookup for a whole prompt.
    pub fn referenced_file_ids<'a>(
        attachment_lists: impl IntoIterator<Item = &'a [Attachment]>,
    ) -> Vec<Uuid> {
        let mut ids = Vec::new();
        for attachments in attachment_lists {
            for attachment in attachments {
                if let Some(id) = attachment_file_id(&attachment.url) {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
            }
        }
        ids
    }

    /// Assemble the completion prompt. `contents` maps stored-file ids to
    /// their extracted content (resolved up front by the caller).
    pub fn build_messages(
        &self,
        current_message: &str,
        current_attachments: Option<&[Attachment]>,
        extra_context: Option<&str>,
        history: &[Message],
        contents: &HashMap<Uuid, FileContent>,
    ) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::new("system", self.system_prompt.clone())];

        if let Some(context) = extra_context {
            messages.push(ChatMessage::new(
                "system",
                format!("Additional context: {}", context),
            ));
        }

        let window_start = history.len().saturating_sub(self.history_window);
        for message in &history[window_start..] {
            let content = match message.attachments.as_deref() {
                Some(attachments) => {
                    with_attachment_content(&message.content, attachments, contents)
                }
                None => message.content.clone(),
            };
            messages.push(ChatMessage::new(message.role.completion_role(), content));
        }

        let current_content = match current_attachments {
            Some(attachments) => with_attachment_content(current_message, attachments, contents),
            None => current_message.to_string(),
        };
        messages.push(ChatMessage::new("user", current_content));

        messages
    }
}

/// Append resolved attachment content (or metadata-only summaries) to a
/// message's own text, separated by a blank line.
fn with_attachment_content(
    text: &str,
    attachments: &[Attachment],
    contents: &HashMap<Uuid, FileContent>,
) -> String {
    match attachments_block(attachments, contents) {
        Some(block) => format!("{}\n\n{}", text, block),
        None => text.to_string(),
    }
}

/// Per-attachment resolution: attachments whose URL resolves to known file
/// content render that content; everything else degrades to a one-line
/// summary instead of being dropped.
fn attachments_block(
    attachments: &[Attachment],
    contents: &HashMap<Uuid, FileContent>,
) -> Option<String> {
    let mut blocks = Vec::new();
    let mut summaries = Vec::new();

    for attachment in attachments {
        let resolved = attachment_file_id(&attachment.url).and_then(|id| contents.get(&id));
        match resolved {
            Some(content) => blocks.push(render_file_content(content)),
            None => summaries.push(summarize_attachment(attachment)),
        }
    }

    if !summaries.is_empty() {
        blocks.push(format!("Attachments:\n{}", summaries.join("\n")));
    }

    if blocks.is_empty() {
        None
    } else {
        Some(blocks.join("\n"))
    }
}

fn render_file_content(content: &FileContent) -> String {
    let header = format!(
        "--- Attachment: {} ({}) ---",
        content.filename, content.content_type
    );

    match content.extracted_text.as_deref() {
        Some(text) if content.content_type.starts_with("image/") => {
            format!(
                "{}\nThis is an image file. {}\nMetadata: {}\n",
                header,
                text,
                compact_metadata(&content.metadata)
            )
        }
        Some(text) => format!("{}\n{}\n", header, text),
        None => format!(
            "{}\nFile could not be processed for content extraction.\nMetadata: {}\n",
            header,
            compact_metadata(&content.metadata)
        ),
    }
}

/// Metadata rendered into the prompt, minus the inline base64 payload.
fn compact_metadata(metadata: &serde_json::Value) -> String {
    match metadata {
        serde_json::Value::Object(map) => {
            let mut compact = map.clone();
            compact.remove("base64_data");
            serde_json::Value::Object(compact).to_string()
        }
        other => other.to_string(),
    }
}

/// Metadata-only summary line for attachments that do not resolve to stored
/// file content.
fn summarize_attachment(attachment: &Attachment) -> String {
    let mut line = format!("- {} ({}", attachment.name, attachment.kind.as_str());
    if let Some(size) = attachment.size {
        line.push_str(&format!(", {} bytes", size));
    }
    line.push(')');

    if let Some(metadata) = &attachment.metadata {
        if let (Some(width), Some(height)) = (metadata.get("width"), metadata.get("height")) {
            line.push_str(&format!(" - Dimensions: {}x{}", width, height));
        }
        if let Some(words) = metadata.get("word_count").or_else(|| metadata.get("wordCount")) {
            line.push_str(&format!(" - Words: {}", words));
        }
    }

    line
}
