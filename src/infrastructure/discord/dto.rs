use serde::{Deserialize, Serialize};

/// Discord API error response structure.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    /// Error message from Discord.
    pub message: String,
    /// Seconds to wait, present on 429 responses.
    pub retry_after: Option<f64>,
}

/// JSON part of a create-message request.
#[derive(Debug, Serialize)]
pub struct CreateMessageRequest<'a> {
    pub content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_reference: Option<MessageReferenceRequest>,
    pub allowed_mentions: AllowedMentions,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentSlot<'a>>,
}

#[derive(Debug, Serialize)]
pub struct MessageReferenceRequest {
    pub message_id: String,
    pub channel_id: String,
    pub fail_if_not_exists: bool,
}

/// Mentions disabled, including the ping on the replied-to author.
#[derive(Debug, Serialize, Default)]
pub struct AllowedMentions {
    pub parse: Vec<String>,
    pub replied_user: bool,
}

/// Declares the uploaded `files[n]` part with index `id`.
#[derive(Debug, Serialize)]
pub struct AttachmentSlot<'a> {
    pub id: usize,
    pub filename: &'a str,
}
