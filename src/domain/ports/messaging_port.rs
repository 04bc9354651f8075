//! Outbound messaging port definition.

use async_trait::async_trait;

use crate::domain::entities::{ChannelId, Message, MessageId};
use crate::domain::errors::DiscordError;

/// A file uploaded alongside a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingFile {
    /// Name shown in the client.
    pub name: String,
    /// File contents.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`.
    pub content_type: String,
}

impl OutgoingFile {
    /// Creates a new outgoing file.
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes,
            content_type: content_type.into(),
        }
    }
}

/// Port for talking back to the chat platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Replies to `message` with text and attached files.
    async fn reply(
        &self,
        message: &Message,
        content: &str,
        files: Vec<OutgoingFile>,
    ) -> Result<(), DiscordError>;

    /// Posts a plain message into a channel.
    async fn send_channel_message(
        &self,
        channel_id: ChannelId,
        content: &str,
    ) -> Result<(), DiscordError>;

    /// Fetches the full current state of a message.
    async fn fetch_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<Message, DiscordError>;

    /// Looks up the parent of a thread; `None` for top-level channels.
    async fn fetch_channel_parent(
        &self,
        channel_id: ChannelId,
    ) -> Result<Option<ChannelId>, DiscordError>;
}
