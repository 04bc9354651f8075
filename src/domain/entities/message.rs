use serde::{Deserialize, Serialize};

use super::ChannelId;

/// Unique identifier for a Discord message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl MessageId {
    /// Returns the underlying u64 value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MessageId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Discord message attachment descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Attachment {
    id: String,
    filename: String,
    size: u64,
    url: String,
    content_type: Option<String>,
}

#[allow(missing_docs)]
impl Attachment {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        filename: impl Into<String>,
        size: u64,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            filename: filename.into(),
            size,
            url: url.into(),
            content_type: None,
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns true if the declared content type is an image type.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_ref()
            .is_some_and(|ct| ct.starts_with("image/"))
    }
}

/// Author of a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct MessageAuthor {
    id: String,
    username: String,
    bot: bool,
}

#[allow(missing_docs)]
impl MessageAuthor {
    #[must_use]
    pub fn new(id: impl Into<String>, username: impl Into<String>, bot: bool) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            bot,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub const fn is_bot(&self) -> bool {
        self.bot
    }
}

/// An inbound message as seen by the bot.
///
/// A message is `partial` when the delivering event omitted fields (the
/// attachment list in particular) and the full message must be fetched
/// before it can be trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    channel_id: ChannelId,
    parent_channel_id: Option<ChannelId>,
    author: Option<MessageAuthor>,
    content: String,
    attachments: Vec<Attachment>,
    partial: bool,
}

impl Message {
    /// Creates a complete message without attachments.
    #[must_use]
    pub fn new(id: impl Into<MessageId>, channel_id: impl Into<ChannelId>) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            parent_channel_id: None,
            author: None,
            content: String::new(),
            attachments: Vec::new(),
            partial: false,
        }
    }

    /// Sets the author.
    #[must_use]
    pub fn with_author(mut self, author: MessageAuthor) -> Self {
        self.author = Some(author);
        self
    }

    /// Sets the text content.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Sets the attachment descriptors.
    #[must_use]
    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Sets the parent channel (for messages posted inside threads).
    #[must_use]
    pub const fn with_parent_channel_id(mut self, parent: Option<ChannelId>) -> Self {
        self.parent_channel_id = parent;
        self
    }

    /// Marks the message as partial.
    #[must_use]
    pub const fn with_partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        self
    }

    /// Returns the message ID.
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the channel the message was posted in.
    #[must_use]
    pub const fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    /// Returns the parent channel when the message lives in a thread.
    #[must_use]
    pub const fn parent_channel_id(&self) -> Option<ChannelId> {
        self.parent_channel_id
    }

    /// Returns the author, if the event carried one.
    #[must_use]
    pub const fn author(&self) -> Option<&MessageAuthor> {
        self.author.as_ref()
    }

    /// Returns the text content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the attachment descriptors.
    #[must_use]
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Returns true if at least one attachment is present.
    #[must_use]
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }

    /// Returns true if some fields require an explicit fetch before use.
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        self.partial
    }

    /// Returns true if the message was written by a bot account.
    #[must_use]
    pub fn is_from_bot(&self) -> bool {
        self.author.as_ref().is_some_and(MessageAuthor::is_bot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_is_image() {
        let png = Attachment::new("1", "a.png", 10, "https://x/a.png").with_content_type("image/png");
        let txt = Attachment::new("2", "a.txt", 10, "https://x/a.txt").with_content_type("text/plain");
        let unknown = Attachment::new("3", "a.bin", 10, "https://x/a.bin");

        assert!(png.is_image());
        assert!(!txt.is_image());
        assert!(!unknown.is_image());
    }

    #[test]
    fn test_message_builder() {
        let message = Message::new(5, 7)
            .with_author(MessageAuthor::new("9", "someone", false))
            .with_attachments(vec![Attachment::new("1", "a.png", 1, "u")])
            .with_parent_channel_id(Some(ChannelId(3)));

        assert_eq!(message.id(), MessageId(5));
        assert_eq!(message.channel_id(), ChannelId(7));
        assert_eq!(message.parent_channel_id(), Some(ChannelId(3)));
        assert!(message.has_attachments());
        assert!(!message.is_partial());
        assert!(!message.is_from_bot());
    }
}
