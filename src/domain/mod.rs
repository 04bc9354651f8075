//! Domain layer with core entities, decision services and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;
/// Border detection and transform decisions.
pub mod services;

pub use entities::{Attachment, BotToken, ChannelId, Message, MessageId};
pub use errors::{DiscordError, ProcessingError};
pub use ports::{AttachmentFetchPort, GatewayPort, ImageCodecPort, MessagingPort};
