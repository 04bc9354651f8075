//! Domain entity definitions.

mod channel;
mod message;
mod raster;
mod token;

pub use channel::{ChannelId, ChannelLink, is_thread_kind};
pub use message::{Attachment, Message, MessageAuthor, MessageId};
pub use raster::{EncodedImage, ImageMetadata, OutputFormat, RasterImage, Region, SourceFormat};
pub use token::BotToken;
