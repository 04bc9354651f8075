mod attachment_port;
mod gateway_port;
mod image_codec_port;
mod messaging_port;

pub use attachment_port::AttachmentFetchPort;
pub use gateway_port::{GatewayEvent, GatewayPort};
pub use image_codec_port::ImageCodecPort;
pub use messaging_port::{MessagingPort, OutgoingFile};
