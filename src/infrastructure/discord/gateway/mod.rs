mod client;
mod codec;
mod connection;
mod constants;
mod error;
mod events;
mod heartbeat;
mod payloads;
mod state;

pub use client::{GatewayClient, GatewayClientConfig};
pub use codec::{EventParser, GatewayCodec};
pub use connection::{GatewayConnection, GatewayConnectionHandler, WebSocketConnection};
pub use constants::{GatewayIntent, GatewayIntents, GatewayOpcode};
pub use error::{GatewayCloseCode, GatewayError, GatewayResult};
pub use events::DispatchEvent;
pub use payloads::{AttachmentPayload, AuthorPayload, ChannelPayload, MessagePayload};
pub use state::{ConnectionState, SessionState};
