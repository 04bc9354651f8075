use crate::domain::entities::{ChannelLink, Message};
use crate::domain::ports::GatewayEvent;

/// Dispatch (op 0) events the bot understands.
#[derive(Debug, Clone)]
pub enum DispatchEvent {
    Ready {
        session_id: String,
        resume_gateway_url: Option<String>,
        user_id: String,
    },
    Resumed,
    MessageCreate {
        message: Message,
    },
    MessageUpdate {
        message: Message,
    },
    /// Channels and threads learned from `GUILD_CREATE`, channel or thread events.
    ChannelsDiscovered {
        links: Vec<ChannelLink>,
    },
    Unknown {
        event_type: String,
    },
}

impl DispatchEvent {
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "READY",
            Self::Resumed => "RESUMED",
            Self::MessageCreate { .. } => "MESSAGE_CREATE",
            Self::MessageUpdate { .. } => "MESSAGE_UPDATE",
            Self::ChannelsDiscovered { .. } => "CHANNELS",
            Self::Unknown { .. } => "UNKNOWN",
        }
    }

    /// Converts into the events published to the application layer.
    #[must_use]
    pub fn into_gateway_events(self) -> Vec<GatewayEvent> {
        match self {
            Self::Ready {
                session_id,
                user_id,
                ..
            } => vec![GatewayEvent::Ready {
                user_id,
                session_id,
            }],
            Self::Resumed => vec![GatewayEvent::Resumed],
            Self::MessageCreate { message } => vec![GatewayEvent::MessageCreate { message }],
            Self::MessageUpdate { message } => vec![GatewayEvent::MessageUpdate { message }],
            Self::ChannelsDiscovered { links } => links
                .into_iter()
                .map(|link| GatewayEvent::ChannelLinked { link })
                .collect(),
            Self::Unknown { .. } => Vec::new(),
        }
    }
}
