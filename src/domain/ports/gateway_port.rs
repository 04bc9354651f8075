use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::entities::{BotToken, ChannelLink, Message};
use crate::domain::errors::DiscordError;

#[derive(Debug, Clone)]
pub enum GatewayEvent {
    Ready {
        user_id: String,
        session_id: String,
    },
    Resumed,
    Reconnecting {
        attempt: u32,
    },
    Disconnected {
        reason: String,
        can_resume: bool,
    },
    MessageCreate {
        message: Message,
    },
    MessageUpdate {
        message: Message,
    },
    ChannelLinked {
        link: ChannelLink,
    },
    Error {
        message: String,
        recoverable: bool,
    },
}

impl GatewayEvent {
    #[must_use]
    pub const fn is_message_event(&self) -> bool {
        matches!(self, Self::MessageCreate { .. } | Self::MessageUpdate { .. })
    }

    #[must_use]
    pub const fn is_connection_event(&self) -> bool {
        matches!(
            self,
            Self::Ready { .. }
                | Self::Resumed
                | Self::Reconnecting { .. }
                | Self::Disconnected { .. }
        )
    }
}

#[async_trait]
pub trait GatewayPort: Send + Sync {
    /// Connects to the Discord Gateway.
    ///
    /// # Errors
    ///
    /// Returns `DiscordError` if the connection cannot be started.
    fn connect(
        &mut self,
        token: &BotToken,
    ) -> Result<mpsc::UnboundedReceiver<GatewayEvent>, DiscordError>;

    fn disconnect(&self);

    fn is_connected(&self) -> bool;
}
