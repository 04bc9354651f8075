//! Turns gateway events into coordinator calls.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, error, info, trace, warn};

use super::attachment_coordinator::{Admission, AttachmentEventCoordinator};
use super::channel_directory::ChannelDirectory;
use super::channel_filter::ChannelFilter;
use crate::domain::entities::{ChannelId, ChannelLink, Message};
use crate::domain::errors::DiscordError;
use crate::domain::ports::{GatewayEvent, MessagingPort};

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Created,
    Updated,
}

/// Routes gateway events for the watched channel into the coordinator.
///
/// Events are handled in arrival order. Messages are filtered by channel
/// before any REST call; the lookups that remain (partial updates in the
/// watched channel, first sight of a thread) are bounded by a timeout. The
/// pipeline itself runs on its own task once admitted.
pub struct EventRouter {
    coordinator: Arc<AttachmentEventCoordinator>,
    messaging: Arc<dyn MessagingPort>,
    filter: ChannelFilter,
    directory: ChannelDirectory,
    self_user_id: RwLock<Option<String>>,
    lookup_timeout: Duration,
}

impl EventRouter {
    #[must_use]
    pub fn new(
        coordinator: Arc<AttachmentEventCoordinator>,
        messaging: Arc<dyn MessagingPort>,
        filter: ChannelFilter,
        directory: ChannelDirectory,
    ) -> Self {
        Self {
            coordinator,
            messaging,
            filter,
            directory,
            self_user_id: RwLock::new(None),
            lookup_timeout: LOOKUP_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Handles one gateway event. Returns the admission for message events.
    pub async fn handle_event(&self, event: GatewayEvent) -> Option<Admission> {
        match event {
            GatewayEvent::Ready {
                user_id,
                session_id,
            } => {
                info!(user_id = %user_id, session_id = %session_id, "Gateway ready");
                *self.self_user_id.write() = Some(user_id);
                None
            }
            GatewayEvent::Resumed => {
                info!("Gateway session resumed");
                None
            }
            GatewayEvent::Reconnecting { attempt } => {
                warn!(attempt, "Reconnecting to gateway");
                None
            }
            GatewayEvent::Disconnected { reason, can_resume } => {
                warn!(reason = %reason, can_resume, "Gateway disconnected");
                None
            }
            GatewayEvent::ChannelLinked { link } => {
                trace!(channel_id = %link.channel_id, parent_id = ?link.parent_id, "Channel recorded");
                self.directory.record(link);
                None
            }
            GatewayEvent::Error {
                message,
                recoverable,
            } => {
                error!(error = %message, recoverable, "Gateway error");
                None
            }
            GatewayEvent::MessageCreate { message } => {
                self.route_message(message, Delivery::Created).await
            }
            GatewayEvent::MessageUpdate { message } => {
                self.route_message(message, Delivery::Updated).await
            }
        }
    }

    async fn route_message(&self, message: Message, delivery: Delivery) -> Option<Admission> {
        if self.is_own_or_bot(&message) {
            trace!(message_id = %message.id(), "Ignoring bot message");
            return None;
        }

        let message = self.with_parent(message).await;
        if !self.filter.accepts(&message) {
            trace!(
                message_id = %message.id(),
                channel_id = %message.channel_id(),
                "Message outside watched channel"
            );
            return None;
        }

        let message = if message.is_partial() {
            if self.coordinator.is_finished(message.id()) {
                trace!(message_id = %message.id(), "Partial update for finished message");
                return None;
            }
            let full = self.complete_partial(message).await?;
            if self.is_own_or_bot(&full) {
                trace!(message_id = %full.id(), "Ignoring bot message");
                return None;
            }
            full
        } else {
            message
        };

        debug!(
            message_id = %message.id(),
            ?delivery,
            attachments = message.attachments().len(),
            "Routing message"
        );

        Some(match delivery {
            Delivery::Created => self.coordinator.spawn_observed(message),
            Delivery::Updated => self.coordinator.spawn_updated(message),
        })
    }

    async fn complete_partial(&self, partial: Message) -> Option<Message> {
        let fetched = self
            .bounded(self.messaging.fetch_message(partial.channel_id(), partial.id()))
            .await;

        match fetched {
            Ok(full) => {
                let parent = full.parent_channel_id().or(partial.parent_channel_id());
                Some(full.with_parent_channel_id(parent))
            }
            Err(e) => {
                warn!(
                    message_id = %partial.id(),
                    error = %e,
                    "Dropping update, full message unavailable"
                );
                None
            }
        }
    }

    fn is_own_or_bot(&self, message: &Message) -> bool {
        if message.is_from_bot() {
            return true;
        }
        let own = self.self_user_id.read();
        match (own.as_deref(), message.author()) {
            (Some(own), Some(author)) => author.id() == own,
            _ => false,
        }
    }

    async fn with_parent(&self, message: Message) -> Message {
        if message.parent_channel_id().is_some() || message.channel_id() == self.filter.target() {
            return message;
        }

        let parent = self.resolve_parent(message.channel_id()).await;
        message.with_parent_channel_id(parent)
    }

    async fn resolve_parent(&self, channel_id: ChannelId) -> Option<ChannelId> {
        if let Some(known) = self.directory.lookup(channel_id) {
            return known;
        }

        match self
            .bounded(self.messaging.fetch_channel_parent(channel_id))
            .await
        {
            Ok(parent_id) => {
                self.directory.record(ChannelLink {
                    channel_id,
                    parent_id,
                });
                parent_id
            }
            Err(e) => {
                debug!(channel_id = %channel_id, error = %e, "Channel lookup failed");
                // Channels the bot cannot read are never routed.
                if !e.is_recoverable() {
                    self.directory.record(ChannelLink {
                        channel_id,
                        parent_id: None,
                    });
                }
                None
            }
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, DiscordError>>,
    ) -> Result<T, DiscordError> {
        tokio::time::timeout(self.lookup_timeout, call)
            .await
            .unwrap_or_else(|_| Err(DiscordError::network("lookup timed out")))
    }
}
