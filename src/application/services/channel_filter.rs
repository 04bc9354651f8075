//! Decides whether a message belongs to the watched channel.

use crate::domain::entities::{ChannelId, Message};

/// Routing rule for a single watched channel and its threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelFilter {
    target: ChannelId,
}

impl ChannelFilter {
    #[must_use]
    pub const fn new(target: ChannelId) -> Self {
        Self { target }
    }

    #[must_use]
    pub const fn target(&self) -> ChannelId {
        self.target
    }

    /// True if the message was posted in the target or in one of its threads.
    #[must_use]
    pub fn accepts(&self, message: &Message) -> bool {
        message.channel_id() == self.target || message.parent_channel_id() == Some(self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(100, None, true ; "target_channel")]
    #[test_case(555, Some(100), true ; "thread_of_target")]
    #[test_case(555, Some(200), false ; "thread_elsewhere")]
    #[test_case(200, None, false ; "other_channel")]
    fn test_accepts(channel: u64, parent: Option<u64>, expected: bool) {
        let filter = ChannelFilter::new(ChannelId(100));
        let message = Message::new(1_u64, channel).with_parent_channel_id(parent.map(ChannelId));

        assert_eq!(filter.accepts(&message), expected);
    }
}
