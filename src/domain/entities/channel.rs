//! Discord channel identifiers and thread links.

use serde::{Deserialize, Serialize};

/// Unique identifier for a Discord channel or thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

impl ChannelId {
    /// Returns the underlying u64 value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChannelId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Discord channel types that carry a meaningful parent channel.
///
/// For every other type the `parent_id` is a category, which is not a
/// routing target.
const THREAD_KINDS: [u8; 3] = [10, 11, 12];

/// Returns true if the raw channel type denotes a thread.
#[must_use]
pub fn is_thread_kind(kind: u8) -> bool {
    THREAD_KINDS.contains(&kind)
}

/// Association between a channel and the channel it was spawned from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLink {
    /// The channel or thread.
    pub channel_id: ChannelId,
    /// Parent text channel for threads, `None` for top-level channels.
    pub parent_id: Option<ChannelId>,
}

impl ChannelLink {
    /// Builds a link from raw gateway/REST fields, ignoring category parents.
    #[must_use]
    pub fn from_raw(channel_id: ChannelId, kind: u8, parent_id: Option<ChannelId>) -> Self {
        Self {
            channel_id,
            parent_id: if is_thread_kind(kind) { parent_id } else { None },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_link_keeps_parent() {
        let link = ChannelLink::from_raw(ChannelId(2), 11, Some(ChannelId(1)));
        assert_eq!(link.parent_id, Some(ChannelId(1)));
    }

    #[test]
    fn test_text_channel_drops_category_parent() {
        let link = ChannelLink::from_raw(ChannelId(2), 0, Some(ChannelId(99)));
        assert!(link.parent_id.is_none());
    }
}
