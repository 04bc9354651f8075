//! Thread-to-parent channel map learned from gateway events.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::domain::entities::{ChannelId, ChannelLink};

/// Shared cache of which channel each thread belongs to.
///
/// Top-level channels are recorded too (with no parent) so a lookup can
/// tell "known, no parent" apart from "never seen".
#[derive(Debug, Clone, Default)]
pub struct ChannelDirectory {
    parents: Arc<RwLock<HashMap<ChannelId, Option<ChannelId>>>>,
}

impl ChannelDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, link: ChannelLink) {
        self.parents.write().insert(link.channel_id, link.parent_id);
    }

    /// `Some(parent)` for a known channel, `None` if it was never recorded.
    #[must_use]
    pub fn lookup(&self, channel_id: ChannelId) -> Option<Option<ChannelId>> {
        self.parents.read().get(&channel_id).copied()
    }
}
