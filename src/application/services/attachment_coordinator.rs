//! Exactly-once coordination of the create/update event pair per message.
//!
//! Discord may announce a message before its attachments are attached and
//! deliver them later through an edit. Each message id moves through
//! `Unseen -> Pending -> Done`; the claim that moves an id to `Done` happens
//! under one lock, so only a single caller ever gets [`Admission::Run`].

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::domain::entities::{Message, MessageId};

/// Work performed once per message.
#[async_trait]
pub trait MessagePipeline: Send + Sync {
    /// Processes every attachment of `message`.
    async fn run(&self, message: Message);
}

/// Outcome of offering an event to the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The caller now owns the single pipeline run for this id.
    Run,
    /// Registered as pending until an update arrives.
    Wait,
    /// Already handled, pending, or nothing to do.
    Ignore,
}

/// Retention limits for the coordinator's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// How long a pending waiter stays eligible.
    pub pending_ttl: Duration,
    /// How many finished ids are remembered.
    pub history_capacity: NonZeroUsize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            pending_ttl: Duration::from_secs(900),
            history_capacity: NonZeroUsize::new(1024).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

struct Registry {
    pending: HashMap<MessageId, Instant>,
    finished: LruCache<MessageId, ()>,
}

impl Registry {
    fn prune_expired(&mut self, now: Instant, ttl: Duration) {
        self.pending
            .retain(|_, registered| now.duration_since(*registered) < ttl);
    }

    fn finish(&mut self, id: MessageId) {
        self.pending.remove(&id);
        self.finished.put(id, ());
    }
}

/// Per-message state machine in front of a [`MessagePipeline`].
pub struct AttachmentEventCoordinator {
    registry: Mutex<Registry>,
    pipeline: Arc<dyn MessagePipeline>,
    config: CoordinatorConfig,
}

impl AttachmentEventCoordinator {
    /// Creates a coordinator that feeds admitted messages into `pipeline`.
    #[must_use]
    pub fn new(pipeline: Arc<dyn MessagePipeline>, config: CoordinatorConfig) -> Self {
        Self {
            registry: Mutex::new(Registry {
                pending: HashMap::new(),
                finished: LruCache::new(config.history_capacity),
            }),
            pipeline,
            config,
        }
    }

    /// Claims a newly created message.
    ///
    /// Messages that already carry attachments go straight to `Done`; the
    /// rest wait for an update.
    pub fn admit_observed(&self, message: &Message) -> Admission {
        self.admit_observed_at(message, Instant::now())
    }

    /// Claims an edited message.
    ///
    /// A pending id is finalized on its first update whatever the update
    /// carries. An id with no record runs only if the update has attachments.
    pub fn admit_updated(&self, message: &Message) -> Admission {
        self.admit_updated_at(message, Instant::now())
    }

    /// Handles a create event, running the pipeline if admitted.
    pub async fn on_message_observed(&self, message: Message) -> Admission {
        let admission = self.admit_observed(&message);
        self.dispatch(admission, message).await;
        admission
    }

    /// Handles an update event, running the pipeline if admitted.
    pub async fn on_message_updated(&self, message: Message) -> Admission {
        let admission = self.admit_updated(&message);
        self.dispatch(admission, message).await;
        admission
    }

    /// Admits a create event now and runs the pipeline on a separate task.
    ///
    /// Admission happens before this returns, so callers feeding events in
    /// arrival order keep the per-id state machine in that order.
    pub fn spawn_observed(&self, message: Message) -> Admission {
        let admission = self.admit_observed(&message);
        self.spawn_run(admission, message);
        admission
    }

    /// Admits an update event now and runs the pipeline on a separate task.
    pub fn spawn_updated(&self, message: Message) -> Admission {
        let admission = self.admit_updated(&message);
        self.spawn_run(admission, message);
        admission
    }

    /// Number of ids currently waiting for an update.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.registry.lock().pending.len()
    }

    /// Whether `id` has already been handed to the pipeline.
    #[must_use]
    pub fn is_finished(&self, id: MessageId) -> bool {
        self.registry.lock().finished.contains(&id)
    }

    async fn dispatch(&self, admission: Admission, message: Message) {
        match admission {
            Admission::Run => {
                debug!(message_id = %message.id(), "Running pipeline");
                self.pipeline.run(message).await;
            }
            Admission::Wait => {
                debug!(message_id = %message.id(), "Waiting for attachments");
            }
            Admission::Ignore => {
                trace!(message_id = %message.id(), "Event ignored");
            }
        }
    }

    fn spawn_run(&self, admission: Admission, message: Message) {
        if admission != Admission::Run {
            trace!(message_id = %message.id(), ?admission, "Nothing to spawn");
            return;
        }

        let pipeline = Arc::clone(&self.pipeline);
        tokio::spawn(async move {
            debug!(message_id = %message.id(), "Running pipeline");
            pipeline.run(message).await;
        });
    }

    fn admit_observed_at(&self, message: &Message, now: Instant) -> Admission {
        let id = message.id();
        let mut registry = self.registry.lock();
        registry.prune_expired(now, self.config.pending_ttl);

        if registry.finished.contains(&id) || registry.pending.contains_key(&id) {
            return Admission::Ignore;
        }

        if message.has_attachments() {
            registry.finish(id);
            Admission::Run
        } else {
            registry.pending.insert(id, now);
            Admission::Wait
        }
    }

    fn admit_updated_at(&self, message: &Message, now: Instant) -> Admission {
        let id = message.id();
        let mut registry = self.registry.lock();

        if let Some(registered) = registry.pending.remove(&id) {
            if now.duration_since(registered) < self.config.pending_ttl {
                registry.finish(id);
                return Admission::Run;
            }
            trace!(message_id = %id, "Pending entry expired");
        }

        if registry.finished.contains(&id) {
            return Admission::Ignore;
        }

        if message.has_attachments() {
            registry.finish(id);
            Admission::Run
        } else {
            Admission::Ignore
        }
    }
}
