//! Application services around the attachment pipeline.

mod attachment_coordinator;
mod channel_directory;
mod channel_filter;
mod event_router;

pub use attachment_coordinator::{
    Admission, AttachmentEventCoordinator, CoordinatorConfig, MessagePipeline,
};
pub use channel_directory::ChannelDirectory;
pub use channel_filter::ChannelFilter;
pub use event_router::EventRouter;
