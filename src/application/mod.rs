//! Application layer with services, use cases and DTOs.

/// Data transfer objects.
pub mod dto;
/// Coordination and routing services.
pub mod services;
/// Use case implementations.
pub mod use_cases;

pub use dto::ProcessedResult;
pub use services::{AttachmentEventCoordinator, ChannelFilter, EventRouter};
pub use use_cases::ProcessMessageUseCase;
