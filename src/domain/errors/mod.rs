//! Domain error types.

mod discord_error;
mod processing_error;

pub use discord_error::DiscordError;
pub use processing_error::ProcessingError;
