//! Infrastructure layer with external service adapters.

/// Bot configuration.
pub mod config;
/// Discord gateway and REST clients.
pub mod discord;
/// Liveness HTTP server.
pub mod health;
/// Attachment download and image codecs.
pub mod image;

pub use config::{BotConfig, CliArgs, ConfigError, LogLevel};
pub use discord::{DiscordClient, GatewayClient, GatewayClientConfig, GatewayIntents};
pub use image::{HttpAttachmentFetcher, ImageRsCodec};
