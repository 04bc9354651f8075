//! Discord API client.

mod client;
mod dto;
pub mod gateway;

pub use client::DiscordClient;
pub use gateway::{GatewayClient, GatewayClientConfig, GatewayIntents};
