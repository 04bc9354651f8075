//! Configuration from command line and environment.

mod app_config;
mod args;

pub use app_config::{BotConfig, ConfigError, LogLevel};
pub use args::CliArgs;
