//! Validated bot configuration.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use super::args::CliArgs;
use crate::application::services::CoordinatorConfig;
use crate::domain::entities::{BotToken, ChannelId, Region};
use crate::domain::services::{CalibratedRegion, DeciderConfig, ScanConfig};

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Converts to tracing level.
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Start-up configuration problems.
#[derive(Debug, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ConfigError {
    #[error("DISCORD_TOKEN is not set")]
    MissingToken,

    #[error("DISCORD_TOKEN is not a usable bot token")]
    InvalidToken,

    #[error("TARGET_CHANNEL_ID is not set")]
    MissingTargetChannel,

    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            name,
            reason: reason.into(),
        }
    }
}

/// Fully validated runtime configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Bot credentials.
    pub token: BotToken,
    /// Watched channel.
    pub target_channel: ChannelId,
    /// Decision settings.
    pub decider: DeciderConfig,
    /// Border detection settings.
    pub scan: ScanConfig,
    /// Coordinator retention.
    pub coordinator: CoordinatorConfig,
    /// Liveness server port.
    pub port: u16,
    /// Attachment download timeout.
    pub fetch_timeout: Duration,
    /// Log verbosity.
    pub log_level: LogLevel,
    /// Optional log file.
    pub log_path: Option<PathBuf>,
}

impl BotConfig {
    /// Validates parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns the first problem found; the bot must not start with it.
    pub fn validate(args: CliArgs) -> Result<Self, ConfigError> {
        let raw_token = args
            .discord_token
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;
        let token = BotToken::new(raw_token).ok_or(ConfigError::InvalidToken)?;

        let target_channel = match args.target_channel_id {
            None => return Err(ConfigError::MissingTargetChannel),
            Some(0) => return Err(ConfigError::invalid("TARGET_CHANNEL_ID", "must be non-zero")),
            Some(id) => ChannelId(id),
        };

        if args.max_size == 0 {
            return Err(ConfigError::invalid("MAX_SIZE", "must be at least 1"));
        }
        if args.border_sample_stride == 0 {
            return Err(ConfigError::invalid("BORDER_SAMPLE_STRIDE", "must be at least 1"));
        }
        let coverage = args.border_coverage_threshold;
        if !(coverage > 0.0 && coverage <= 1.0) {
            return Err(ConfigError::invalid(
                "BORDER_COVERAGE_THRESHOLD",
                format!("{coverage} is outside (0, 1]"),
            ));
        }
        let history = NonZeroUsize::new(args.processed_history)
            .ok_or_else(|| ConfigError::invalid("PROCESSED_HISTORY", "must be at least 1"))?;
        if args.pending_ttl_secs == 0 {
            return Err(ConfigError::invalid("PENDING_TTL_SECS", "must be at least 1"));
        }
        if args.fetch_timeout_secs == 0 {
            return Err(ConfigError::invalid("FETCH_TIMEOUT_SECS", "must be at least 1"));
        }

        let template = if args.disable_template {
            None
        } else {
            let crop = Region::new(
                args.template_crop_left,
                args.template_crop_top,
                args.template_crop_width,
                args.template_crop_height,
            );
            if !crop.fits_within(args.template_width, args.template_height) {
                return Err(ConfigError::invalid(
                    "TEMPLATE_CROP_*",
                    format!(
                        "{crop} does not fit the {}x{} template",
                        args.template_width, args.template_height
                    ),
                ));
            }
            Some(CalibratedRegion {
                expected_width: args.template_width,
                expected_height: args.template_height,
                crop,
            })
        };

        Ok(Self {
            token,
            target_channel,
            decider: DeciderConfig {
                max_size: args.max_size,
                template,
            },
            scan: ScanConfig {
                brightness_threshold: args.border_brightness_threshold,
                sample_stride: args.border_sample_stride,
                coverage_threshold: coverage,
                min_border_thickness: args.border_min_thickness,
            },
            coordinator: CoordinatorConfig {
                pending_ttl: Duration::from_secs(args.pending_ttl_secs),
                history_capacity: history,
            },
            port: args.port,
            fetch_timeout: Duration::from_secs(args.fetch_timeout_secs),
            log_level: args.log_level,
            log_path: args.log_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use test_case::test_case;

    const TOKEN: &str = "MTIzNDU2Nzg5MDEyMzQ1Njc4OQ.GhIjKl.abcdefghijklmnopqrstuvwxyz0123456789";

    fn parse(extra: &[&str]) -> CliArgs {
        let mut argv = vec![
            "frametrim",
            "--discord-token",
            TOKEN,
            "--target-channel-id",
            "1234",
        ];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = BotConfig::validate(parse(&[])).unwrap();

        assert_eq!(config.target_channel, ChannelId(1234));
        assert_eq!(config.decider, DeciderConfig::default());
        assert_eq!(config.scan, ScanConfig::default());
        assert_eq!(config.coordinator, CoordinatorConfig::default());
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_missing_token_fails_fast() {
        let mut args = parse(&[]);
        args.discord_token = None;
        assert_eq!(BotConfig::validate(args).unwrap_err(), ConfigError::MissingToken);
    }

    #[test]
    fn test_missing_channel_fails_fast() {
        let mut args = parse(&[]);
        args.target_channel_id = None;
        assert_eq!(
            BotConfig::validate(args).unwrap_err(),
            ConfigError::MissingTargetChannel
        );
    }

    #[test_case(&["--max-size", "0"], "MAX_SIZE" ; "zero_max_size")]
    #[test_case(&["--border-sample-stride", "0"], "BORDER_SAMPLE_STRIDE" ; "zero_stride")]
    #[test_case(&["--border-coverage-threshold", "1.5"], "BORDER_COVERAGE_THRESHOLD" ; "coverage_above_one")]
    #[test_case(&["--border-coverage-threshold", "0"], "BORDER_COVERAGE_THRESHOLD" ; "coverage_zero")]
    #[test_case(&["--template-crop-width", "2000"], "TEMPLATE_CROP_*" ; "crop_outside_template")]
    #[test_case(&["--processed-history", "0"], "PROCESSED_HISTORY" ; "empty_history")]
    fn test_invalid_values(extra: &[&str], expected: &str) {
        match BotConfig::validate(parse(extra)) {
            Err(ConfigError::InvalidValue { name, .. }) => assert_eq!(name, expected),
            other => panic!("expected invalid {expected}, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_channel_is_rejected() {
        let mut args = parse(&[]);
        args.target_channel_id = Some(0);
        match BotConfig::validate(args) {
            Err(ConfigError::InvalidValue { name, .. }) => assert_eq!(name, "TARGET_CHANNEL_ID"),
            other => panic!("expected invalid TARGET_CHANNEL_ID, got {other:?}"),
        }
    }

    #[test]
    fn test_template_can_be_disabled() {
        let config = BotConfig::validate(parse(&["--disable-template"])).unwrap();
        assert!(config.decider.template.is_none());
    }

    #[test]
    fn test_log_level_flag() {
        let config = BotConfig::validate(parse(&["--log-level", "debug"])).unwrap();
        assert_eq!(config.log_level.to_tracing_level(), tracing::Level::DEBUG);
        assert_eq!(config.log_level.to_string(), "debug");
    }
}
