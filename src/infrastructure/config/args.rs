use super::app_config::LogLevel;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "frametrim",
    version,
    about = "Discord bot that trims frames off posted screenshots and downsizes large images",
    long_about = None
)]
pub struct CliArgs {
    /// Bot token.
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
    pub discord_token: Option<String>,

    /// Channel to watch, threads included.
    #[arg(long, env = "TARGET_CHANNEL_ID")]
    pub target_channel_id: Option<u64>,

    /// Longest side allowed before an image is downscaled.
    #[arg(long, env = "MAX_SIZE", default_value_t = 2048)]
    pub max_size: u32,

    /// Width of the calibrated screenshot layout.
    #[arg(long, env = "TEMPLATE_WIDTH", default_value_t = 2048)]
    pub template_width: u32,

    /// Height of the calibrated screenshot layout.
    #[arg(long, env = "TEMPLATE_HEIGHT", default_value_t = 1440)]
    pub template_height: u32,

    #[arg(long, env = "TEMPLATE_CROP_LEFT", default_value_t = 64)]
    pub template_crop_left: u32,

    #[arg(long, env = "TEMPLATE_CROP_TOP", default_value_t = 69)]
    pub template_crop_top: u32,

    #[arg(long, env = "TEMPLATE_CROP_WIDTH", default_value_t = 1920)]
    pub template_crop_width: u32,

    #[arg(long, env = "TEMPLATE_CROP_HEIGHT", default_value_t = 1080)]
    pub template_crop_height: u32,

    /// Disable the calibrated layout entirely.
    #[arg(long, env = "DISABLE_TEMPLATE", default_value_t = false)]
    pub disable_template: bool,

    /// Minimum RGB value of a border pixel.
    #[arg(long, env = "BORDER_BRIGHTNESS_THRESHOLD", default_value_t = 245)]
    pub border_brightness_threshold: u8,

    /// Sampling distance along a scan line.
    #[arg(long, env = "BORDER_SAMPLE_STRIDE", default_value_t = 10)]
    pub border_sample_stride: u32,

    /// Share of non-border samples that marks the content edge.
    #[arg(long, env = "BORDER_COVERAGE_THRESHOLD", default_value_t = 0.95)]
    pub border_coverage_threshold: f64,

    /// Thinnest border that triggers a crop.
    #[arg(long, env = "BORDER_MIN_THICKNESS", default_value_t = 6)]
    pub border_min_thickness: u32,

    /// Port of the liveness endpoint.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Seconds a message without attachments waits for its update.
    #[arg(long, env = "PENDING_TTL_SECS", default_value_t = 900)]
    pub pending_ttl_secs: u64,

    /// Number of processed message ids remembered.
    #[arg(long, env = "PROCESSED_HISTORY", default_value_t = 1024)]
    pub processed_history: usize,

    /// Attachment download timeout in seconds.
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 30)]
    pub fetch_timeout_secs: u64,

    /// Log file path.
    #[arg(long, env = "LOG_PATH", value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, env = "LOG_LEVEL", value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}
