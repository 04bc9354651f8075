use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::{error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use frametrim::application::services::{ChannelDirectory, MessagePipeline};
use frametrim::application::{
    AttachmentEventCoordinator, ChannelFilter, EventRouter, ProcessMessageUseCase,
};
use frametrim::domain::ports::GatewayPort;
use frametrim::domain::services::{BorderScanner, TransformDecider};
use frametrim::infrastructure::{
    BotConfig, CliArgs, DiscordClient, GatewayClient, HttpAttachmentFetcher, ImageRsCodec, health,
};

fn init_logging(config: &BotConfig) -> Result<()> {
    let default_level = LevelFilter::from_level(config.log_level.to_tracing_level());
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let stdout_layer = fmt::layer().with_target(true);

    if let Some(log_path) = &config.log_path {
        if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(stdout_layer)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stdout_layer)
            .init();
    }

    Ok(())
}

fn build_router(config: &BotConfig) -> Result<EventRouter> {
    let messaging = Arc::new(DiscordClient::new(&config.token)?);
    let fetcher = Arc::new(HttpAttachmentFetcher::new(config.fetch_timeout)?);
    let decider = Arc::new(TransformDecider::new(
        config.decider,
        BorderScanner::new(config.scan),
    ));

    let pipeline: Arc<dyn MessagePipeline> = Arc::new(ProcessMessageUseCase::new(
        fetcher,
        Arc::new(ImageRsCodec::new()),
        messaging.clone(),
        decider,
    ));
    let coordinator = Arc::new(AttachmentEventCoordinator::new(pipeline, config.coordinator));

    Ok(EventRouter::new(
        coordinator,
        messaging,
        ChannelFilter::new(config.target_channel),
        ChannelDirectory::new(),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let config = BotConfig::validate(CliArgs::parse()).wrap_err("invalid configuration")?;
    init_logging(&config)?;

    info!(
        version = frametrim::VERSION,
        target_channel = %config.target_channel,
        "Starting {}",
        frametrim::NAME
    );

    let port = config.port;
    tokio::spawn(async move {
        if let Err(e) = health::serve(port).await {
            error!(port, error = %e, "Liveness server stopped");
        }
    });

    let router = build_router(&config)?;

    let mut gateway = GatewayClient::with_default_config();
    let mut events = gateway.connect(&config.token)?;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    warn!("Gateway event stream closed");
                    break;
                };
                router.handle_event(event).await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    gateway.disconnect();
    info!("Stopped");
    Ok(())
}
