use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::FutureExt;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{error, info, warn};

use super::connection::{GatewayConnectionHandler, WebSocketConnection};
use super::constants::{
    GatewayIntents, MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY_BASE, RECONNECT_DELAY_MAX,
    RECONNECT_JITTER_MAX,
};
use super::error::GatewayError;
use super::heartbeat::random_below;
use super::state::SessionState;
use crate::domain::entities::BotToken;
use crate::domain::errors::DiscordError;
use crate::domain::ports::{GatewayEvent, GatewayPort};

pub struct GatewayClientConfig {
    pub intents: GatewayIntents,
    pub auto_reconnect: bool,
    pub max_reconnect_attempts: u32,
}

impl Default for GatewayClientConfig {
    fn default() -> Self {
        Self {
            intents: GatewayIntents::default_bot(),
            auto_reconnect: true,
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
        }
    }
}

impl GatewayClientConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_intents(mut self, intents: GatewayIntents) -> Self {
        self.intents = intents;
        self
    }

    #[must_use]
    pub const fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    #[must_use]
    pub const fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }
}

/// Bot gateway session with automatic resume and reconnect.
pub struct GatewayClient {
    config: GatewayClientConfig,
    running: Arc<AtomicBool>,
    shutdown: Option<watch::Sender<bool>>,
}

impl GatewayClient {
    #[must_use]
    pub fn new(config: GatewayClientConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            shutdown: None,
        }
    }

    #[must_use]
    pub fn with_default_config() -> Self {
        Self::new(GatewayClientConfig::default())
    }
}

#[async_trait]
impl GatewayPort for GatewayClient {
    fn connect(
        &mut self,
        token: &BotToken,
    ) -> Result<mpsc::UnboundedReceiver<GatewayEvent>, DiscordError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(DiscordError::gateway("gateway session already running"));
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.shutdown = Some(shutdown_tx);

        let config = GatewayLoopConfig {
            token: token.as_str().to_string(),
            intents: self.config.intents,
            auto_reconnect: self.config.auto_reconnect,
            max_attempts: self.config.max_reconnect_attempts,
        };
        let running = self.running.clone();
        running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            let result = std::panic::AssertUnwindSafe(run_gateway_loop(
                config,
                event_tx.clone(),
                running.clone(),
                shutdown_rx,
            ));

            if let Err(panic_info) = result.catch_unwind().await {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };

                error!(panic = %panic_msg, "Gateway task panicked");
                running.store(false, Ordering::SeqCst);
                let _ = event_tx.send(GatewayEvent::Error {
                    message: format!("Gateway task panicked: {panic_msg}"),
                    recoverable: false,
                });
            }
        });

        Ok(event_rx)
    }

    fn disconnect(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(shutdown) = &self.shutdown {
            let _ = shutdown.send(true);
        }
    }

    fn is_connected(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

struct GatewayLoopConfig {
    token: String,
    intents: GatewayIntents,
    auto_reconnect: bool,
    max_attempts: u32,
}

async fn run_gateway_loop(
    config: GatewayLoopConfig,
    event_tx: mpsc::UnboundedSender<GatewayEvent>,
    running: Arc<AtomicBool>,
    shutdown: watch::Receiver<bool>,
) {
    let mut attempts: u32 = 0;
    let mut session = SessionState::new();

    while running.load(Ordering::SeqCst) {
        let mut handler = GatewayConnectionHandler::new(
            Box::new(WebSocketConnection::new()),
            config.token.clone(),
            config.intents,
            session,
            event_tx.clone(),
            shutdown.clone(),
        );

        let error = match handler.connect().await {
            Ok(()) => {
                attempts = 0;
                match handler.run().await {
                    Ok(()) => GatewayError::closed(1000, "Connection ended"),
                    Err(e) => e,
                }
            }
            Err(e) => e,
        };
        session = handler.into_session();

        if matches!(error, GatewayError::ShuttingDown) || !running.load(Ordering::SeqCst) {
            break;
        }

        let can_resume = error.can_resume() && session.can_resume();
        if !can_resume {
            session.clear();
        }

        warn!(error = %error, can_resume, "Gateway connection lost");
        let _ = event_tx.send(GatewayEvent::Disconnected {
            reason: error.to_string(),
            can_resume,
        });

        if !error.should_reconnect() || !config.auto_reconnect {
            error!(error = %error, "Gateway will not reconnect");
            let _ = event_tx.send(GatewayEvent::Error {
                message: error.to_string(),
                recoverable: false,
            });
            break;
        }

        attempts += 1;
        if attempts > config.max_attempts {
            let limit = GatewayError::ReconnectionLimitExceeded {
                attempts: config.max_attempts,
            };
            error!(error = %limit, "Giving up on gateway");
            let _ = event_tx.send(GatewayEvent::Error {
                message: limit.to_string(),
                recoverable: false,
            });
            break;
        }

        let delay = calculate_backoff_delay(attempts - 1);
        info!(
            attempt = attempts,
            delay_ms = delay.as_millis(),
            "Reconnecting to gateway"
        );
        let _ = event_tx.send(GatewayEvent::Reconnecting { attempt: attempts });

        let mut shutdown = shutdown.clone();
        tokio::select! {
            () = sleep(delay) => {}
            _ = shutdown.wait_for(|stop| *stop) => break,
        }
    }

    running.store(false, Ordering::SeqCst);
    info!("Gateway loop terminated");
}

#[allow(clippy::cast_possible_truncation)]
fn calculate_backoff_delay(attempt: u32) -> Duration {
    let base_delay = RECONNECT_DELAY_BASE.as_millis() as u64;
    let max_delay = RECONNECT_DELAY_MAX.as_millis() as u64;
    let jitter_max = RECONNECT_JITTER_MAX.as_millis() as u64;

    let exponential_delay = base_delay.saturating_mul(2_u64.saturating_pow(attempt.min(6)));
    let capped_delay = exponential_delay.min(max_delay);

    Duration::from_millis(capped_delay.saturating_add(random_below(jitter_max)))
}
