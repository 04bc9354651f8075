use std::time::{Duration, SystemTime};

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

use super::error::{GatewayError, GatewayResult};
use super::payloads::GatewayPayload;

/// Heartbeat bookkeeping for one connection.
///
/// The first beat is delayed by a random fraction of the interval. A beat
/// sent while the previous one is still unacknowledged means the link is
/// zombied and the connection must be dropped.
#[derive(Debug)]
pub struct Heartbeat {
    interval: Duration,
    awaiting_ack: bool,
    last_sent: Option<Instant>,
}

impl Heartbeat {
    #[must_use]
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms.max(1)),
            awaiting_ack: false,
            last_sent: None,
        }
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn first_delay(&self) -> Duration {
        let interval_ms = self.interval.as_millis() as u64;
        Duration::from_millis(random_below(interval_ms))
    }

    /// Ticker yielding at the jittered first delay, then every interval.
    #[must_use]
    pub fn ticker(&self) -> Interval {
        let mut ticker = interval_at(Instant::now() + self.first_delay(), self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    /// Scheduled beat.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::HeartbeatTimeout` if the previous beat was never acknowledged.
    pub fn beat(&mut self, sequence: Option<u64>) -> GatewayResult<GatewayPayload> {
        if self.awaiting_ack {
            return Err(GatewayError::HeartbeatTimeout);
        }
        Ok(self.beat_now(sequence))
    }

    /// Beat requested by the server (op 1); sent regardless of ack state.
    pub fn beat_now(&mut self, sequence: Option<u64>) -> GatewayPayload {
        self.awaiting_ack = true;
        self.last_sent = Some(Instant::now());
        GatewayPayload::heartbeat(sequence)
    }

    /// Records an op 11 and returns the round trip of the acknowledged beat.
    pub fn on_ack(&mut self) -> Option<Duration> {
        self.awaiting_ack = false;
        self.last_sent.take().map(|sent| sent.elapsed())
    }
}

/// Cheap jitter source; not suitable for anything but spreading timers.
pub(super) fn random_below(max: u64) -> u64 {
    if max == 0 {
        return 0;
    }

    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| u64::from(d.subsec_nanos()))
        .unwrap_or(0);

    nanos % max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_delay_within_interval() {
        let heartbeat = Heartbeat::new(41_250);
        for _ in 0..20 {
            assert!(heartbeat.first_delay() < heartbeat.interval);
        }
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let heartbeat = Heartbeat::new(0);
        assert_eq!(heartbeat.interval, Duration::from_millis(1));
    }

    #[test]
    fn test_missing_ack_times_out() {
        let mut heartbeat = Heartbeat::new(1_000);
        let payload = heartbeat.beat(Some(7)).unwrap();
        assert_eq!(payload.d, serde_json::json!(7));
        assert!(heartbeat.awaiting_ack);

        assert!(matches!(
            heartbeat.beat(Some(8)),
            Err(GatewayError::HeartbeatTimeout)
        ));
    }

    #[test]
    fn test_ack_allows_next_beat() {
        let mut heartbeat = Heartbeat::new(1_000);
        heartbeat.beat(None).unwrap();

        assert!(heartbeat.on_ack().is_some());
        assert!(heartbeat.on_ack().is_none());
        assert!(!heartbeat.awaiting_ack);
        assert!(heartbeat.beat(Some(1)).is_ok());
    }

    #[test]
    fn test_server_request_ignores_pending_ack() {
        let mut heartbeat = Heartbeat::new(1_000);
        heartbeat.beat(Some(1)).unwrap();

        let payload = heartbeat.beat_now(Some(2));
        assert_eq!(payload.op, 1);
        assert!(heartbeat.awaiting_ack);
    }

    #[test]
    fn test_random_below() {
        assert_eq!(random_below(0), 0);
        assert!(random_below(10) < 10);
    }
}
