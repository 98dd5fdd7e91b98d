//! Session timing derivation.

use std::time::Duration;

use wsgate_config::{DEFAULT_INTERVAL_MS, SessionConfig};

/// Default ping interval and write timeout.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(DEFAULT_INTERVAL_MS);

/// Fixed timing of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Ping cadence.
    pub ping_interval: Duration,
    /// Deadline applied to every outbound frame.
    pub write_timeout: Duration,
    /// Idle-peer timeout, reset on every received frame.
    pub read_timeout: Duration,
}

impl Timeouts {
    /// Fill unset (or zero) values.
    ///
    /// `ping_interval` and `write_timeout` each fall back to
    /// [`DEFAULT_INTERVAL`]; `read_timeout` falls back to
    /// [`Timeouts::liveness_window`] of the resolved pair.
    pub fn derive(
        ping_interval: Option<Duration>,
        write_timeout: Option<Duration>,
        read_timeout: Option<Duration>,
    ) -> Self {
        let ping_interval = or_default(ping_interval, DEFAULT_INTERVAL);
        let write_timeout = or_default(write_timeout, DEFAULT_INTERVAL);
        let read_timeout = or_default(
            read_timeout,
            Self::liveness_window(ping_interval, write_timeout),
        );
        Self {
            ping_interval,
            write_timeout,
            read_timeout,
        }
    }

    /// `ping_interval + 2 * write_timeout`: one ping period plus a write
    /// deadline for the ping and one for its answer.
    pub fn liveness_window(ping_interval: Duration, write_timeout: Duration) -> Duration {
        ping_interval + write_timeout * 2
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::derive(None, None, None)
    }
}

impl From<&SessionConfig> for Timeouts {
    fn from(config: &SessionConfig) -> Self {
        Self::derive(
            config.ping_interval(),
            config.write_timeout(),
            config.read_timeout(),
        )
    }
}

fn or_default(value: Option<Duration>, standard: Duration) -> Duration {
    value.filter(|d| !d.is_zero()).unwrap_or(standard)
}
