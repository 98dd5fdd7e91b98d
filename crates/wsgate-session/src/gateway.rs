//! Gateway: upgrade result in, running session out.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use wsgate_config::SessionConfig;
use wsgate_protocols::Connection;

use crate::error::SessionError;
use crate::listener::SessionListener;
use crate::session::Session;
use crate::timeouts::Timeouts;

/// Caller-supplied timing. Unset values are derived, see [`Timeouts::derive`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayConfig {
    pub ping_interval: Option<Duration>,
    pub write_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
}

impl From<&SessionConfig> for GatewayConfig {
    fn from(config: &SessionConfig) -> Self {
        Self {
            ping_interval: config.ping_interval(),
            write_timeout: config.write_timeout(),
            read_timeout: config.read_timeout(),
        }
    }
}

/// Turns upgraded connections into running sessions wired to one listener.
pub struct Gateway {
    timeouts: Timeouts,
    listener: Arc<dyn SessionListener>,
}

impl Gateway {
    pub fn new(config: GatewayConfig, listener: Arc<dyn SessionListener>) -> Self {
        let timeouts = Timeouts::derive(
            config.ping_interval,
            config.write_timeout,
            config.read_timeout,
        );
        Self { timeouts, listener }
    }

    /// Timing applied to every session this gateway creates.
    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Handle the outcome of an upgrade attempt.
    ///
    /// On success the session is returned already started; on failure the
    /// listener hears about it with no session and `None` is returned.
    pub async fn handle<C: Connection>(
        &self,
        upgraded: Result<C, SessionError>,
    ) -> Option<Arc<Session>> {
        match upgraded {
            Ok(conn) => Some(self.accept(conn).await),
            Err(err) => {
                self.reject(err).await;
                None
            }
        }
    }

    /// Wrap `conn` in a session, announce it, then start its loops.
    ///
    /// `on_connect` is awaited before the loops start, so nothing can be
    /// received for the session before the listener has seen it.
    pub async fn accept<C: Connection>(&self, conn: C) -> Arc<Session> {
        let session = Session::new(conn, self.timeouts, self.listener.clone());
        debug!(session_id = %session.id(), "connection accepted");

        self.listener.on_connect(session.clone()).await;
        session.start();
        session
    }

    /// Report a failed upgrade. No session exists.
    pub async fn reject(&self, err: SessionError) {
        warn!(error = %err, "upgrade failed");
        self.listener.on_error(None, err).await;
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
