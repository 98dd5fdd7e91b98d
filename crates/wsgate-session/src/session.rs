//! Session supervisor.
//!
//! A [`Session`] owns one [`Connection`] and keeps it alive:
//!
//! - the **read loop** receives frames, hands payloads to the listener and
//!   pushes the read deadline forward on every frame (data or pong);
//! - the **ping loop** sends a ping every `ping_interval` until shutdown;
//! - [`Session::write`] sends data frames for external callers.
//!
//! All sends are serialized by a write guard. Any transport error, from any
//! of the three, is classified and then triggers shutdown. Shutdown runs at
//! most once: it dispatches `on_close`, stops the ping loop, attempts a close
//! handshake and releases the connection. The read loop ends when the
//! released connection fails its pending receive.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use bytes::Bytes;
use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use wsgate_protocols::{CloseCode, Connection, Control, Frame, TransportError};

use crate::classify::classify;
use crate::listener::SessionListener;
use crate::timeouts::Timeouts;

/// Session identifier.
pub type SessionId = String;

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    ShuttingDown,
    /// Terminal.
    Closed,
}

/// One managed duplex connection.
pub struct Session {
    id: SessionId,
    conn: Box<dyn Connection>,
    timeouts: Timeouts,
    listener: Arc<dyn SessionListener>,
    /// Serializes every frame send.
    write_guard: Mutex<()>,
    started: AtomicBool,
    /// Set by the first shutdown trigger.
    shutdown_started: AtomicBool,
    /// Fired when shutdown starts; stops the ping loop.
    done: CancellationToken,
    /// Fired when shutdown has finished.
    closed: CancellationToken,
    this: Weak<Session>,
}

impl Session {
    /// Create a session over `conn`. Loops do not run until [`Session::start`].
    pub fn new(
        conn: impl Connection,
        timeouts: Timeouts,
        listener: Arc<dyn SessionListener>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            id: Uuid::new_v4().to_string(),
            conn: Box::new(conn),
            timeouts,
            listener,
            write_guard: Mutex::new(()),
            started: AtomicBool::new(false),
            shutdown_started: AtomicBool::new(false),
            done: CancellationToken::new(),
            closed: CancellationToken::new(),
            this: this.clone(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    pub fn state(&self) -> SessionState {
        if self.closed.is_cancelled() {
            SessionState::Closed
        } else if self.shutdown_started.load(Ordering::Acquire) {
            SessionState::ShuttingDown
        } else {
            SessionState::Active
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Resolves once shutdown has finished.
    pub async fn closed(&self) {
        self.closed.cancelled().await;
    }

    /// Spawn the ping and read loops. Later calls are ignored.
    pub fn start(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::AcqRel) {
            warn!(session_id = %self.id, "session already started");
            return;
        }

        let span = info_span!("session", id = %self.id);
        info!(
            parent: &span,
            ping_interval = ?self.timeouts.ping_interval,
            write_timeout = ?self.timeouts.write_timeout,
            read_timeout = ?self.timeouts.read_timeout,
            "session started"
        );
        tokio::spawn(self.clone().ping_loop().instrument(span.clone()));
        tokio::spawn(self.clone().read_loop().instrument(span));
    }

    /// Send a text data frame.
    ///
    /// The error, if any, is returned to the caller and also goes through the
    /// shared classification path (which may notify the listener and starts
    /// shutdown). Once shutdown has begun nothing is sent and
    /// [`TransportError::ConnectionClosed`] is returned.
    pub async fn write(&self, payload: impl Into<String>) -> Result<(), TransportError> {
        let result = {
            let _guard = self.write_guard.lock().await;
            if self.shutdown_started.load(Ordering::Acquire) {
                Err(TransportError::ConnectionClosed)
            } else {
                self.conn.set_write_deadline(Some(self.write_deadline()));
                self.conn.send_data(payload.into()).await
            }
        };

        if let Err(err) = &result {
            self.handle_error(err);
        }
        result
    }

    /// Close with [`CloseCode::NO_STATUS`].
    pub async fn close(&self) {
        self.close_with(CloseCode::NO_STATUS).await;
    }

    /// Shut the session down, telling the peer `code`.
    ///
    /// Only the first call runs the shutdown sequence; every call, first or
    /// not, returns once that sequence has finished.
    pub async fn close_with(&self, code: CloseCode) {
        let _ = self.begin_shutdown(code);
        self.closed.cancelled().await;
    }

    /// Start shutdown without waiting for it. Returns `false` if an earlier
    /// trigger already started it.
    fn begin_shutdown(&self, code: CloseCode) -> bool {
        if self.shutdown_started.swap(true, Ordering::AcqRel) {
            return false;
        }
        match self.this.upgrade() {
            Some(session) => {
                tokio::spawn(async move { session.shutdown(code).await }.in_current_span());
            }
            None => self.closed.cancel(),
        }
        true
    }

    async fn shutdown(self: Arc<Self>, code: CloseCode) {
        info!(session_id = %self.id, code = %code, "closing session");

        let listener = self.listener.clone();
        let session = self.clone();
        tokio::spawn(async move { listener.on_close(session).await }.in_current_span());

        self.done.cancel();

        let handshake = {
            let _guard = self.write_guard.lock().await;
            self.conn
                .send_control(Control::close(code), self.write_deadline())
                .await
        };
        if let Err(err) = &handshake {
            self.handle_error(err);
        }

        if let Err(err) = self.conn.close().await {
            debug!(error = %err, "connection close failed");
        }
        self.closed.cancel();
        debug!(session_id = %self.id, "session closed");
    }

    /// Start shutdown and report `err` if it is unexpected.
    ///
    /// Only the error that starts shutdown can be reported; anything after
    /// that is fallout from the teardown.
    fn handle_error(&self, err: &TransportError) {
        let triggered = self.begin_shutdown(CloseCode::NO_STATUS);
        match classify(err, !triggered) {
            Some(error) => {
                warn!(session_id = %self.id, error = %error, "unexpected transport error");
                if let Some(session) = self.this.upgrade() {
                    let listener = self.listener.clone();
                    tokio::spawn(
                        async move { listener.on_error(Some(session), error).await }
                            .in_current_span(),
                    );
                }
            }
            None => debug!(session_id = %self.id, error = %err, "transport closed"),
        }
    }

    fn write_deadline(&self) -> Instant {
        Instant::now() + self.timeouts.write_timeout
    }

    fn extend_read_deadline(&self) {
        self.conn
            .set_read_deadline(Some(Instant::now() + self.timeouts.read_timeout));
    }

    async fn ping_loop(self: Arc<Self>) {
        let period = self.timeouts.ping_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = self.done.cancelled() => break,
                _ = ticker.tick() => {
                    let sent = {
                        let _guard = self.write_guard.lock().await;
                        self.conn
                            .send_control(Control::Ping(Bytes::new()), self.write_deadline())
                            .await
                    };
                    if let Err(err) = sent {
                        self.handle_error(&err);
                    }
                }
            }
        }

        self.close().await;
    }

    async fn read_loop(self: Arc<Self>) {
        let this = self.this.clone();
        self.conn.on_pong(Arc::new(move || {
            if let Some(session) = this.upgrade() {
                session.extend_read_deadline();
            }
        }));
        self.extend_read_deadline();

        loop {
            match self.conn.recv().await {
                Ok(frame) => {
                    self.extend_read_deadline();
                    self.dispatch(frame);
                }
                Err(err) => {
                    self.handle_error(&err);
                    break;
                }
            }
        }

        self.close().await;
    }

    fn dispatch(self: &Arc<Self>, frame: Frame) {
        let len = frame.len();
        let Some(payload) = frame.into_text() else {
            debug!(session_id = %self.id, len, "dropping non-UTF-8 binary frame");
            return;
        };
        debug!(session_id = %self.id, len, "frame received");

        let listener = self.listener.clone();
        let session = self.clone();
        tokio::spawn(async move { listener.on_message(session, payload).await }.in_current_span());
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
