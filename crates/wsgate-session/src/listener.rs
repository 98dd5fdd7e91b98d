//! Session listener capability.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::session::Session;

/// Observer of session events.
///
/// Every method has a default, so implementors override only what they need.
/// Except for `on_connect`, invocations are fire-and-forget tasks: the
/// session does not wait for them, and several may run concurrently for the
/// same session.
#[async_trait]
pub trait SessionListener: Send + Sync + 'static {
    /// Called once, before the session's loops start.
    async fn on_connect(&self, _session: Arc<Session>) {}

    /// Called for each data frame, in arrival order of dispatch.
    async fn on_message(&self, _session: Arc<Session>, _payload: String) {}

    /// Called for each unexpected failure. `session` is `None` when the
    /// failure happened before a session existed.
    async fn on_error(&self, session: Option<Arc<Session>>, error: SessionError) {
        match session {
            Some(session) => warn!(session_id = %session.id(), error = %error, "session error"),
            None => debug!(error = %error, "upgrade rejected"),
        }
    }

    /// Called exactly once per session, when shutdown starts.
    async fn on_close(&self, _session: Arc<Session>) {}
}
