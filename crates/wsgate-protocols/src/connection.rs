//! Connection capability.
//!
//! A [`Connection`] is an already-negotiated duplex channel. Sessions own one
//! exclusively; nothing else reads or writes it once the session exists.
//!
//! Receives and sends may run concurrently from different tasks. Sends are not
//! required to be safe against each other; callers serialize them.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::TransportError;
use crate::frame::{Control, Frame};

/// Callback invoked whenever a pong frame arrives.
pub type PongCallback = Arc<dyn Fn() + Send + Sync>;

#[async_trait]
pub trait Connection: Send + Sync + 'static {
    /// Wait for the next data frame.
    ///
    /// Control frames are handled inside the transport: pings are answered,
    /// pongs invoke the registered [`PongCallback`], and a close frame ends the
    /// receive with [`TransportError::Closed`]. An expired read deadline yields
    /// [`TransportError::Timeout`].
    async fn recv(&self) -> Result<Frame, TransportError>;

    /// Send a text data frame, bounded by the current write deadline.
    async fn send_data(&self, payload: String) -> Result<(), TransportError>;

    /// Send a control frame, bounded by `deadline`.
    async fn send_control(&self, control: Control, deadline: Instant)
    -> Result<(), TransportError>;

    /// Move the read deadline. Applies to a receive already in progress.
    fn set_read_deadline(&self, deadline: Option<Instant>);

    /// Move the write deadline used by [`Connection::send_data`].
    fn set_write_deadline(&self, deadline: Option<Instant>);

    /// Register the pong callback, replacing any previous one.
    fn on_pong(&self, callback: PongCallback);

    /// Release the transport. Pending and later operations fail with
    /// [`TransportError::ConnectionClosed`].
    async fn close(&self) -> Result<(), TransportError>;
}
