//! In-process connection pair.
//!
//! [`pair`] returns two connected [`MemoryConnection`] ends. Each end speaks
//! the full frame vocabulary: pings are answered while the end is receiving,
//! pongs invoke the registered callback, close frames are echoed once and end
//! the receive with [`TransportError::Closed`]. Dropping or closing one end
//! looks like a lost connection to the other.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use wsgate_protocols::{
    CloseCode, Connection, Control, Deadline, Frame, PongCallback, TransportError,
};

/// What travels between the two ends.
#[derive(Debug)]
enum Wire {
    Data(Frame),
    Control(Control),
}

/// Create two connected ends.
pub fn pair() -> (MemoryConnection, MemoryConnection) {
    let (left_tx, left_rx) = mpsc::unbounded_channel();
    let (right_tx, right_rx) = mpsc::unbounded_channel();
    (
        MemoryConnection::new(left_tx, right_rx),
        MemoryConnection::new(right_tx, left_rx),
    )
}

/// One end of an in-process connection.
pub struct MemoryConnection {
    tx: Mutex<Option<mpsc::UnboundedSender<Wire>>>,
    rx: AsyncMutex<mpsc::UnboundedReceiver<Wire>>,
    read_deadline: Deadline,
    write_deadline: Deadline,
    pong: Mutex<Option<PongCallback>>,
    /// Set once a close frame went out; data sends fail afterwards.
    close_sent: AtomicBool,
    closed: CancellationToken,
}

impl MemoryConnection {
    fn new(tx: mpsc::UnboundedSender<Wire>, rx: mpsc::UnboundedReceiver<Wire>) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
            rx: AsyncMutex::new(rx),
            read_deadline: Deadline::new(),
            write_deadline: Deadline::new(),
            pong: Mutex::new(None),
            close_sent: AtomicBool::new(false),
            closed: CancellationToken::new(),
        }
    }

    /// Whether [`Connection::close`] has been called on this end.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    fn push(&self, wire: Wire, deadline: Option<Instant>) -> Result<(), TransportError> {
        if deadline.is_some_and(|at| at <= Instant::now()) {
            return Err(TransportError::Timeout);
        }
        let guard = self.tx.lock();
        let tx = guard.as_ref().ok_or(TransportError::ConnectionClosed)?;
        tx.send(wire)
            .map_err(|_| TransportError::Io("broken pipe".to_string()))
    }

    fn answer(&self, control: Control) {
        if let Err(err) = self.push(Wire::Control(control), None) {
            trace!(error = %err, "control answer dropped");
        }
    }

    fn handle_control(&self, control: Control) -> Option<TransportError> {
        match control {
            Control::Ping(data) => {
                self.answer(Control::Pong(data));
                None
            }
            Control::Pong(_) => {
                let callback = self.pong.lock().clone();
                if let Some(callback) = callback {
                    callback();
                }
                None
            }
            Control::Close { code, reason } => {
                if !self.close_sent.swap(true, Ordering::AcqRel) {
                    self.answer(Control::close(code));
                }
                Some(TransportError::Closed { code, reason })
            }
        }
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn recv(&self) -> Result<Frame, TransportError> {
        let mut rx = tokio::select! {
            biased;
            () = self.closed.cancelled() => return Err(TransportError::ConnectionClosed),
            rx = self.rx.lock() => rx,
        };

        loop {
            let next = tokio::select! {
                biased;
                () = self.closed.cancelled() => return Err(TransportError::ConnectionClosed),
                next = self.read_deadline.run(rx.recv()) => next?,
            };

            match next {
                Some(Wire::Data(frame)) => return Ok(frame),
                Some(Wire::Control(control)) => {
                    if let Some(err) = self.handle_control(control) {
                        return Err(err);
                    }
                }
                None => {
                    return Err(TransportError::Closed {
                        code: CloseCode::ABNORMAL,
                        reason: "unexpected EOF".to_string(),
                    });
                }
            }
        }
    }

    async fn send_data(&self, payload: String) -> Result<(), TransportError> {
        if self.close_sent.load(Ordering::Acquire) {
            return Err(TransportError::Protocol("close sent".to_string()));
        }
        self.push(Wire::Data(Frame::Text(payload)), self.write_deadline.get())
    }

    async fn send_control(&self, control: Control, deadline: Instant) -> Result<(), TransportError> {
        if matches!(control, Control::Close { .. }) && self.close_sent.swap(true, Ordering::AcqRel) {
            return Err(TransportError::Protocol("close sent".to_string()));
        }
        self.push(Wire::Control(control), Some(deadline))
    }

    fn set_read_deadline(&self, deadline: Option<Instant>) {
        self.read_deadline.set(deadline);
    }

    fn set_write_deadline(&self, deadline: Option<Instant>) {
        self.write_deadline.set(deadline);
    }

    fn on_pong(&self, callback: PongCallback) {
        *self.pong.lock() = Some(callback);
    }

    async fn close(&self) -> Result<(), TransportError> {
        let tx = self.tx.lock().take();
        self.closed.cancel();
        match tx {
            Some(_) => Ok(()),
            None => Err(TransportError::ConnectionClosed),
        }
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
