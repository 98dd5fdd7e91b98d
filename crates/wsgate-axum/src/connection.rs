//! [`Connection`] over an axum WebSocket.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use wsgate_protocols::{
    CloseCode, Connection, Control, Deadline, Frame, PongCallback, TransportError,
};

/// Upper bound on flushing the socket when it is released.
const RELEASE_TIMEOUT: Duration = Duration::from_secs(5);

/// A WebSocket accepted by axum, speaking the session frame vocabulary.
///
/// The socket is split so a pending receive never blocks a send. Pings from
/// the peer are answered by the WebSocket implementation itself.
pub struct AxumConnection {
    sink: AsyncMutex<SplitSink<WebSocket, Message>>,
    stream: AsyncMutex<SplitStream<WebSocket>>,
    read_deadline: Deadline,
    write_deadline: Deadline,
    pong: Mutex<Option<PongCallback>>,
    released: AtomicBool,
    closed: CancellationToken,
}

impl AxumConnection {
    pub fn new(socket: WebSocket) -> Self {
        let (sink, stream) = socket.split();
        Self {
            sink: AsyncMutex::new(sink),
            stream: AsyncMutex::new(stream),
            read_deadline: Deadline::new(),
            write_deadline: Deadline::new(),
            pong: Mutex::new(None),
            released: AtomicBool::new(false),
            closed: CancellationToken::new(),
        }
    }

    async fn send(&self, message: Message, deadline: &Deadline) -> Result<(), TransportError> {
        if self.closed.is_cancelled() {
            return Err(TransportError::ConnectionClosed);
        }

        let mut sink = tokio::select! {
            biased;
            () = self.closed.cancelled() => return Err(TransportError::ConnectionClosed),
            sink = self.sink.lock() => sink,
        };
        tokio::select! {
            biased;
            () = self.closed.cancelled() => Err(TransportError::ConnectionClosed),
            sent = deadline.run(sink.send(message)) => sent?.map_err(io_error),
        }
    }

    fn pong_received(&self) {
        let callback = self.pong.lock().clone();
        if let Some(callback) = callback {
            callback();
        }
    }
}

#[async_trait]
impl Connection for AxumConnection {
    async fn recv(&self) -> Result<Frame, TransportError> {
        let mut stream = tokio::select! {
            biased;
            () = self.closed.cancelled() => return Err(TransportError::ConnectionClosed),
            stream = self.stream.lock() => stream,
        };

        loop {
            let next = tokio::select! {
                biased;
                () = self.closed.cancelled() => return Err(TransportError::ConnectionClosed),
                next = self.read_deadline.run(stream.next()) => next?,
            };

            let message = match next {
                Some(Ok(message)) => message,
                Some(Err(err)) => return Err(io_error(err)),
                None => {
                    return Err(TransportError::Closed {
                        code: CloseCode::ABNORMAL,
                        reason: "unexpected EOF".to_string(),
                    });
                }
            };

            match message {
                Message::Text(text) => return Ok(Frame::Text(text.as_str().to_owned())),
                Message::Binary(data) => return Ok(Frame::Binary(data)),
                Message::Ping(_) => trace!("ping received"),
                Message::Pong(_) => self.pong_received(),
                Message::Close(frame) => return Err(peer_close(frame)),
            }
        }
    }

    async fn send_data(&self, payload: String) -> Result<(), TransportError> {
        self.send(Message::Text(payload.into()), &self.write_deadline)
            .await
    }

    async fn send_control(&self, control: Control, deadline: Instant) -> Result<(), TransportError> {
        let message = match control {
            Control::Ping(data) => Message::Ping(data),
            Control::Pong(data) => Message::Pong(data),
            Control::Close { code, reason } => Message::Close(close_frame(code, reason)),
        };
        let bound = Deadline::new();
        bound.set(Some(deadline));
        self.send(message, &bound).await
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
        if self.released.swap(true, Ordering::AcqRel) {
            return Err(TransportError::ConnectionClosed);
        }
        self.closed.cancel();

        let mut sink = self.sink.lock().await;
        match tokio::time::timeout(RELEASE_TIMEOUT, sink.close()).await {
            Ok(result) => result.map_err(io_error),
            Err(_) => Err(TransportError::Timeout),
        }
    }
}

/// Wire form of an outbound close. Codes that may not appear in a close
/// body (`NO_STATUS`, `ABNORMAL`, 1015) travel as an empty body.
fn close_frame(code: CloseCode, reason: String) -> Option<CloseFrame> {
    if !code.is_sendable() {
        return None;
    }
    Some(CloseFrame {
        code: code.0,
        reason: reason.into(),
    })
}

fn peer_close(frame: Option<CloseFrame>) -> TransportError {
    match frame {
        Some(frame) => TransportError::Closed {
            code: CloseCode(frame.code),
            reason: frame.reason.as_str().to_owned(),
        },
        None => TransportError::Closed {
            code: CloseCode::NO_STATUS,
            reason: String::new(),
        },
    }
}

fn io_error(err: axum::Error) -> TransportError {
    TransportError::Io(err.to_string())
}
