//! Transport errors.

use thiserror::Error;

use crate::frame::CloseCode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The peer sent a close frame, or the stream ended.
    #[error("close {code}: {reason}")]
    Closed { code: CloseCode, reason: String },

    /// A read or write deadline expired.
    #[error("i/o timeout")]
    Timeout,

    /// The connection was closed locally.
    #[error("use of closed connection")]
    ConnectionClosed,

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl TransportError {
    /// Close code carried by a peer close, if any.
    pub fn close_code(&self) -> Option<CloseCode> {
        match self {
            TransportError::Closed { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether this is a peer close carrying one of `codes`.
    pub fn is_close_with(&self, codes: &[CloseCode]) -> bool {
        self.close_code().is_some_and(|code| codes.contains(&code))
    }
}
