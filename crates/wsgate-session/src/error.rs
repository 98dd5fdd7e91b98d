//! Session errors.

use thiserror::Error;
use wsgate_protocols::TransportError;

/// Errors reported to [`crate::SessionListener::on_error`].
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// The inbound request could not be turned into a connection.
    #[error("upgrade failed: {0}")]
    Upgrade(String),

    /// The transport failed in a way other than an orderly close.
    #[error("connection closed unexpectedly: {0}")]
    UnexpectedClose(#[source] TransportError),
}

impl SessionError {
    /// Underlying transport error, if any.
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            SessionError::UnexpectedClose(err) => Some(err),
            SessionError::Upgrade(_) => None,
        }
    }
}
