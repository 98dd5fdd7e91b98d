//! Transport error classification.

use wsgate_protocols::{CloseCode, TransportError};

use crate::error::SessionError;

/// Peer close codes treated as an orderly shutdown.
pub const EXPECTED_CLOSE_CODES: [CloseCode; 2] = [CloseCode::NORMAL, CloseCode::GOING_AWAY];

/// Decide whether a transport error is reported.
///
/// Returns `None` for expected closures: a peer close with one of
/// [`EXPECTED_CLOSE_CODES`], or any failure once the local side has started
/// shutting down (the transport is being torn down on purpose). Every other
/// error is wrapped as [`SessionError::UnexpectedClose`].
///
/// Shutdown is triggered by the caller in both cases.
pub fn classify(err: &TransportError, shutting_down: bool) -> Option<SessionError> {
    if shutting_down || is_expected(err) {
        return None;
    }
    Some(SessionError::UnexpectedClose(err.clone()))
}

fn is_expected(err: &TransportError) -> bool {
    matches!(err, TransportError::ConnectionClosed) || err.is_close_with(&EXPECTED_CLOSE_CODES)
}
