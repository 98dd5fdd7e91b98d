//! Frame vocabulary.

use std::fmt;

use bytes::Bytes;

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;

/// A data frame received from the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 text payload.
    Text(String),
    /// Raw binary payload.
    Binary(Bytes),
}

impl Frame {
    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        match self {
            Frame::Text(text) => text.len(),
            Frame::Binary(data) => data.len(),
        }
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert the frame into text.
    ///
    /// Binary frames are accepted when they hold valid UTF-8.
    pub fn into_text(self) -> Option<String> {
        match self {
            Frame::Text(text) => Some(text),
            Frame::Binary(data) => String::from_utf8(data.to_vec()).ok(),
        }
    }
}

/// A control frame sent to the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    /// Liveness check.
    Ping(Bytes),
    /// Answer to a ping.
    Pong(Bytes),
    /// Close handshake.
    Close { code: CloseCode, reason: String },
}

impl Control {
    /// A close frame without a reason.
    pub fn close(code: CloseCode) -> Self {
        Control::Close {
            code,
            reason: String::new(),
        }
    }
}

/// Close handshake status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CloseCode(pub u16);

impl CloseCode {
    pub const NORMAL: CloseCode = CloseCode(1000);
    pub const GOING_AWAY: CloseCode = CloseCode(1001);
    pub const PROTOCOL: CloseCode = CloseCode(1002);
    pub const UNSUPPORTED: CloseCode = CloseCode(1003);
    /// No status received. Sent as a close frame with an empty body.
    pub const NO_STATUS: CloseCode = CloseCode(1005);
    /// Connection dropped without a close frame. Never carried in a close body.
    pub const ABNORMAL: CloseCode = CloseCode(1006);
    pub const INVALID_PAYLOAD: CloseCode = CloseCode(1007);
    pub const POLICY: CloseCode = CloseCode(1008);
    pub const TOO_BIG: CloseCode = CloseCode(1009);
    pub const INTERNAL: CloseCode = CloseCode(1011);

    /// Whether the code may be carried in a close frame body.
    pub fn is_sendable(self) -> bool {
        !matches!(self.0, 1005 | 1006 | 1015) && (1000..5000).contains(&self.0)
    }

    fn description(self) -> Option<&'static str> {
        match self.0 {
            1000 => Some("normal closure"),
            1001 => Some("going away"),
            1002 => Some("protocol error"),
            1003 => Some("unsupported data"),
            1005 => Some("no status"),
            1006 => Some("abnormal closure"),
            1007 => Some("invalid payload data"),
            1008 => Some("policy violation"),
            1009 => Some("message too big"),
            1011 => Some("internal server error"),
            _ => None,
        }
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.description() {
            Some(text) => write!(f, "{} ({})", self.0, text),
            None => write!(f, "{}", self.0),
        }
    }
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        CloseCode(code)
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.0
    }
}
