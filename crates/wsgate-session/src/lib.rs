//! # wsgate Session
//!
//! Session supervision for duplex message connections.
//!
//! ## Core Types
//!
//! - [`Session`] - Owns one connection, runs its ping and read loops, serializes writes
//! - [`Gateway`] - Turns an upgrade result into a running session
//! - [`SessionListener`] - Observer hooks (connect, message, error, close)
//! - [`Timeouts`] - Ping interval, write timeout and derived read timeout
//! - [`SessionError`] - Errors reported to listeners
//! - [`memory::pair`] - In-process connection pair

pub mod classify;
pub mod error;
pub mod gateway;
pub mod listener;
pub mod memory;
pub mod session;
pub mod timeouts;

pub use classify::{EXPECTED_CLOSE_CODES, classify};
pub use error::SessionError;
pub use gateway::{Gateway, GatewayConfig};
pub use listener::SessionListener;
pub use memory::MemoryConnection;
pub use session::{Session, SessionId, SessionState};
pub use timeouts::{DEFAULT_INTERVAL, Timeouts};

// Re-export the transport vocabulary so embedders need one dependency.
pub use wsgate_protocols::{CloseCode, Connection, Control, Frame, TransportError};
