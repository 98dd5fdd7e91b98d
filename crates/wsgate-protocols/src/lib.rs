//! # wsgate Protocols
//!
//! Protocol definitions for the duplex transport a wsgate session runs on.
//! Contains the capability trait and its vocabulary types; transports live in
//! other crates.
//!
//! ## Core Types
//!
//! - [`Connection`] - A negotiated duplex channel speaking data, ping and close frames
//! - [`Frame`] - A received data frame
//! - [`Control`] - An outbound control frame (ping, pong, close)
//! - [`CloseCode`] - Close handshake status codes
//! - [`TransportError`] - Errors surfaced by a transport
//! - [`Deadline`] - Movable deadline shared by transports for read/write timeouts

pub mod connection;
pub mod deadline;
pub mod error;
pub mod frame;

pub use connection::{Connection, PongCallback};
pub use deadline::Deadline;
pub use error::TransportError;
pub use frame::{CloseCode, Control, Frame};
