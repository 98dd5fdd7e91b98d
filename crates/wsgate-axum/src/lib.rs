//! # wsgate axum binding
//!
//! Serves a [`wsgate_session::Gateway`] over axum WebSockets.
//!
//! - [`AxumConnection`] - [`wsgate_protocols::Connection`] over an upgraded socket
//! - [`ws_handler`] - Upgrade handler that hands sockets to the gateway
//! - [`create_router`] - Router with the handler mounted and request tracing

pub mod connection;
pub mod handler;

pub use connection::AxumConnection;
pub use handler::{create_router, ws_handler};
