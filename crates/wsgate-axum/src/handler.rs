//! HTTP upgrade handling and routing.

use std::sync::Arc;

use axum::{
    Router,
    extract::{
        State,
        ws::{WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::trace::TraceLayer;
use tracing::debug;

use wsgate_session::{Gateway, SessionError};

use crate::connection::AxumConnection;

/// Create a router serving `gateway` at `path`.
pub fn create_router(gateway: Arc<Gateway>, path: &str) -> Router {
    Router::new()
        .route(path, get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

/// WebSocket upgrade handler.
///
/// A request that cannot be upgraded is reported to the gateway's listener
/// and answered with the rejection's own status (400 for a plain GET).
pub async fn ws_handler(
    State(gateway): State<Arc<Gateway>>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ws = match upgrade {
        Ok(ws) => ws,
        Err(rejection) => {
            gateway
                .reject(SessionError::Upgrade(rejection.body_text()))
                .await;
            return rejection.into_response();
        }
    };

    let on_failure = gateway.clone();
    ws.on_failed_upgrade(move |err: axum::Error| {
        tokio::spawn(async move {
            on_failure
                .reject(SessionError::Upgrade(err.to_string()))
                .await;
        });
    })
    .on_upgrade(move |socket| async move {
        let session = gateway.accept(AxumConnection::new(socket)).await;
        debug!(session_id = %session.id(), "websocket session running");
    })
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
