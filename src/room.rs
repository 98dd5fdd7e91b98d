//! Chat room: every message goes to every member.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use handlebars::html_escape;
use tracing::{debug, info};

use wsgate_session::{Session, SessionId, SessionListener};

/// Sessions currently in the room, keyed by id.
#[derive(Default)]
pub struct Room {
    members: DashMap<SessionId, Arc<Session>>,
}

impl Room {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, session: Arc<Session>) {
        self.members.insert(session.id().to_string(), session);
    }

    pub fn remove(&self, session: &Session) {
        self.members.remove(session.id());
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Send `text` to every member as one escaped `<div>` line.
    ///
    /// Writes run as their own tasks so one slow member does not hold up the
    /// rest; failures are handled by each session.
    pub fn broadcast(&self, text: &str) {
        let line = render_line(text);
        let members: Vec<Arc<Session>> = self
            .members
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        debug!(members = members.len(), "broadcasting");
        for member in members {
            let line = line.clone();
            tokio::spawn(async move {
                let _ = member.write(line).await;
            });
        }
    }
}

#[async_trait]
impl SessionListener for Room {
    async fn on_connect(&self, session: Arc<Session>) {
        self.add(session);
        info!(members = self.len(), "member joined");
    }

    async fn on_message(&self, _session: Arc<Session>, payload: String) {
        self.broadcast(&payload);
    }

    async fn on_close(&self, session: Arc<Session>) {
        self.remove(&session);
        info!(members = self.len(), "member left");
    }
}

pub(crate) fn render_line(text: &str) -> String {
    format!("<div>{}</div>", html_escape(text))
}

#[cfg(test)]
#[path = "room_tests.rs"]
mod tests;
