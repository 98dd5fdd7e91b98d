//! Movable deadlines for transport operations.

use std::future::Future;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::TransportError;

/// A deadline that can be moved while an operation is waiting on it.
///
/// `None` means no deadline. Moving the deadline wakes any operation running
/// under [`Deadline::run`] so it re-arms against the new instant.
pub struct Deadline {
    tx: watch::Sender<Option<Instant>>,
}

impl Deadline {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Replace the deadline.
    pub fn set(&self, deadline: Option<Instant>) {
        self.tx.send_replace(deadline);
    }

    /// Current deadline.
    pub fn get(&self) -> Option<Instant> {
        *self.tx.borrow()
    }

    /// Drive `fut` to completion unless the deadline passes first.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, TransportError> {
        let mut changes = self.tx.subscribe();
        tokio::pin!(fut);

        loop {
            let deadline = *changes.borrow_and_update();
            tokio::select! {
                biased;
                out = &mut fut => return Ok(out),
                changed = changes.changed() => {
                    if changed.is_err() {
                        return Ok(fut.await);
                    }
                }
                () = sleep_until(deadline) => return Err(TransportError::Timeout),
            }
        }
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::new()
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
