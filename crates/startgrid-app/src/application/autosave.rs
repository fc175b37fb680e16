//! Debounced background saving.
//!
//! The dashboard changes on every click and drop; writing the whole document
//! each time would be wasteful.  [`Autosave`] owns a background task fed by a
//! `tokio::sync::watch` channel.  The channel keeps only the newest snapshot,
//! and the task writes it once no new snapshot has arrived for the debounce
//! period.
//!
//! ```text
//!  notify(a) notify(b)        notify(c)
//!  ───┬─────────┬──────────────────┬────────────────────► time
//!     │         │◄── debounce ──►│ │◄── debounce ──►│
//!                                save(b)            save(c)
//! ```
//!
//! [`Autosave::shutdown`] closes the channel and waits for the task, which
//! writes any pending snapshot before it exits.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use startgrid_core::Configuration;

use crate::infrastructure::storage::repository::ConfigRepository;

/// Handle to the background save task.
pub struct Autosave {
    tx: watch::Sender<Configuration>,
    task: JoinHandle<()>,
}

impl Autosave {
    /// Spawns the save task.  `initial` is the state already on disk; it is
    /// not written again.
    pub fn spawn(repo: Arc<ConfigRepository>, initial: Configuration, debounce: Duration) -> Self {
        let (tx, rx) = watch::channel(initial);
        let task = tokio::spawn(run(repo, rx, debounce));
        Self { tx, task }
    }

    /// Queues `config` to be written after the debounce period.
    pub fn notify(&self, config: &Configuration) {
        self.tx.send_replace(config.clone());
    }

    /// Flushes the pending snapshot, if any, and stops the task.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.task.await {
            warn!(error = %e, "autosave task ended abnormally");
        }
    }
}

async fn run(
    repo: Arc<ConfigRepository>,
    mut rx: watch::Receiver<Configuration>,
    debounce: Duration,
) {
    while rx.changed().await.is_ok() {
        // Restart the quiet period on every new snapshot.
        loop {
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                () = tokio::time::sleep(debounce) => break,
            }
        }

        let snapshot = rx.borrow_and_update().clone();
        match repo.save(&snapshot).await {
            Ok(()) => debug!(items = snapshot.layout.len(), "autosaved configuration"),
            Err(e) => warn!(error = %e, "autosave failed, will retry on next change"),
        }
    }
    debug!("autosave task stopped");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
