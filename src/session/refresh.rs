//! Periodic display refresh.
//!
//! A background task that reads the session's elapsed time at a fixed
//! cadence and publishes it on a watch channel. It only ever reads, and it
//! publishes while still holding the lock the writers use, so a late tick
//! can never overwrite a value published by a writer.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::SessionController;

/// Handle to a running refresh task. Dropping it cancels the task.
#[derive(Debug)]
pub struct RefreshTask {
    handle: JoinHandle<()>,
}

impl RefreshTask {
    /// Spawn the task on the current tokio runtime.
    ///
    /// Returns `None` outside a runtime; the display then simply does not
    /// tick on its own.
    pub fn spawn(
        session: Arc<Mutex<SessionController>>,
        cadence: Duration,
        elapsed_tx: Arc<watch::Sender<f64>>,
    ) -> Option<Self> {
        let runtime = tokio::runtime::Handle::try_current().ok()?;
        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(cadence);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let guard = session.lock();
                elapsed_tx.send_replace(guard.elapsed_secs());
                drop(guard);
            }
        });
        debug!(?cadence, "display refresh started");
        Some(Self { handle })
    }

    /// Whether the task is still running.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the task.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("display refresh cancelled");
    }
}
