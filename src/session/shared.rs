//! Thread-safe session handle.
//!
//! [`SharedSession`] serializes every operation through one mutex and ties
//! the display refresh task to the session lifecycle: Start and Resume
//! spawn it, Pause and Reset cancel it.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use crate::error::SessionError;

use super::refresh::RefreshTask;
use super::{
    AlarmConfig, DataLog, EventMarker, IngestOutcome, Notification, Phase, ReportMetadata,
    SessionController, SessionState,
};

/// Default display refresh cadence.
pub const DEFAULT_REFRESH: Duration = Duration::from_millis(100);

/// Cloneable handle to the process's single session.
#[derive(Debug, Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<SessionController>>,
    refresh: Arc<Mutex<Option<RefreshTask>>>,
    elapsed_tx: Arc<watch::Sender<f64>>,
    cadence: Duration,
}

impl SharedSession {
    /// Wrap a controller. `cadence` is the display refresh period.
    pub fn new(controller: SessionController, cadence: Duration) -> Self {
        let (elapsed_tx, _) = watch::channel(controller.elapsed_secs());
        Self {
            inner: Arc::new(Mutex::new(controller)),
            refresh: Arc::new(Mutex::new(None)),
            elapsed_tx: Arc::new(elapsed_tx),
            cadence,
        }
    }

    /// Wrap a controller and attach a fresh notification channel.
    pub fn with_notifications(
        mut controller: SessionController,
        cadence: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let rx = controller.subscribe();
        (Self::new(controller, cadence), rx)
    }

    /// Receiver for the periodically refreshed elapsed time.
    pub fn elapsed_watch(&self) -> watch::Receiver<f64> {
        self.elapsed_tx.subscribe()
    }

    /// Whether the refresh task is currently active.
    pub fn is_refreshing(&self) -> bool {
        self.refresh.lock().as_ref().is_some_and(RefreshTask::is_running)
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state()
    }

    pub fn phase(&self) -> Phase {
        self.inner.lock().phase()
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.inner.lock().elapsed_secs()
    }

    /// Owned copy of the data log.
    pub fn snapshot(&self) -> DataLog {
        self.inner.lock().log().snapshot()
    }

    pub fn alarm_config(&self) -> AlarmConfig {
        self.inner.lock().alarm_config().clone()
    }

    pub fn ingest(&self, raw: &str) -> IngestOutcome {
        self.inner.lock().ingest(raw)
    }

    pub fn start(&self) -> Result<(), SessionError> {
        self.inner.lock().start()?;
        self.start_refresh();
        Ok(())
    }

    pub fn pause(&self) -> Result<(), SessionError> {
        {
            let mut session = self.inner.lock();
            session.pause()?;
            self.publish(&session);
        }
        self.stop_refresh();
        Ok(())
    }

    pub fn resume(&self) -> Result<(), SessionError> {
        self.inner.lock().resume()?;
        self.start_refresh();
        Ok(())
    }

    /// Start/Pause toggle. Returns the new phase.
    pub fn toggle(&self) -> Result<Phase, SessionError> {
        let phase = {
            let mut session = self.inner.lock();
            let phase = session.toggle()?;
            self.publish(&session);
            phase
        };
        match phase {
            Phase::Running => self.start_refresh(),
            Phase::Paused | Phase::Idle => self.stop_refresh(),
        }
        Ok(phase)
    }

    pub fn mark_event(&self) -> Result<EventMarker, SessionError> {
        self.inner.lock().mark_event()
    }

    pub fn reset(&self) {
        {
            let mut session = self.inner.lock();
            session.reset();
            self.publish(&session);
        }
        self.stop_refresh();
    }

    pub fn set_alarm_config(&self, config: AlarmConfig) {
        self.inner.lock().set_alarm_config(config);
    }

    /// Flip the alarm's enabled flag. Returns the new value.
    pub fn toggle_alarm(&self) -> bool {
        let mut session = self.inner.lock();
        let enabled = !session.alarm_config().enabled;
        session.set_alarm_enabled(enabled);
        enabled
    }

    pub fn export(&self, metadata: Option<&ReportMetadata>) -> String {
        self.inner.lock().export(metadata)
    }

    /// Cancel the refresh task. Used on teardown.
    pub fn shutdown(&self) {
        self.refresh.lock().take();
    }

    fn start_refresh(&self) {
        let task = RefreshTask::spawn(self.inner.clone(), self.cadence, self.elapsed_tx.clone());
        // Replacing an existing task cancels it.
        *self.refresh.lock() = task;
    }

    fn stop_refresh(&self) {
        if let Some(task) = self.refresh.lock().take() {
            task.cancel();
        }
    }

    /// Publish elapsed time; callers hold the session lock.
    fn publish(&self, session: &SessionController) {
        self.elapsed_tx.send_replace(session.elapsed_secs());
    }
}
