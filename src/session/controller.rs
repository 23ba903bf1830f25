//! The session controller: the single owner of session state.
//!
//! Every mutation of the clock, the alarm and the data log goes through a
//! method on [`SessionController`]. Adapters (transport, terminal UI) call
//! these methods and listen for [`Notification`]s; they never touch the
//! state directly.

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::SessionError;

use super::alarm::{AlarmConfig, AlarmEvaluator};
use super::clock::{SessionClock, TimeSource};
use super::log::{DataLog, EventMarker, Sample};
use super::report::{self, ReportMetadata};

/// Session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Paused,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::Running => "Running",
            Phase::Paused => "Paused",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Literal command tokens sent to the measuring device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamCommand {
    Start,
    Stop,
    Reset,
}

impl StreamCommand {
    /// Wire token for this command.
    pub fn token(&self) -> &'static str {
        match self {
            StreamCommand::Start => "START",
            StreamCommand::Stop => "STOP",
            StreamCommand::Reset => "RESET",
        }
    }
}

impl fmt::Display for StreamCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Fire-and-forget events for external observers.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A sample was accepted into the log.
    Sample(Sample),
    /// A marker was added to the timeline.
    Marker(EventMarker),
    /// The alarm fired on this sample.
    AlarmFired { sample: Sample, message: String },
    /// A command must be forwarded to the device.
    Command(StreamCommand),
    /// The session was reset; observers should drop their copies.
    Reset,
}

/// What [`SessionController::ingest`] did with a payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IngestOutcome {
    /// Appended to the log; `alarm_fired` is true on the firing sample only.
    Accepted { sample: Sample, alarm_fired: bool },
    /// Not a finite number.
    Malformed,
    /// Parsed, but the session is not running.
    Gated,
}

/// Point-in-time view of the session, cheap to copy out of the lock.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionState {
    pub phase: Phase,
    pub elapsed: f64,
    pub initial_value: Option<f64>,
    pub current_value: Option<f64>,
    pub alarm_fired: bool,
    pub alarm_enabled: bool,
    pub sample_count: usize,
    pub event_count: usize,
}

/// Owns the session clock, alarm evaluator and data log.
#[derive(Debug)]
pub struct SessionController {
    clock: SessionClock,
    alarm: AlarmEvaluator,
    log: DataLog,
    initial_value: Option<f64>,
    current_value: Option<f64>,
    notifier: Option<mpsc::UnboundedSender<Notification>>,
}

impl SessionController {
    /// Create an idle controller.
    pub fn new(time: Box<dyn TimeSource>, alarm: AlarmConfig) -> Self {
        Self {
            clock: SessionClock::new(time),
            alarm: AlarmEvaluator::new(alarm),
            log: DataLog::new(),
            initial_value: None,
            current_value: None,
            notifier: None,
        }
    }

    /// Attach a notification channel.
    pub fn with_notifier(mut self, notifier: mpsc::UnboundedSender<Notification>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Create a notification channel and attach its sender.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<Notification> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.notifier = Some(tx);
        rx
    }

    fn notify(&self, notification: Notification) {
        if let Some(ref tx) = self.notifier {
            // Observers may have gone away; the session does not care.
            let _ = tx.send(notification);
        }
    }

    pub fn phase(&self) -> Phase {
        self.clock.phase()
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.clock.elapsed_secs()
    }

    pub fn initial_value(&self) -> Option<f64> {
        self.initial_value
    }

    pub fn current_value(&self) -> Option<f64> {
        self.current_value
    }

    pub fn alarm_fired(&self) -> bool {
        self.alarm.has_fired()
    }

    pub fn alarm_config(&self) -> &AlarmConfig {
        self.alarm.config()
    }

    pub fn log(&self) -> &DataLog {
        &self.log
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            phase: self.phase(),
            elapsed: self.elapsed_secs(),
            initial_value: self.initial_value,
            current_value: self.current_value,
            alarm_fired: self.alarm.has_fired(),
            alarm_enabled: self.alarm.config().enabled,
            sample_count: self.log.sample_count(),
            event_count: self.log.event_count(),
        }
    }

    /// Begin a session from `Idle`.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if !self.clock.start() {
            return Err(self.invalid("start"));
        }
        info!("session started");
        self.notify(Notification::Command(StreamCommand::Start));
        Ok(())
    }

    /// Pause a running session.
    pub fn pause(&mut self) -> Result<(), SessionError> {
        if !self.clock.pause() {
            return Err(self.invalid("pause"));
        }
        info!(elapsed = self.elapsed_secs(), "session paused");
        self.notify(Notification::Command(StreamCommand::Stop));
        Ok(())
    }

    /// Resume a paused session.
    pub fn resume(&mut self) -> Result<(), SessionError> {
        if !self.clock.resume() {
            return Err(self.invalid("resume"));
        }
        info!(
            elapsed = self.elapsed_secs(),
            paused_total = self.clock.paused_total().as_secs_f64(),
            "session resumed"
        );
        self.notify(Notification::Command(StreamCommand::Start));
        Ok(())
    }

    /// The Start/Pause control: start when idle, resume when paused,
    /// pause when running. Returns the new phase.
    pub fn toggle(&mut self) -> Result<Phase, SessionError> {
        match self.phase() {
            Phase::Idle => self.start()?,
            Phase::Paused => self.resume()?,
            Phase::Running => self.pause()?,
        }
        Ok(self.phase())
    }

    /// Add a marker at the current elapsed time. Only allowed while running.
    pub fn mark_event(&mut self) -> Result<EventMarker, SessionError> {
        if self.phase() != Phase::Running {
            return Err(self.invalid("mark event"));
        }
        let marker = self.log.append_event(self.elapsed_secs());
        info!(id = marker.sequence_id, elapsed = marker.elapsed_time, "event marked");
        self.notify(Notification::Marker(marker));
        Ok(marker)
    }

    /// Handle one raw stream payload.
    ///
    /// Malformed and gated payloads leave the session untouched.
    pub fn ingest(&mut self, raw: &str) -> IngestOutcome {
        let Some(value) = parse_sample(raw) else {
            debug!(payload = raw, "discarding malformed sample");
            return IngestOutcome::Malformed;
        };
        if self.phase() != Phase::Running {
            return IngestOutcome::Gated;
        }

        if self.initial_value.is_none() {
            info!(value, "initial value captured");
            self.initial_value = Some(value);
        }
        self.current_value = Some(value);

        let sample = Sample {
            elapsed_time: self.elapsed_secs(),
            value,
        };
        self.log.append_sample(sample);
        self.notify(Notification::Sample(sample));

        let alarm_fired = self.alarm.evaluate(&sample, self.initial_value);
        if alarm_fired {
            self.notify(Notification::AlarmFired {
                sample,
                message: self.alarm.config().message.clone(),
            });
        }
        IngestOutcome::Accepted {
            sample,
            alarm_fired,
        }
    }

    /// Replace the alarm configuration. A fired alarm stays fired.
    pub fn set_alarm_config(&mut self, config: AlarmConfig) {
        info!(
            enabled = config.enabled,
            mode = %config.mode,
            threshold = ?config.threshold,
            "alarm reconfigured"
        );
        self.alarm.set_config(config);
    }

    /// Enable or disable the alarm.
    pub fn set_alarm_enabled(&mut self, enabled: bool) {
        self.alarm.set_enabled(enabled);
    }

    /// Discard the session entirely and return to `Idle`.
    ///
    /// Unconditional: confirmation is the caller's concern.
    pub fn reset(&mut self) {
        self.clock.reset();
        self.log.clear();
        self.alarm.reset();
        self.initial_value = None;
        self.current_value = None;
        info!("session reset");
        self.notify(Notification::Command(StreamCommand::Reset));
        self.notify(Notification::Reset);
    }

    /// Render the report for the current log.
    pub fn export(&self, metadata: Option<&ReportMetadata>) -> String {
        report::export(metadata, &self.log)
    }

    fn invalid(&self, operation: &'static str) -> SessionError {
        let err = SessionError::InvalidState {
            operation,
            phase: self.phase(),
        };
        debug!(%err, "control operation rejected");
        err
    }
}

/// Parse a stream payload into a finite value.
pub fn parse_sample(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
