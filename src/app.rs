//! Application state and operator controls.
//!
//! [`App`] is the thin adapter between the terminal, the data source and the
//! session. It forwards frames into the session, routes notifications to the
//! chart and the device, and turns key presses into session operations.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::data::PlotData;
use crate::session::{
    format_clock, write_report, IngestOutcome, Notification, Phase, ReportMetadata,
    SessionState, SharedSession,
};
use crate::source::DataSource;
use crate::ui::Theme;

/// Upper bound on frames ingested per UI tick so input stays responsive.
const MAX_FRAMES_PER_TICK: usize = 512;

/// How long status messages stay visible.
const STATUS_TTL: Duration = Duration::from_secs(3);

/// How long the alarm banner stays visible.
const ALARM_TTL: Duration = Duration::from_secs(5);

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,
    /// Reset is destructive; it waits here for a yes/no.
    pub confirm_reset: bool,

    session: SharedSession,
    source: Box<dyn DataSource>,
    notifications: mpsc::UnboundedReceiver<Notification>,
    elapsed: watch::Receiver<f64>,

    pub plot: PlotData,
    pub transport_error: Option<String>,

    // Export
    pub metadata: Option<ReportMetadata>,
    pub export_dir: PathBuf,

    // UI
    pub theme: Theme,

    // Temporary feedback
    pub status_message: Option<(String, Instant)>,
    pub alarm_banner: Option<(String, Instant)>,
}

impl App {
    /// Create a new App around a session, its notifications and a source.
    pub fn new(
        session: SharedSession,
        notifications: mpsc::UnboundedReceiver<Notification>,
        source: Box<dyn DataSource>,
        theme: Theme,
    ) -> Self {
        let elapsed = session.elapsed_watch();
        Self {
            running: true,
            show_help: false,
            confirm_reset: false,
            session,
            source,
            notifications,
            elapsed,
            plot: PlotData::new(),
            transport_error: None,
            metadata: None,
            export_dir: PathBuf::from("."),
            theme,
            status_message: None,
            alarm_banner: None,
        }
    }

    /// Attach subject metadata for exports.
    pub fn with_metadata(mut self, metadata: Option<ReportMetadata>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Set the directory reports are written to.
    pub fn with_export_dir(mut self, dir: PathBuf) -> Self {
        self.export_dir = dir;
        self
    }

    /// Returns a description of the current data source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Elapsed time as last published by the refresh task, as `MM:SS`.
    pub fn elapsed_display(&self) -> String {
        format_clock(*self.elapsed.borrow())
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        live_message(&self.status_message, STATUS_TTL)
    }

    /// Get the alarm banner if it hasn't expired.
    pub fn get_alarm_banner(&self) -> Option<&str> {
        live_message(&self.alarm_banner, ALARM_TTL)
    }

    /// Feed pending frames into the session and dispatch notifications.
    ///
    /// Returns the number of samples accepted.
    pub fn pump(&mut self) -> usize {
        let mut accepted = 0;
        for _ in 0..MAX_FRAMES_PER_TICK {
            let Some(frame) = self.source.poll() else {
                break;
            };
            if let IngestOutcome::Accepted { .. } = self.session.ingest(&frame) {
                accepted += 1;
            }
        }
        self.dispatch_notifications();

        let error = self.source.error();
        if error.is_some() && error != self.transport_error {
            warn!(source = self.source.description(), error = ?error, "transport disrupted");
        }
        self.transport_error = error;
        accepted
    }

    /// Route queued notifications to the chart, the banner and the device.
    pub fn dispatch_notifications(&mut self) {
        while let Ok(notification) = self.notifications.try_recv() {
            match notification {
                Notification::Sample(sample) => self.plot.push_sample(sample),
                Notification::Marker(marker) => self.plot.push_marker(marker),
                Notification::AlarmFired { sample, message } => {
                    warn!(value = sample.value, elapsed = sample.elapsed_time, "{}", message);
                    self.alarm_banner = Some((message, Instant::now()));
                }
                Notification::Command(command) => self.source.send(command),
                Notification::Reset => {
                    self.plot.clear();
                    self.alarm_banner = None;
                }
            }
        }
    }

    /// The Start/Pause control.
    pub fn toggle_measuring(&mut self) {
        match self.session.toggle() {
            Ok(Phase::Running) => self.set_status_message("Measuring".to_string()),
            Ok(phase) => self.set_status_message(format!("Measurement {}", phase)),
            Err(e) => self.set_status_message(e.to_string()),
        }
        self.dispatch_notifications();
    }

    /// Drop a marker on the timeline.
    pub fn mark_event(&mut self) {
        match self.session.mark_event() {
            Ok(marker) => self.set_status_message(format!(
                "Event {} at {:.2}s",
                marker.label(),
                marker.elapsed_time
            )),
            Err(_) => self.set_status_message("Start measuring to mark events".to_string()),
        }
        self.dispatch_notifications();
    }

    /// Ask for confirmation before resetting.
    pub fn request_reset(&mut self) {
        self.confirm_reset = true;
    }

    /// Confirmed: discard the session.
    pub fn confirm_reset(&mut self) {
        self.confirm_reset = false;
        self.session.reset();
        self.dispatch_notifications();
        self.set_status_message("Session reset".to_string());
    }

    pub fn cancel_reset(&mut self) {
        self.confirm_reset = false;
    }

    /// Enable or disable the alarm.
    pub fn toggle_alarm(&mut self) {
        let enabled = self.session.toggle_alarm();
        let config = self.session.alarm_config();
        let message = if !enabled {
            "Alarm disabled".to_string()
        } else if config.is_armed() {
            format!("Alarm enabled ({})", config.mode)
        } else {
            "Alarm enabled, but no valid threshold is configured".to_string()
        };
        self.set_status_message(message);
    }

    /// Write the report for the current session.
    pub fn export_report(&self) -> Result<PathBuf> {
        let log = self.session.snapshot();
        let today = chrono::Utc::now().date_naive();
        let path = write_report(&self.export_dir, today, self.metadata.as_ref(), &log)?;
        Ok(path)
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit. Cancels the refresh task.
    pub fn quit(&mut self) {
        info!("shutting down");
        self.session.shutdown();
        self.running = false;
    }
}

fn live_message(message: &Option<(String, Instant)>, ttl: Duration) -> Option<&str> {
    match message {
        Some((msg, time)) if time.elapsed() < ttl => Some(msg),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{
        AlarmConfig, AlarmMode, ManualTime, SessionController, StreamCommand, DEFAULT_REFRESH,
    };
    use crate::source::{ChannelHandle, ChannelSource};

    fn app(alarm: AlarmConfig) -> (ManualTime, ChannelHandle, App) {
        let time = ManualTime::new();
        let controller = SessionController::new(Box::new(time.clone()), alarm);
        let (session, rx) = SharedSession::with_notifications(controller, DEFAULT_REFRESH);
        let (handle, source) = ChannelSource::create("test");
        let app = App::new(session, rx, Box::new(source), Theme::dark());
        (time, handle, app)
    }

    #[test]
    fn test_frames_flow_into_plot() {
        let (time, handle, mut app) = app(AlarmConfig::default());
        handle.push("5.0");
        assert_eq!(app.pump(), 0);

        app.toggle_measuring();
        handle.push("5.0");
        handle.push("garbage");
        assert_eq!(app.pump(), 1);
        time.advance_secs(1.0);
        handle.push("4.0");
        assert_eq!(app.pump(), 1);
        assert_eq!(app.plot.points, vec![(0.0, 5.0), (1.0, 4.0)]);
        assert_eq!(app.state().initial_value, Some(5.0));
    }

    #[test]
    fn test_commands_reach_device() {
        let (_time, mut handle, mut app) = app(AlarmConfig::default());
        app.toggle_measuring();
        app.toggle_measuring();
        app.request_reset();
        assert!(app.confirm_reset);
        assert_eq!(
            handle.drain_commands(),
            vec![StreamCommand::Start, StreamCommand::Stop]
        );
        app.confirm_reset();
        assert_eq!(handle.drain_commands(), vec![StreamCommand::Reset]);
        assert!(!app.confirm_reset);
    }

    #[test]
    fn test_cancelled_reset_keeps_session() {
        let (_time, handle, mut app) = app(AlarmConfig::default());
        app.toggle_measuring();
        handle.push("1");
        app.pump();
        app.request_reset();
        app.cancel_reset();
        assert_eq!(app.state().sample_count, 1);
        assert_eq!(app.plot.points.len(), 1);
    }

    #[test]
    fn test_alarm_banner() {
        let (_time, handle, mut app) = app(
            AlarmConfig::new(AlarmMode::Absolute, 50.0).with_message("Recommended to void"),
        );
        app.toggle_measuring();
        for v in ["60", "55", "48"] {
            handle.push(v);
        }
        app.pump();
        assert_eq!(app.get_alarm_banner(), Some("Recommended to void"));

        app.request_reset();
        app.confirm_reset();
        assert!(app.get_alarm_banner().is_none());
        assert!(app.plot.is_empty());
    }

    #[test]
    fn test_mark_event_adds_marker() {
        let (time, _handle, mut app) = app(AlarmConfig::default());
        app.mark_event();
        assert!(app.plot.markers.is_empty());
        assert_eq!(app.get_status_message(), Some("Start measuring to mark events"));

        app.toggle_measuring();
        time.advance_secs(2.5);
        app.mark_event();
        assert_eq!(app.plot.markers.len(), 1);
        assert_eq!(app.plot.markers[0].label(), "#1");
    }

    #[test]
    fn test_export_report_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let (_time, handle, app) = app(AlarmConfig::default());
        let mut app = app.with_export_dir(dir.path().to_path_buf());
        app.toggle_measuring();
        handle.push("10.123");
        app.pump();

        let path = app.export_report().unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(
            name,
            crate::session::report_file_name(chrono::Utc::now().date_naive())
        );
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "Time(s)\tValue\n0.00\t10.123\n"
        );
    }

    #[test]
    fn test_transport_error_surfaces() {
        let (_time, handle, mut app) = app(AlarmConfig::default());
        app.toggle_measuring();
        handle.push("1");
        drop(handle);
        app.pump();
        app.pump();
        assert_eq!(app.transport_error.as_deref(), Some("Channel closed"));
        // Session untouched by the disruption
        assert_eq!(app.state().sample_count, 1);
        assert_eq!(app.state().phase, Phase::Running);
    }

    #[test]
    fn test_toggle_alarm_message() {
        let (_time, _handle, mut app) = app(AlarmConfig::default());
        app.toggle_alarm();
        assert_eq!(
            app.get_status_message(),
            Some("Alarm enabled, but no valid threshold is configured")
        );
        app.toggle_alarm();
        assert_eq!(app.get_status_message(), Some("Alarm disabled"));
    }
}
