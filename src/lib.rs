//! # sessionwatch
//!
//! A terminal controller and library for timed measurement sessions.
//!
//! A measuring device streams numeric readings. sessionwatch times the
//! session (with pause and resume), records every reading taken while
//! measuring, fires a one-shot alarm when the reading crosses an operator
//! threshold, lets the operator drop numbered event markers, and exports a
//! plain-text report.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐ │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal│ │
//! │  │(adapter)│    │  (plot)  │    │(render) │    │         │ │
//! │  └────┬────┘    └──────────┘    └─────────┘    └─────────┘ │
//! │       │   ▲ notifications                                   │
//! │       ▼   │                                                 │
//! │  ┌─────────┐      ┌─────────┐                               │
//! │  │ session │◀─────│ source  │◀── StreamSource | Channel |   │
//! │  │ (core)  │ frames│ (input) │    ReplaySource             │
//! │  └─────────┘      └─────────┘                               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`session`]**: Clock, ingest gating, alarm, data log and report export
//! - **[`source`]**: Device transports behind the [`DataSource`] trait
//! - **[`app`]**: Thin adapter turning key presses and frames into session calls
//! - **[`data`]**: Chart data rebuilt from session notifications
//! - **[`ui`]**: Terminal rendering using ratatui
//! - **[`config`]**: Layered settings (file, environment, CLI)
//! - **[`batch`]**: Headless replay and export
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Connect to a device streaming newline-delimited readings
//! sessionwatch --connect 172.20.10.3:81 --alarm-mode percent --alarm-threshold 60
//!
//! # Replay a recording headlessly and write a report
//! sessionwatch --replay recording.txt --export report.txt
//! ```
//!
//! ### As a library
//!
//! ```
//! use sessionwatch::{AlarmConfig, AlarmMode, IngestOutcome, MonotonicTime, SessionController};
//!
//! let alarm = AlarmConfig::new(AlarmMode::Absolute, 50.0);
//! let mut session = SessionController::new(Box::new(MonotonicTime), alarm);
//!
//! // Readings are ignored until measuring starts
//! assert!(matches!(session.ingest("60"), IngestOutcome::Gated));
//!
//! session.start().unwrap();
//! session.ingest("60");
//! session.ingest("48");
//! assert!(session.alarm_fired());
//! ```
//!
//! ### With a channel source
//!
//! ```
//! use sessionwatch::{ChannelSource, DataSource};
//!
//! let (handle, mut source) = ChannelSource::create("bench");
//! handle.push("12.5");
//! assert_eq!(source.poll().as_deref(), Some("12.5"));
//! ```

pub mod app;
pub mod batch;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod session;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use crate::config::{load_metadata, Settings};
pub use error::{ReportError, SessionError};
pub use session::{
    export, format_clock, parse_sample, write_report, AlarmConfig, AlarmEvaluator, AlarmMode,
    DataLog, EventMarker, IngestOutcome, ManualTime, MonotonicTime, Notification, Phase,
    ReportMetadata, Sample, SessionController, SessionState, Sex, SharedSession, StreamCommand,
    TimeSource,
};
pub use source::{ChannelHandle, ChannelSource, DataSource, ReplaySource, StreamSource};
