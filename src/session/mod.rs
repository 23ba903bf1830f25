//! Measurement session core.
//!
//! ## Submodules
//!
//! - [`clock`]: Elapsed-time accounting across pause/resume cycles
//! - [`alarm`]: One-shot threshold alarm ([`AlarmMode`], [`AlarmConfig`], [`AlarmEvaluator`])
//! - [`log`]: Append-only samples and event markers ([`DataLog`])
//! - [`report`]: Deterministic textual report
//! - [`controller`]: [`SessionController`], the single owner of session state
//! - [`shared`]: [`SharedSession`], the mutex-guarded handle with a display refresh task
//!
//! ## Data Flow
//!
//! ```text
//! raw payload ──▶ SessionController::ingest()
//!                        │
//!                        ├──▶ DataLog::append_sample()
//!                        │
//!                        └──▶ AlarmEvaluator::evaluate() ──▶ Notification::AlarmFired
//!
//! start / pause / resume / mark_event / reset ──▶ SessionClock, DataLog
//!                                                 └──▶ Notification::Command
//! ```

pub mod alarm;
pub mod clock;
pub mod controller;
pub mod log;
pub mod refresh;
pub mod report;
pub mod shared;

pub use alarm::{AlarmConfig, AlarmEvaluator, AlarmMode, DEFAULT_ALARM_MESSAGE};
pub use clock::{format_clock, ManualTime, MonotonicTime, SessionClock, TimeSource};
pub use controller::{
    parse_sample, IngestOutcome, Notification, Phase, SessionController, SessionState,
    StreamCommand,
};
pub use log::{DataLog, EventMarker, Sample};
pub use report::{export, report_file_name, write_report, ReportMetadata, Sex};
pub use shared::{SharedSession, DEFAULT_REFRESH};
