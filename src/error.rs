//! Error types for session control and report export.

use thiserror::Error;

use crate::session::Phase;

/// Errors raised by the session controller.
///
/// None of these are fatal: callers treat them as rejected no-ops.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// A control operation was invoked in a phase that does not allow it.
    #[error("{operation} is not allowed while the session is {phase}")]
    InvalidState {
        operation: &'static str,
        phase: Phase,
    },

    /// The alarm configuration could not be understood.
    #[error("Invalid alarm configuration: {0}")]
    InvalidAlarmConfig(String),
}

/// Errors that can occur when producing the session report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The metadata record is inconsistent.
    #[error("Invalid report metadata: {0}")]
    InvalidMetadata(String),

    /// Writing the report artifact failed.
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}
