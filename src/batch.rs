//! Headless replay.
//!
//! Runs every frame of a [`DataSource`] through a fresh session on a
//! simulated clock and exports the result, without a terminal.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::session::{
    AlarmConfig, DataLog, IngestOutcome, ManualTime, ReportMetadata, SessionController,
};
use crate::source::DataSource;

/// Outcome of a headless run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub accepted: usize,
    pub rejected: usize,
    pub initial_value: Option<f64>,
    pub final_value: Option<f64>,
    pub alarm_fired: bool,
    pub log: DataLog,
}

/// JSON document written for `.json` export targets.
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    metadata: Option<&'a ReportMetadata>,
    #[serde(flatten)]
    summary: &'a BatchSummary,
}

/// Drain `source` through a started session, one frame every `interval`.
pub fn run(source: &mut dyn DataSource, interval: Duration, alarm: AlarmConfig) -> BatchSummary {
    let time = ManualTime::new();
    let mut controller = SessionController::new(Box::new(time.clone()), alarm);
    // Starting from Idle cannot fail
    let _ = controller.start();

    let mut accepted = 0;
    let mut rejected = 0;
    while let Some(frame) = source.poll() {
        match controller.ingest(&frame) {
            IngestOutcome::Accepted { .. } => {
                accepted += 1;
                time.advance(interval);
            }
            _ => rejected += 1,
        }
    }

    info!(
        source = source.description(),
        accepted,
        rejected,
        alarm_fired = controller.alarm_fired(),
        "replay finished"
    );

    BatchSummary {
        accepted,
        rejected,
        initial_value: controller.initial_value(),
        final_value: controller.current_value(),
        alarm_fired: controller.alarm_fired(),
        log: controller.log().snapshot(),
    }
}

/// Render a summary for `path`: JSON when the extension is `.json`,
/// the plain-text report otherwise.
pub fn render(
    path: &Path,
    metadata: Option<&ReportMetadata>,
    summary: &BatchSummary,
) -> Result<String> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        let report = JsonReport { metadata, summary };
        return serde_json::to_string_pretty(&report).context("Failed to serialize report");
    }
    Ok(crate::session::export(metadata, &summary.log))
}

/// Run `source` and write the rendered summary to `path`.
pub fn export_to_file(
    source: &mut dyn DataSource,
    path: &Path,
    interval: Duration,
    alarm: AlarmConfig,
    metadata: Option<&ReportMetadata>,
) -> Result<BatchSummary> {
    let summary = run(source, interval, alarm);
    let content = render(path, metadata, &summary)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), samples = summary.log.sample_count(), "report written");
    Ok(summary)
}
