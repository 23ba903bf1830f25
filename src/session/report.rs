//! Textual session report.
//!
//! [`export`] is a pure function of the metadata and a log snapshot: the same
//! inputs always produce byte-identical text.

use std::fmt::{self, Write as _};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ReportError;

use super::DataLog;

/// Header line of the data section.
pub const DATA_HEADER: &str = "Time(s)\tValue";

/// Subject sex, as recorded in the report header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(alias = "male", alias = "M", alias = "m")]
    Male,
    #[serde(alias = "female", alias = "F", alias = "f")]
    Female,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => f.write_str("Male"),
            Sex::Female => f.write_str("Female"),
        }
    }
}

/// Subject metadata printed ahead of the measurements.
///
/// Values are free text as collected; units are added on output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub name: String,
    pub age: String,
    pub sex: Sex,
    /// Kilograms.
    pub weight: String,
    /// Metres.
    pub height: String,
    /// Suprailiac circumference in centimetres.
    pub circumference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_menstruation: Option<String>,
}

impl ReportMetadata {
    /// Check the record is internally consistent.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.sex == Sex::Male && self.last_menstruation.is_some() {
            return Err(ReportError::InvalidMetadata(
                "last_menstruation is only recorded for Female subjects".to_string(),
            ));
        }
        Ok(())
    }

    fn write_block(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "Name: {}", self.name)?;
        writeln!(out, "Age: {}", self.age)?;
        writeln!(out, "Sex: {}", self.sex)?;
        writeln!(out, "Weight: {} kg", self.weight)?;
        writeln!(out, "Height: {} m", self.height)?;
        writeln!(out, "Circumference: {} cm", self.circumference)?;
        if self.sex == Sex::Female {
            writeln!(
                out,
                "Last menstruation: {}",
                self.last_menstruation.as_deref().unwrap_or_default()
            )?;
        }
        writeln!(out)
    }
}

/// Render the report text.
pub fn export(metadata: Option<&ReportMetadata>, log: &DataLog) -> String {
    let mut out = String::with_capacity(32 + log.sample_count() * 16);
    // Writing into a String cannot fail.
    let _ = write_report_text(&mut out, metadata, log);
    out
}

fn write_report_text(
    out: &mut String,
    metadata: Option<&ReportMetadata>,
    log: &DataLog,
) -> fmt::Result {
    if let Some(meta) = metadata {
        meta.write_block(out)?;
    }

    writeln!(out, "{}", DATA_HEADER)?;
    for sample in log.samples() {
        writeln!(
            out,
            "{}\t{}",
            fixed(sample.elapsed_time, 2),
            fixed(sample.value, 3)
        )?;
    }

    if !log.events().is_empty() {
        writeln!(out)?;
        writeln!(out, "Events:")?;
        for marker in log.events() {
            writeln!(
                out,
                "Event {}: {} seconds",
                marker.sequence_id,
                fixed(marker.elapsed_time, 2)
            )?;
        }
    }
    Ok(())
}

/// Format with `digits` decimals, rounding ties away from zero and never
/// printing `-0`.
fn fixed(value: f64, digits: usize) -> String {
    let scale = 10f64.powi(digits as i32);
    // Adding 0.0 turns -0.0 into 0.0
    let rounded = (value * scale).round() / scale + 0.0;
    format!("{:.*}", digits, rounded)
}

/// Artifact name for a report produced on `date`.
pub fn report_file_name(date: NaiveDate) -> String {
    format!("measurements_{}.txt", date.format("%Y-%m-%d"))
}

/// Write the report into `dir` and return the file path.
pub fn write_report(
    dir: &Path,
    date: NaiveDate,
    metadata: Option<&ReportMetadata>,
    log: &DataLog,
) -> Result<PathBuf, ReportError> {
    if let Some(meta) = metadata {
        meta.validate()?;
    }
    let path = dir.join(report_file_name(date));
    fs::write(&path, export(metadata, log))?;
    info!(
        path = %path.display(),
        samples = log.sample_count(),
        events = log.event_count(),
        "report written"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Sample;

    fn log_with(samples: &[(f64, f64)], events: &[f64]) -> DataLog {
        let mut log = DataLog::new();
        for &(t, v) in samples {
            log.append_sample(Sample {
                elapsed_time: t,
                value: v,
            });
        }
        for &t in events {
            log.append_event(t);
        }
        log
    }

    fn metadata(sex: Sex) -> ReportMetadata {
        ReportMetadata {
            name: "Ana".to_string(),
            age: "34".to_string(),
            sex,
            weight: "61.5".to_string(),
            height: "1.68".to_string(),
            circumference: "82".to_string(),
            last_menstruation: (sex == Sex::Female).then(|| "12 days".to_string()),
        }
    }

    #[test]
    fn test_export_rounds_ties_away_from_zero() {
        let log = log_with(&[(0.125, 1.0625), (0.625, -0.0), (2.0, -1.0625)], &[0.375]);
        assert_eq!(
            export(None, &log),
            "Time(s)\tValue\n0.13\t1.063\n0.63\t0.000\n2.00\t-1.063\n\n\
             Events:\nEvent 1: 0.38 seconds\n"
        );
    }

    #[test]
    fn test_fixed() {
        assert_eq!(fixed(0.125, 2), "0.13");
        assert_eq!(fixed(-0.0, 3), "0.000");
        assert_eq!(fixed(-0.0004, 3), "0.000");
        assert_eq!(fixed(9.8, 3), "9.800");
    }

    #[test]
    fn test_export_data_only() {
        let log = log_with(&[(0.0, 10.123), (1.5, 9.8)], &[]);
        assert_eq!(
            export(None, &log),
            "Time(s)\tValue\n0.00\t10.123\n1.50\t9.800\n"
        );
    }

    #[test]
    fn test_export_empty_log() {
        assert_eq!(export(None, &DataLog::new()), "Time(s)\tValue\n");
    }

    #[test]
    fn test_export_with_events() {
        let log = log_with(&[(0.25, 1.0)], &[0.5, 12.75]);
        assert_eq!(
            export(None, &log),
            "Time(s)\tValue\n0.25\t1.000\n\n\
             Events:\nEvent 1: 0.50 seconds\nEvent 2: 12.75 seconds\n"
        );
    }

    #[test]
    fn test_export_female_metadata() {
        let text = export(Some(&metadata(Sex::Female)), &DataLog::new());
        assert_eq!(
            text,
            "Name: Ana\nAge: 34\nSex: Female\nWeight: 61.5 kg\nHeight: 1.68 m\n\
             Circumference: 82 cm\nLast menstruation: 12 days\n\nTime(s)\tValue\n"
        );
    }

    #[test]
    fn test_export_male_metadata_omits_menstruation() {
        let text = export(Some(&metadata(Sex::Male)), &DataLog::new());
        assert!(!text.contains("Last menstruation"));
        assert!(text.starts_with("Name: Ana\n"));
        assert!(text.contains("Circumference: 82 cm\n\nTime(s)\tValue\n"));
    }

    #[test]
    fn test_export_is_idempotent() {
        let log = log_with(&[(0.0, 1.0), (0.1, 2.0)], &[0.05]);
        let meta = metadata(Sex::Female);
        assert_eq!(export(Some(&meta), &log), export(Some(&meta), &log));
    }

    #[test]
    fn test_validate_rejects_male_menstruation() {
        let mut meta = metadata(Sex::Male);
        meta.last_menstruation = Some("n/a".to_string());
        assert!(matches!(meta.validate(), Err(ReportError::InvalidMetadata(_))));
        assert!(metadata(Sex::Female).validate().is_ok());
    }

    #[test]
    fn test_report_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(report_file_name(date), "measurements_2024-03-09.txt");
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let log = log_with(&[(0.0, 5.0)], &[]);
        let path = write_report(dir.path(), date, None, &log).unwrap();
        assert_eq!(path, dir.path().join("measurements_2024-01-02.txt"));
        let written = std::fs::read_to_string(path).unwrap();
        assert_eq!(written, "Time(s)\tValue\n0.00\t5.000\n");
    }

    #[test]
    fn test_metadata_deserializes_aliases() {
        let meta: ReportMetadata = serde_json::from_str(
            r#"{"name":"Bo","age":"40","sex":"male",
                "weight":"80","height":"1.80","circumference":"90"}"#,
        )
        .unwrap();
        assert_eq!(meta.sex, Sex::Male);
        assert!(meta.last_menstruation.is_none());
    }
}
