//! Layered configuration.
//!
//! Built-in defaults, then an optional config file, then `SESSIONWATCH_*`
//! environment variables. CLI flags are applied on top by the binary.
//!
//! ```toml
//! [stream]
//! connect = "172.20.10.3:81"
//!
//! [alarm]
//! enabled = true
//! mode = "percent"
//! threshold = 60
//! message = "Recommended to void"
//!
//! [display]
//! refresh_ms = 100
//!
//! [export]
//! directory = "reports"
//!
//! [log]
//! level = "info"
//! file = "sessionwatch.log"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::session::{AlarmConfig, ReportMetadata, DEFAULT_ALARM_MESSAGE};

/// Environment variable prefix (`SESSIONWATCH_ALARM__THRESHOLD=50`).
pub const ENV_PREFIX: &str = "SESSIONWATCH";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub stream: StreamSettings,
    pub alarm: AlarmSettings,
    pub display: DisplaySettings,
    pub export: ExportSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// `host:port` of the measuring device.
    pub connect: Option<String>,
    /// Recorded stream to replay instead of connecting.
    pub replay: Option<PathBuf>,
}

/// Alarm settings as written by the operator.
///
/// The threshold stays text here so a bad value disarms the alarm instead
/// of failing the whole configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlarmSettings {
    pub enabled: bool,
    pub mode: String,
    pub threshold: Option<String>,
    pub message: String,
}

impl Default for AlarmSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: "absolute".to_string(),
            threshold: None,
            message: DEFAULT_ALARM_MESSAGE.to_string(),
        }
    }
}

impl AlarmSettings {
    /// Validate into an [`AlarmConfig`].
    pub fn to_alarm_config(&self) -> Result<AlarmConfig> {
        let config = AlarmConfig::from_raw(self.enabled, &self.mode, self.threshold.as_deref())?;
        Ok(config.with_message(self.message.clone()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub refresh_ms: u64,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self { refresh_ms: 100 }
    }
}

impl DisplaySettings {
    pub fn refresh(&self) -> Duration {
        Duration::from_millis(self.refresh_ms.max(10))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub directory: PathBuf,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub file: PathBuf,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: PathBuf::from("sessionwatch.log"),
        }
    }
}

impl Settings {
    /// Load settings from an optional file plus the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to read configuration")?;
        config
            .try_deserialize()
            .context("Invalid configuration")
    }
}

/// Load a subject metadata record from a TOML or JSON file.
pub fn load_metadata(path: &Path) -> Result<ReportMetadata> {
    let metadata: ReportMetadata = Config::builder()
        .add_source(File::from(path))
        .build()
        .and_then(|config| config.try_deserialize())
        .with_context(|| format!("Failed to read metadata from {}", path.display()))?;
    metadata.validate()?;
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{AlarmMode, Sex};
    use std::io::Write;
    use tempfile::Builder;

    fn toml_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.stream.connect.is_none());
        assert!(!settings.alarm.enabled);
        assert_eq!(settings.display.refresh(), Duration::from_millis(100));
        assert_eq!(settings.log.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let file = toml_file(
            r#"
            [stream]
            connect = "127.0.0.1:81"

            [alarm]
            enabled = true
            mode = "diff"
            threshold = 20

            [display]
            refresh_ms = 250
            "#,
        );
        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.stream.connect.as_deref(), Some("127.0.0.1:81"));
        assert_eq!(settings.display.refresh_ms, 250);

        let alarm = settings.alarm.to_alarm_config().unwrap();
        assert!(alarm.enabled);
        assert_eq!(alarm.mode, AlarmMode::AbsoluteDifference);
        assert_eq!(alarm.threshold, Some(20.0));
        assert_eq!(alarm.message, DEFAULT_ALARM_MESSAGE);
    }

    #[test]
    fn test_bad_threshold_disarms() {
        let file = toml_file(
            r#"
            [alarm]
            enabled = true
            mode = "absolute"
            threshold = "low"
            "#,
        );
        let settings = Settings::load(Some(file.path())).unwrap();
        let alarm = settings.alarm.to_alarm_config().unwrap();
        assert!(alarm.enabled);
        assert!(!alarm.is_armed());
    }

    #[test]
    fn test_unknown_mode_is_an_error() {
        let settings = AlarmSettings {
            mode: "sideways".to_string(),
            ..AlarmSettings::default()
        };
        assert!(settings.to_alarm_config().is_err());
    }

    #[test]
    fn test_load_metadata() {
        let file = toml_file(
            r#"
            name = "Ana"
            age = "34"
            sex = "Female"
            weight = "61.5"
            height = "1.68"
            circumference = "82"
            last_menstruation = "2024-02-20"
            "#,
        );
        let metadata = load_metadata(file.path()).unwrap();
        assert_eq!(metadata.sex, Sex::Female);
        assert_eq!(metadata.last_menstruation.as_deref(), Some("2024-02-20"));
    }

    #[test]
    fn test_load_metadata_rejects_inconsistent_record() {
        let file = toml_file(
            r#"
            name = "Bo"
            age = "40"
            sex = "Male"
            weight = "80"
            height = "1.80"
            circumference = "90"
            last_menstruation = "never"
            "#,
        );
        assert!(load_metadata(file.path()).is_err());
    }
}
