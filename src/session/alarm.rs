//! One-shot threshold alarm.

use std::fmt;
use std::str::FromStr;

use tracing::{info, warn};

use crate::error::SessionError;

use super::Sample;

/// Default operator message shown when the alarm fires.
pub const DEFAULT_ALARM_MESSAGE: &str = "Alarm threshold reached";

/// Comparison strategy used to decide the monitored value crossed the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlarmMode {
    /// Fires when `value <= threshold`.
    #[default]
    Absolute,
    /// Fires when `value <= initial * threshold / 100`.
    PercentOfInitial,
    /// Fires when `value <= initial - threshold`.
    AbsoluteDifference,
}

impl AlarmMode {
    /// Short configuration name.
    pub fn label(&self) -> &'static str {
        match self {
            AlarmMode::Absolute => "absolute",
            AlarmMode::PercentOfInitial => "percent",
            AlarmMode::AbsoluteDifference => "difference",
        }
    }

    /// Whether evaluation needs the session's initial value.
    pub fn needs_initial(&self) -> bool {
        !matches!(self, AlarmMode::Absolute)
    }

    /// The value at or below which the alarm fires, if it can be computed.
    pub fn trigger_level(&self, threshold: f64, initial: Option<f64>) -> Option<f64> {
        match self {
            AlarmMode::Absolute => Some(threshold),
            AlarmMode::PercentOfInitial => initial.map(|i| i * (threshold / 100.0)),
            AlarmMode::AbsoluteDifference => initial.map(|i| i - threshold),
        }
    }
}

impl fmt::Display for AlarmMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AlarmMode {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abs" | "absolute" => Ok(AlarmMode::Absolute),
            "percent" | "pct" | "percent-of-initial" | "percent_of_initial" => {
                Ok(AlarmMode::PercentOfInitial)
            }
            "diff" | "difference" | "absolute-difference" | "absolute_difference" => {
                Ok(AlarmMode::AbsoluteDifference)
            }
            other => Err(SessionError::InvalidAlarmConfig(format!(
                "unknown alarm mode '{}'",
                other
            ))),
        }
    }
}

/// Alarm configuration.
///
/// A `None` threshold means the configured value was missing or not a finite
/// number; such a configuration never fires.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmConfig {
    pub enabled: bool,
    pub mode: AlarmMode,
    pub threshold: Option<f64>,
    pub message: String,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: AlarmMode::Absolute,
            threshold: None,
            message: DEFAULT_ALARM_MESSAGE.to_string(),
        }
    }
}

impl AlarmConfig {
    /// An enabled alarm with a numeric threshold.
    pub fn new(mode: AlarmMode, threshold: f64) -> Self {
        Self {
            enabled: true,
            mode,
            threshold: threshold.is_finite().then_some(threshold),
            message: DEFAULT_ALARM_MESSAGE.to_string(),
        }
    }

    /// Build a configuration from raw operator input.
    ///
    /// An unknown mode is rejected. A threshold that does not parse as a
    /// finite number is kept as "never fires" and logged.
    pub fn from_raw(
        enabled: bool,
        mode: &str,
        threshold: Option<&str>,
    ) -> Result<Self, SessionError> {
        let mode: AlarmMode = mode.parse()?;
        let threshold = parse_threshold(threshold);
        if enabled && threshold.is_none() {
            warn!(%mode, "alarm threshold missing or not numeric; alarm will not fire");
        }
        Ok(Self {
            enabled,
            mode,
            threshold,
            message: DEFAULT_ALARM_MESSAGE.to_string(),
        })
    }

    /// Replace the operator message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Whether this configuration can ever fire.
    pub fn is_armed(&self) -> bool {
        self.enabled && self.threshold.is_some()
    }
}

fn parse_threshold(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok()).filter(|v| v.is_finite())
}

/// Evaluates samples against an [`AlarmConfig`], firing at most once until reset.
#[derive(Debug, Clone, Default)]
pub struct AlarmEvaluator {
    config: AlarmConfig,
    fired: bool,
}

impl AlarmEvaluator {
    pub fn new(config: AlarmConfig) -> Self {
        Self {
            config,
            fired: false,
        }
    }

    pub fn config(&self) -> &AlarmConfig {
        &self.config
    }

    /// Swap the configuration. A fired alarm stays fired.
    pub fn set_config(&mut self, config: AlarmConfig) {
        self.config = config;
    }

    /// Enable or disable evaluation without touching the thresholds.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    /// Whether the alarm has fired in this session.
    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Evaluate one sample. Returns `true` only on the call that fires.
    pub fn evaluate(&mut self, sample: &Sample, initial_value: Option<f64>) -> bool {
        if !self.config.enabled || self.fired {
            return false;
        }
        let Some(threshold) = self.config.threshold else {
            return false;
        };
        let Some(level) = self.config.mode.trigger_level(threshold, initial_value) else {
            return false;
        };

        if sample.value <= level {
            self.fired = true;
            info!(
                mode = %self.config.mode,
                value = sample.value,
                level,
                elapsed = sample.elapsed_time,
                "alarm fired"
            );
            true
        } else {
            false
        }
    }

    /// Re-arm for a new session.
    pub fn reset(&mut self) {
        self.fired = false;
    }
}
