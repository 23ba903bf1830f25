//! Session clock: active elapsed time across pause/resume cycles.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::Phase;

/// Source of "now" for the session clock.
///
/// Production code uses [`MonotonicTime`]; tests drive a [`ManualTime`].
pub trait TimeSource: Send + Debug {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// The process monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicTime;

impl TimeSource for MonotonicTime {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A hand-advanced clock. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualTime {
    now: Arc<Mutex<Instant>>,
}

impl Default for ManualTime {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualTime {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    /// Move the clock forward by fractional seconds.
    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

/// Tracks elapsed running time, excluding every paused interval.
///
/// `start_instant` is set iff the phase is not `Idle`, and
/// `pause_started_at` is set iff the phase is `Paused`.
#[derive(Debug)]
pub struct SessionClock {
    time: Box<dyn TimeSource>,
    phase: Phase,
    start_instant: Option<Instant>,
    accumulated_pause: Duration,
    pause_started_at: Option<Instant>,
}

impl SessionClock {
    /// Create an idle clock reading time from `time`.
    pub fn new(time: Box<dyn TimeSource>) -> Self {
        Self {
            time,
            phase: Phase::Idle,
            start_instant: None,
            accumulated_pause: Duration::ZERO,
            pause_started_at: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Begin a session. Returns `true` if the clock transitioned.
    pub fn start(&mut self) -> bool {
        if self.phase != Phase::Idle {
            return false;
        }
        self.start_instant = Some(self.time.now());
        self.phase = Phase::Running;
        true
    }

    /// Pause a running session. Returns `true` if the clock transitioned.
    pub fn pause(&mut self) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        self.pause_started_at = Some(self.time.now());
        self.phase = Phase::Paused;
        true
    }

    /// Resume a paused session. Returns `true` if the clock transitioned.
    pub fn resume(&mut self) -> bool {
        let Some(paused_at) = self.pause_started_at.take() else {
            return false;
        };
        self.accumulated_pause += self.time.now().saturating_duration_since(paused_at);
        self.phase = Phase::Running;
        true
    }

    /// Active elapsed time.
    ///
    /// While paused the reading is frozen at the moment the pause began.
    pub fn elapsed(&self) -> Duration {
        let Some(start) = self.start_instant else {
            return Duration::ZERO;
        };
        let now = self.pause_started_at.unwrap_or_else(|| self.time.now());
        now.saturating_duration_since(start).saturating_sub(self.accumulated_pause)
    }

    /// Active elapsed time in fractional seconds.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    /// Total time spent in completed pauses.
    pub fn paused_total(&self) -> Duration {
        self.accumulated_pause
    }

    /// Return to `Idle` with every field cleared.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.start_instant = None;
        self.accumulated_pause = Duration::ZERO;
        self.pause_started_at = None;
    }
}

/// Format seconds as a zero-padded `MM:SS` display.
pub fn format_clock(secs: f64) -> String {
    let whole = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual_clock() -> (ManualTime, SessionClock) {
        let time = ManualTime::new();
        let clock = SessionClock::new(Box::new(time.clone()));
        (time, clock)
    }

    #[test]
    fn test_idle_clock_reads_zero() {
        let (time, clock) = manual_clock();
        time.advance_secs(5.0);
        assert_eq!(clock.phase(), Phase::Idle);
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_start_is_idempotent() {
        let (time, mut clock) = manual_clock();
        assert!(clock.start());
        time.advance_secs(2.0);
        assert!(!clock.start());
        time.advance_secs(1.0);
        assert!((clock.elapsed_secs() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_pause_excludes_paused_time() {
        let (time, mut clock) = manual_clock();
        clock.start();
        time.advance_secs(4.0);
        assert!(clock.pause());
        time.advance_secs(10.0);
        // Frozen while paused
        assert!((clock.elapsed_secs() - 4.0).abs() < 1e-9);
        assert!(clock.resume());
        time.advance_secs(1.5);
        assert!((clock.elapsed_secs() - 5.5).abs() < 1e-9);
        assert_eq!(clock.paused_total(), Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_transitions_are_noops() {
        let (_time, mut clock) = manual_clock();
        assert!(!clock.pause());
        assert!(!clock.resume());
        clock.start();
        assert!(!clock.resume());
        clock.pause();
        assert!(!clock.pause());
        assert_eq!(clock.phase(), Phase::Paused);
    }

    #[test]
    fn test_elapsed_is_monotone_across_cycles() {
        let (time, mut clock) = manual_clock();
        clock.start();
        let mut last = clock.elapsed();
        for step in 0..20 {
            time.advance_secs(0.25);
            if step % 3 == 0 {
                clock.pause();
            } else if step % 3 == 2 {
                clock.resume();
            }
            let now = clock.elapsed();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn test_reset_clears_everything() {
        let (time, mut clock) = manual_clock();
        clock.start();
        time.advance_secs(3.0);
        clock.pause();
        time.advance_secs(3.0);
        clock.reset();
        assert_eq!(clock.phase(), Phase::Idle);
        assert_eq!(clock.elapsed(), Duration::ZERO);
        assert_eq!(clock.paused_total(), Duration::ZERO);
        assert!(clock.start());
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0.0), "00:00");
        assert_eq!(format_clock(59.9), "00:59");
        assert_eq!(format_clock(61.0), "01:01");
        assert_eq!(format_clock(3600.0), "60:00");
        assert_eq!(format_clock(-1.0), "00:00");
    }
}
