//! File replay data source.
//!
//! Plays back a recorded stream, one frame per line, one frame per poll.
//! An optional interval paces playback to roughly the device's rate.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::debug;

use super::DataSource;
use crate::session::StreamCommand;

/// A data source that replays frames recorded in a text file.
///
/// The file is read lazily on first poll. Commands have nowhere to go and
/// are only logged.
#[derive(Debug)]
pub struct ReplaySource {
    path: PathBuf,
    description: String,
    last_error: Option<String>,
    frames: Option<VecDeque<String>>,
    interval: Option<Duration>,
    last_frame: Option<Instant>,
}

impl ReplaySource {
    /// Create a replay source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("replay: {}", path.display());
        Self {
            path,
            description,
            last_error: None,
            frames: None,
            interval: None,
            last_frame: None,
        }
    }

    /// Deliver at most one frame per `interval`.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Returns the path being replayed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Frames not yet delivered.
    pub fn remaining(&self) -> usize {
        self.frames.as_ref().map_or(0, VecDeque::len)
    }

    fn load(&mut self) -> &mut VecDeque<String> {
        let path = &self.path;
        let last_error = &mut self.last_error;
        self.frames.get_or_insert_with(|| match fs::read_to_string(path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) => {
                *last_error = Some(format!("Read error: {}", e));
                VecDeque::new()
            }
        })
    }
}

impl DataSource for ReplaySource {
    fn poll(&mut self) -> Option<String> {
        if let (Some(interval), Some(last)) = (self.interval, self.last_frame) {
            if last.elapsed() < interval {
                return None;
            }
        }
        let frame = self.load().pop_front();
        if frame.is_some() {
            self.last_frame = Some(Instant::now());
        }
        if frame.is_none() && self.last_error.is_none() {
            self.last_error = Some("Replay finished".to_string());
        }
        frame
    }

    fn send(&mut self, command: StreamCommand) {
        debug!(%command, "replay source ignores commands");
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_replay_source_new() {
        let source = ReplaySource::new("/tmp/session.txt");
        assert_eq!(source.path(), Path::new("/tmp/session.txt"));
        assert_eq!(source.description(), "replay: /tmp/session.txt");
        assert!(source.error().is_none());
    }

    #[test]
    fn test_replay_source_one_frame_per_poll() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "10.5\n\n 9.75 \nbad").unwrap();

        let mut source = ReplaySource::new(file.path());

        assert_eq!(source.poll().as_deref(), Some("10.5"));
        assert_eq!(source.remaining(), 2);
        assert_eq!(source.poll().as_deref(), Some("9.75"));
        assert_eq!(source.poll().as_deref(), Some("bad"));
        assert!(source.poll().is_none());
        assert_eq!(source.error().as_deref(), Some("Replay finished"));
    }

    #[test]
    fn test_replay_source_paced() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "1\n2").unwrap();

        let mut source = ReplaySource::new(file.path()).with_interval(Duration::from_secs(3600));

        assert_eq!(source.poll().as_deref(), Some("1"));
        // Held back, not finished
        assert!(source.poll().is_none());
        assert!(source.error().is_none());
        assert_eq!(source.remaining(), 1);
    }

    #[test]
    fn test_replay_source_missing_file() {
        let mut source = ReplaySource::new("/nonexistent/path/session.txt");

        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("Read error"));
    }
}
