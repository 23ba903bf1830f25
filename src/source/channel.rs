//! Channel-based data source.
//!
//! Receives frames via a tokio mpsc channel and hands outbound commands
//! back the same way. This is useful when the device link lives elsewhere
//! in the process, and for driving the session from tests.

use tokio::sync::mpsc;

use super::DataSource;
use crate::session::StreamCommand;

/// The producer side of a [`ChannelSource`].
#[derive(Debug)]
pub struct ChannelHandle {
    frames: mpsc::UnboundedSender<String>,
    commands: mpsc::UnboundedReceiver<StreamCommand>,
}

impl ChannelHandle {
    /// Push one inbound frame. Returns `false` if the source was dropped.
    pub fn push(&self, frame: impl Into<String>) -> bool {
        self.frames.send(frame.into()).is_ok()
    }

    /// Take the next command the session sent, if any.
    pub fn try_command(&mut self) -> Option<StreamCommand> {
        self.commands.try_recv().ok()
    }

    /// Drain every command sent so far.
    pub fn drain_commands(&mut self) -> Vec<StreamCommand> {
        std::iter::from_fn(|| self.try_command()).collect()
    }
}

/// A data source fed through in-process channels.
///
/// # Example
///
/// ```
/// use sessionwatch::{ChannelSource, DataSource, StreamCommand};
///
/// let (mut handle, mut source) = ChannelSource::create("loopback");
/// source.send(StreamCommand::Start);
/// assert_eq!(handle.try_command(), Some(StreamCommand::Start));
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    frames: mpsc::UnboundedReceiver<String>,
    commands: mpsc::UnboundedSender<StreamCommand>,
    description: String,
    disconnected: bool,
}

impl ChannelSource {
    /// Create a connected handle/source pair.
    pub fn create(source_description: &str) -> (ChannelHandle, Self) {
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let handle = ChannelHandle {
            frames: frame_tx,
            commands: command_rx,
        };
        let source = Self {
            frames: frame_rx,
            commands: command_tx,
            description: format!("channel: {}", source_description),
            disconnected: false,
        };
        (handle, source)
    }
}

impl DataSource for ChannelSource {
    fn poll(&mut self) -> Option<String> {
        match self.frames.try_recv() {
            Ok(frame) => Some(frame),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.disconnected = true;
                None
            }
        }
    }

    fn send(&mut self, command: StreamCommand) {
        let _ = self.commands.send(command);
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.disconnected.then(|| "Channel closed".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_source_poll() {
        let (handle, mut source) = ChannelSource::create("test");

        assert!(source.poll().is_none());

        assert!(handle.push("1.5"));
        assert!(handle.push("2.5"));
        assert_eq!(source.poll().as_deref(), Some("1.5"));
        assert_eq!(source.poll().as_deref(), Some("2.5"));
        assert!(source.poll().is_none());
        assert!(source.error().is_none());
    }

    #[test]
    fn test_channel_source_commands() {
        let (mut handle, mut source) = ChannelSource::create("test");
        source.send(StreamCommand::Start);
        source.send(StreamCommand::Reset);
        assert_eq!(
            handle.drain_commands(),
            vec![StreamCommand::Start, StreamCommand::Reset]
        );
        assert!(handle.try_command().is_none());
    }

    #[test]
    fn test_channel_source_disconnect() {
        let (handle, mut source) = ChannelSource::create("test");
        handle.push("3");
        drop(handle);
        // Buffered frames still arrive
        assert_eq!(source.poll().as_deref(), Some("3"));
        assert!(source.poll().is_none());
        assert_eq!(source.error().as_deref(), Some("Channel closed"));
        assert_eq!(source.description(), "channel: test");
    }
}
