//! Data source abstraction for the measurement stream.
//!
//! A source delivers raw inbound frames (one numeric token each) and accepts
//! outbound command tokens for the device. Parsing and gating are the
//! session's job; sources only move text.

mod channel;
mod replay;
mod stream;

pub use channel::{ChannelHandle, ChannelSource};
pub use replay::ReplaySource;
pub use stream::StreamSource;

use std::fmt::Debug;

use crate::session::StreamCommand;

/// Trait for exchanging frames with the measuring device.
///
/// Implementations cover live TCP streams, in-process channels and recorded
/// replays.
///
/// # Example
///
/// ```
/// use sessionwatch::{ChannelSource, DataSource};
///
/// let (handle, mut source) = ChannelSource::create("bench");
/// handle.push("42.0");
/// assert_eq!(source.poll().as_deref(), Some("42.0"));
/// ```
pub trait DataSource: Send + Debug {
    /// Poll for the next inbound frame.
    ///
    /// Returns `Some(frame)` if one is waiting, `None` otherwise.
    /// This method must not block.
    fn poll(&mut self) -> Option<String>;

    /// Queue a command for the device. Fire-and-forget.
    fn send(&mut self, command: StreamCommand);

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;

    /// The last transport error, if the connection is disrupted.
    fn error(&self) -> Option<String>;
}
