//! Stream-based data source.
//!
//! Exchanges newline-delimited frames over an async byte stream, typically a
//! TCP connection to the measuring device.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::DataSource;
use crate::session::StreamCommand;

/// Inbound frames buffered between the reader task and `poll()`.
const FRAME_BUFFER: usize = 1024;

/// A data source backed by an async reader/writer pair.
///
/// Two background tasks are spawned: one reads newline-delimited frames and
/// makes them available via `poll()`, the other writes queued commands as
/// `TOKEN\n`.
///
/// # Example with in-memory streams
///
/// ```
/// use std::io::Cursor;
/// use sessionwatch::StreamSource;
///
/// # tokio_test::block_on(async {
/// let inbound = Cursor::new(b"12.5\n".to_vec());
/// let source = StreamSource::spawn(inbound, tokio::io::sink(), "example");
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    receiver: mpsc::Receiver<String>,
    commands: mpsc::UnboundedSender<StreamCommand>,
    description: String,
    last_error: Arc<Mutex<Option<String>>>,
}

impl StreamSource {
    /// Spawn reader and writer tasks over the given halves.
    pub fn spawn<R, W>(reader: R, writer: W, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(FRAME_BUFFER);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let last_error = Arc::new(Mutex::new(None));

        tokio::spawn(read_frames(reader, tx, last_error.clone()));
        tokio::spawn(write_commands(writer, command_rx, last_error.clone()));

        Self {
            receiver: rx,
            commands: command_tx,
            description: format!("stream: {}", description),
            last_error,
        }
    }

    /// Split a TCP connection and spawn over both halves.
    pub fn connect(stream: TcpStream, description: &str) -> Self {
        let (reader, writer) = stream.into_split();
        Self::spawn(reader, writer, description)
    }
}

async fn read_frames<R>(
    reader: R,
    tx: mpsc::Sender<String>,
    last_error: Arc<Mutex<Option<String>>>,
) where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                // EOF
                warn!("stream closed by peer");
                *last_error.lock() = Some("Connection closed".to_string());
                break;
            }
            Ok(_) => {
                let frame = line.trim();
                if frame.is_empty() {
                    continue;
                }
                if tx.send(frame.to_string()).await.is_err() {
                    // Receiver dropped
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "stream read failed");
                *last_error.lock() = Some(format!("Read error: {}", e));
                break;
            }
        }
    }
}

async fn write_commands<W>(
    mut writer: W,
    mut commands: mpsc::UnboundedReceiver<StreamCommand>,
    last_error: Arc<Mutex<Option<String>>>,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(command) = commands.recv().await {
        let frame = format!("{}\n", command.token());
        let written = async {
            writer.write_all(frame.as_bytes()).await?;
            writer.flush().await
        }
        .await;
        match written {
            Ok(()) => debug!(%command, "command sent"),
            Err(e) => {
                warn!(%command, error = %e, "command write failed");
                *last_error.lock() = Some(format!("Write error: {}", e));
                break;
            }
        }
    }
}

impl DataSource for StreamSource {
    fn poll(&mut self) -> Option<String> {
        // Try to receive without blocking
        match self.receiver.try_recv() {
            Ok(frame) => Some(frame),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                let mut err = self.last_error.lock();
                if err.is_none() {
                    *err = Some("Stream disconnected".to_string());
                }
                None
            }
        }
    }

    fn send(&mut self, command: StreamCommand) {
        if self.commands.send(command).is_err() {
            debug!(%command, "writer gone; command dropped");
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tokio::io::{duplex, AsyncReadExt};

    async fn settle() {
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_stream_source_reads_frames() {
        let cursor = Cursor::new("12.5\n  13.0 \n\nabc\n");
        let mut source = StreamSource::spawn(cursor, tokio::io::sink(), "test");

        settle().await;

        assert_eq!(source.poll().as_deref(), Some("12.5"));
        assert_eq!(source.poll().as_deref(), Some("13.0"));
        // Malformed frames are the session's concern; the source passes them on
        assert_eq!(source.poll().as_deref(), Some("abc"));
        assert!(source.poll().is_none());
    }

    #[tokio::test]
    async fn test_stream_source_description() {
        let source = StreamSource::spawn(Cursor::new(""), tokio::io::sink(), "10.0.0.2:81");
        assert_eq!(source.description(), "stream: 10.0.0.2:81");
    }

    #[tokio::test]
    async fn test_stream_source_reports_eof() {
        let mut source = StreamSource::spawn(Cursor::new(""), tokio::io::sink(), "test");

        settle().await;

        assert!(source.poll().is_none());
        assert_eq!(source.error().as_deref(), Some("Connection closed"));
    }

    #[tokio::test]
    async fn test_stream_source_writes_commands() {
        let (ours, mut device) = duplex(64);
        let mut source = StreamSource::spawn(Cursor::new(""), ours, "test");
        source.send(StreamCommand::Start);
        source.send(StreamCommand::Stop);
        source.send(StreamCommand::Reset);

        let mut buf = vec![0u8; 17];
        device.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, b"START\nSTOP\nRESET\n");
    }
}
