use uuid::Uuid;

use crate::pty_pool::Result;

/// A bidirectional byte stream to a spawned shell process.
///
/// Output arrives as raw chunks on [`Transport::output`]; the channel
/// disconnects when the process closes the stream.
pub trait Transport: Send + Sync {
    fn id(&self) -> Uuid;

    /// Write raw bytes to the process input.
    fn send(&self, data: &[u8]) -> Result<()>;

    /// Write a line followed by `\n`.
    fn send_line(&self, line: &str) -> Result<()> {
        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');
        self.send(&data)
    }

    fn output(&self) -> &flume::Receiver<Vec<u8>>;

    /// Forcibly terminate the process. Killing an already exited process is
    /// not an error.
    fn kill(&self) -> Result<()>;
}
