//! Pattern waits over a shell transport's output.
//!
//! Output chunks accumulate in an unread buffer. A successful wait splits the
//! buffer at the first match: the text before it is returned, the match is
//! consumed, and whatever follows stays buffered for the next wait.

use std::time::Duration;

use regex::bytes::Regex;
use tracing::trace;

use crate::pty_pool::Result;
use crate::transport::Transport;

/// What a wait looks for.
#[derive(Debug, Clone)]
pub enum Pattern {
    Exact(String),
    Regex(Regex),
}

impl Pattern {
    pub fn exact(text: impl Into<String>) -> Self {
        Pattern::Exact(text.into())
    }

    pub fn regex(pattern: &str) -> std::result::Result<Self, regex::Error> {
        Ok(Pattern::Regex(Regex::new(pattern)?))
    }

    /// Byte range of the first match in `haystack`.
    pub fn find(&self, haystack: &[u8]) -> Option<(usize, usize)> {
        self.find_after(haystack, 0)
    }

    /// Like [`Pattern::find`], given that `haystack[..scanned]` was already
    /// searched without a match. Exact patterns only look at the unsearched
    /// tail plus enough overlap for a match straddling the boundary; regexes
    /// have no bounded match length and search everything again.
    pub fn find_after(&self, haystack: &[u8], scanned: usize) -> Option<(usize, usize)> {
        match self {
            Pattern::Exact(needle) => {
                let from = scanned
                    .saturating_sub(needle.len().saturating_sub(1))
                    .min(haystack.len());
                find_bytes(&haystack[from..], needle.as_bytes())
                    .map(|offset| (from + offset, from + offset + needle.len()))
            }
            Pattern::Regex(re) => re.find(haystack).map(|m| (m.start(), m.end())),
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pattern::Exact(s) => write!(f, "{s:?}"),
            Pattern::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// The result of a successful wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub before: Vec<u8>,
    pub matched: Vec<u8>,
}

/// Why a wait ended without a match. Whatever was read stays available via
/// [`ExpectStream::pending`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectError {
    Timeout,
    Eof,
}

pub struct ExpectStream {
    transport: Box<dyn Transport>,
    buffer: Vec<u8>,
    eof: bool,
}

impl ExpectStream {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            buffer: Vec::new(),
            eof: false,
        }
    }

    pub fn send(&self, data: &[u8]) -> Result<()> {
        trace!(len = data.len(), "stream send");
        self.transport.send(data)
    }

    pub fn send_line(&self, line: &str) -> Result<()> {
        trace!(line, "stream send line");
        self.transport.send_line(line)
    }

    pub fn kill(&self) -> Result<()> {
        self.transport.kill()
    }

    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Bytes received but not yet consumed by a wait.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    pub fn take_pending(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    fn consume(&mut self, start: usize, end: usize) -> Match {
        let rest = self.buffer.split_off(end);
        let mut before = std::mem::replace(&mut self.buffer, rest);
        let matched = before.split_off(start);
        Match { before, matched }
    }

    /// Wait until `pattern` shows up in the stream, for at most `timeout`.
    pub async fn expect(
        &mut self,
        pattern: &Pattern,
        timeout: Duration,
    ) -> std::result::Result<Match, ExpectError> {
        let deadline = tokio::time::Instant::now() + timeout;
        let mut scanned = 0;
        loop {
            if let Some((start, end)) = pattern.find_after(&self.buffer, scanned) {
                trace!(%pattern, "pattern matched");
                return Ok(self.consume(start, end));
            }
            scanned = self.buffer.len();
            if self.eof {
                return Err(ExpectError::Eof);
            }
            // `timeout_at` hands out a queued chunk even past the deadline.
            if tokio::time::Instant::now() >= deadline {
                return Err(ExpectError::Timeout);
            }
            let chunk = tokio::time::timeout_at(deadline, self.transport.output().recv_async());
            match chunk.await {
                Ok(Ok(data)) => {
                    trace!(len = data.len(), "stream received");
                    self.buffer.extend_from_slice(&data);
                    // flume does not take part in tokio's task budget.
                    tokio::task::coop::consume_budget().await;
                }
                Ok(Err(_)) => self.eof = true,
                Err(_) => return Err(ExpectError::Timeout),
            }
        }
    }

    /// Move every chunk that has already arrived into the buffer without
    /// waiting. Returns the number of bytes added.
    pub fn drain_available(&mut self) -> usize {
        let mut added = 0;
        loop {
            match self.transport.output().try_recv() {
                Ok(data) => {
                    added += data.len();
                    self.buffer.extend_from_slice(&data);
                }
                Err(flume::TryRecvError::Empty) => break,
                Err(flume::TryRecvError::Disconnected) => {
                    self.eof = true;
                    break;
                }
            }
        }
        added
    }

    /// Consume the buffer through the last occurrence of `needle`, one
    /// occurrence at a time. Returns how many occurrences were discarded.
    pub fn discard_through_last(&mut self, needle: &str) -> usize {
        let pattern = Pattern::exact(needle);
        let mut through = 0;
        let mut discarded = 0;
        while let Some((_, end)) = pattern.find(&self.buffer[through..]) {
            through += end;
            discarded += 1;
        }
        self.buffer.drain(..through);
        discarded
    }
}
