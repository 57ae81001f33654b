use std::time::Duration;

use tracing::{debug, info, warn};

use ds_core::config::ShellConfig;

use crate::bootstrap::bootstrap;
use crate::error::{Result, SessionPhase, ShellError};
use crate::expect::{ExpectError, ExpectStream, Pattern};
use crate::pty_pool::PtyPool;
use crate::quoting::{quote, ShellCommand};

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Idle; the last thing read from the stream was the prompt.
    AtPrompt,
    Sending,
    /// Waiting for `remaining` more continuation prompts.
    AwaitingContinuation { remaining: usize },
    Executing,
    /// An earlier command timed out or the stream failed.
    Poisoned,
    Closed,
}

// ---------------------------------------------------------------------------
// ShellSession
// ---------------------------------------------------------------------------

/// One interactive shell whose prompt has been replaced by a sentinel, so
/// that command completion can be detected from the output alone.
///
/// Commands take `&mut self`: only one can be in flight at a time.
pub struct ShellSession {
    stream: ExpectStream,
    sentinel: String,
    prompt: String,
    continuation: Pattern,
    timeout: Duration,
    state: SessionState,
}

impl ShellSession {
    pub(crate) fn new(stream: ExpectStream, sentinel: &str, config: &ShellConfig) -> Self {
        Self {
            stream,
            sentinel: sentinel.to_string(),
            prompt: format!("{sentinel} "),
            continuation: Pattern::exact(config.continuation_prompt.clone()),
            timeout: config.timeout(),
            state: SessionState::AtPrompt,
        }
    }

    /// Spawn `program` in a PTY from `pool` and bootstrap it.
    pub async fn open(
        pool: &PtyPool,
        program: &str,
        args: &[&str],
        sentinel: &str,
        config: &ShellConfig,
    ) -> Result<Self> {
        let handle = pool.spawn(program, args, &[("TERM", config.term.as_str())])?;
        info!(program, handle_id = %handle.id, "opening shell session");
        bootstrap(Box::new(handle), sentinel, config).await
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    /// The active prompt: the sentinel plus one space.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_usable(&self) -> bool {
        self.state == SessionState::AtPrompt
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Change the per-wait timeout for subsequent commands.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Run `command` and return its output with the final newline stripped.
    pub async fn run(&mut self, command: impl Into<ShellCommand>) -> Result<String> {
        self.run_command(command, &[], true).await
    }

    /// Run `command`, writing each of `extra_inputs` unescaped after the
    /// command line has been accepted, and wait for the prompt to return.
    ///
    /// The exit status is not captured; see [`ShellSession::last_exit_status`].
    /// Any error leaves the session poisoned.
    pub async fn run_command(
        &mut self,
        command: impl Into<ShellCommand>,
        extra_inputs: &[&[u8]],
        strip_final_newline: bool,
    ) -> Result<String> {
        match self.state {
            SessionState::AtPrompt => {}
            SessionState::Closed => return Err(ShellError::Closed),
            _ => return Err(ShellError::Poisoned),
        }

        self.stream.drain_available();
        let stacked = self.stream.discard_through_last(&self.prompt);
        if stacked > 0 {
            debug!(stacked, "discarded stacked prompts");
        }

        let command = command.into().to_shell_string();
        match self.exchange(&command, extra_inputs).await {
            Ok(raw) => {
                self.state = SessionState::AtPrompt;
                Ok(normalize_output(&raw, strip_final_newline))
            }
            Err(err) => {
                warn!(sentinel = %self.sentinel, "session poisoned: {err}");
                self.state = SessionState::Poisoned;
                Err(err)
            }
        }
    }

    async fn exchange(&mut self, command: &str, extra_inputs: &[&[u8]]) -> Result<String> {
        self.state = SessionState::Sending;
        debug!(command, "sending command");
        self.stream.send_line(command)?;

        let breaks = command.chars().filter(|c| matches!(c, '\r' | '\n')).count();
        let continuation = self.continuation.clone();
        for acknowledged in 0..breaks {
            self.state = SessionState::AwaitingContinuation {
                remaining: breaks - acknowledged,
            };
            self.wait(&continuation, SessionPhase::AwaitingContinuation, command)
                .await?;
        }

        for input in extra_inputs {
            self.stream.send(input)?;
        }

        self.state = SessionState::Executing;
        let prompt = Pattern::exact(self.prompt.clone());
        let before = self.wait(&prompt, SessionPhase::Executing, command).await?;
        String::from_utf8(before).map_err(|e| ShellError::NonText {
            phase: SessionPhase::Executing,
            output: String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    async fn wait(
        &mut self,
        pattern: &Pattern,
        phase: SessionPhase,
        command: &str,
    ) -> Result<Vec<u8>> {
        match self.stream.expect(pattern, self.timeout).await {
            Ok(m) => Ok(m.before),
            Err(ExpectError::Timeout) => Err(ShellError::Timeout {
                phase,
                command: command.to_string(),
            }),
            Err(ExpectError::Eof) => Err(ShellError::Failure {
                phase,
                output: String::from_utf8_lossy(&self.stream.take_pending()).into_owned(),
            }),
        }
    }

    /// Exit status of the previous command, via `echo $?`.
    pub async fn last_exit_status(&mut self) -> Result<i32> {
        let command = "echo $?";
        let output = self.run(command).await?;
        output
            .trim()
            .parse()
            .map_err(|_| ShellError::UnexpectedOutput {
                command: command.to_string(),
                output,
            })
    }

    /// Write `content` to `path` inside the environment.
    ///
    /// `echo` would swallow a leading `-n`/`-e`, so an empty first argument
    /// is printed ahead of the content and its separator space is cut off
    /// again with `tail -c +2`. Not meant for binary or very large files.
    pub async fn echo_file_to_container(&mut self, path: &str, content: &str) -> Result<String> {
        let command = format!(
            "echo -n \"\" {} | tail -c +2 > {}",
            quote(content),
            quote(path)
        );
        self.run(command).await
    }

    /// Read the text file at `path`. The final newline is kept.
    pub async fn cat_file_from_container(&mut self, path: &str) -> Result<String> {
        self.run_command(format!("cat {}", quote(path)), &[], false)
            .await
    }

    /// Forcibly terminate the shell process.
    pub fn kill(&mut self) -> Result<()> {
        info!(sentinel = %self.sentinel, "killing shell session");
        self.state = SessionState::Closed;
        self.stream.kill()?;
        Ok(())
    }
}

impl std::fmt::Debug for ShellSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellSession")
            .field("sentinel", &self.sentinel)
            .field("state", &self.state)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Collapse the CRLF pairs the terminal injects and optionally drop one
/// trailing newline.
pub fn normalize_output(raw: &str, strip_final_newline: bool) -> String {
    let mut text = raw.replace("\r\n", "\n");
    if strip_final_newline && text.ends_with('\n') {
        text.pop();
    }
    text
}
