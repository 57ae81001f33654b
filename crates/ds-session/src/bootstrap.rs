//! Prompt negotiation for a freshly spawned shell.
//!
//! Each [`BootstrapStage`] sends zero or more lines and optionally waits for a
//! pattern before the next stage runs. Any failed wait kills the transport;
//! no session is returned unless the sentinel prompt was observed.

use tracing::{debug, info, warn};

use ds_core::config::ShellConfig;

use crate::error::{Result, SessionPhase, ShellError};
use crate::expect::{ExpectError, ExpectStream, Pattern};
use crate::quoting::quote;
use crate::session::ShellSession;
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStage {
    /// Wait for the shell's stock prompt.
    AwaitShellPrompt,
    /// `stty -echo`, then wait for the stock prompt again.
    DisableEcho,
    ClearPrompt,
    /// Stop startup tooling from rewriting the prompt.
    NeutralizeHooks,
    InstallSentinel,
    /// Wait for the sentinel prompt itself.
    ConfirmSentinel,
}

impl BootstrapStage {
    pub const FIRST: BootstrapStage = BootstrapStage::AwaitShellPrompt;

    pub fn next(self) -> Option<BootstrapStage> {
        use BootstrapStage::*;
        match self {
            AwaitShellPrompt => Some(DisableEcho),
            DisableEcho => Some(ClearPrompt),
            ClearPrompt => Some(NeutralizeHooks),
            NeutralizeHooks => Some(InstallSentinel),
            InstallSentinel => Some(ConfirmSentinel),
            ConfirmSentinel => None,
        }
    }

    pub fn name(self) -> &'static str {
        use BootstrapStage::*;
        match self {
            AwaitShellPrompt => "await shell prompt",
            DisableEcho => "disable echo",
            ClearPrompt => "clear prompt",
            NeutralizeHooks => "neutralize prompt hooks",
            InstallSentinel => "install sentinel",
            ConfirmSentinel => "confirm sentinel",
        }
    }
}

impl std::fmt::Display for BootstrapStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

struct StageStep {
    lines: Vec<String>,
    wait: Option<Pattern>,
}

struct Plan<'a> {
    config: &'a ShellConfig,
    prompt: String,
    ready: Pattern,
}

impl Plan<'_> {
    fn step(&self, stage: BootstrapStage) -> StageStep {
        use BootstrapStage::*;
        match stage {
            AwaitShellPrompt => StageStep {
                lines: Vec::new(),
                wait: Some(self.ready.clone()),
            },
            DisableEcho => StageStep {
                lines: vec!["stty -echo".into()],
                wait: Some(self.ready.clone()),
            },
            ClearPrompt => StageStep {
                lines: vec!["PS1=''".into()],
                wait: None,
            },
            NeutralizeHooks => StageStep {
                lines: self.config.neutralize_hooks.clone(),
                wait: None,
            },
            InstallSentinel => StageStep {
                lines: vec![format!("PS1={}", quote(&self.prompt))],
                wait: None,
            },
            ConfirmSentinel => StageStep {
                lines: Vec::new(),
                wait: Some(Pattern::exact(self.prompt.clone())),
            },
        }
    }
}

fn abort(stream: &mut ExpectStream, err: ShellError) -> ShellError {
    warn!("shell bootstrap failed, killing stream: {err}");
    if let Err(e) = stream.kill() {
        debug!("kill after failed bootstrap: {e}");
    }
    err
}

/// Negotiate `sentinel + " "` as the prompt of the shell behind `transport`.
pub async fn bootstrap(
    transport: Box<dyn Transport>,
    sentinel: &str,
    config: &ShellConfig,
) -> Result<ShellSession> {
    let mut stream = ExpectStream::new(transport);
    let ready = match Pattern::regex(&config.ready_pattern) {
        Ok(p) => p,
        Err(e) => return Err(abort(&mut stream, e.into())),
    };
    let plan = Plan {
        config,
        prompt: format!("{sentinel} "),
        ready,
    };
    let timeout = config.timeout();

    let mut last_sent = String::new();
    let mut stage = Some(BootstrapStage::FIRST);
    while let Some(current) = stage {
        debug!(stage = %current, "bootstrap stage");
        let step = plan.step(current);

        for line in &step.lines {
            if let Err(e) = stream.send_line(line) {
                return Err(abort(&mut stream, e.into()));
            }
            last_sent.clone_from(line);
        }

        if let Some(pattern) = step.wait {
            let phase = SessionPhase::Bootstrap(current);
            match stream.expect(&pattern, timeout).await {
                Ok(_) => {}
                Err(ExpectError::Timeout) => {
                    let command = if last_sent.is_empty() {
                        format!("<waiting for {pattern}>")
                    } else {
                        last_sent.clone()
                    };
                    return Err(abort(&mut stream, ShellError::Timeout { phase, command }));
                }
                Err(ExpectError::Eof) => {
                    let output = String::from_utf8_lossy(&stream.take_pending()).into_owned();
                    return Err(abort(&mut stream, ShellError::Failure { phase, output }));
                }
            }
        }

        stage = current.next();
    }

    info!(sentinel, "shell session ready");
    Ok(ShellSession::new(stream, sentinel, config))
}
