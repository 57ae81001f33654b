use thiserror::Error;

use crate::bootstrap::BootstrapStage;
use crate::pty_pool::PtyError;

/// Where in the protocol a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Bootstrap(BootstrapStage),
    Sending,
    AwaitingContinuation,
    Executing,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::Bootstrap(stage) => write!(f, "bootstrap ({stage})"),
            SessionPhase::Sending => f.write_str("sending"),
            SessionPhase::AwaitingContinuation => f.write_str("awaiting continuation prompt"),
            SessionPhase::Executing => f.write_str("executing"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ShellError {
    /// A pattern wait ran past its deadline.
    #[error("shell timeout while {phase}; command:\n{command}")]
    Timeout { phase: SessionPhase, command: String },

    /// The stream ended while a prompt was still expected.
    #[error("shell closed while {phase}; output before failure:\n{output}")]
    Failure { phase: SessionPhase, output: String },

    /// The shell produced bytes that are not valid UTF-8.
    #[error("shell returned non-text output while {phase}")]
    NonText { phase: SessionPhase, output: String },

    #[error("unexpected output from `{command}`: {output:?}")]
    UnexpectedOutput { command: String, output: String },

    #[error("session is unusable after an earlier timeout or failure")]
    Poisoned,

    #[error("session has been killed")]
    Closed,

    #[error("invalid prompt pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Pty(#[from] PtyError),
}

pub type Result<T> = std::result::Result<T, ShellError>;

impl ShellError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ShellError::Timeout { .. })
    }

    /// Stream ended or produced non-text output.
    pub fn is_failure(&self) -> bool {
        matches!(self, ShellError::Failure { .. } | ShellError::NonText { .. })
    }

    pub fn phase(&self) -> Option<SessionPhase> {
        match self {
            ShellError::Timeout { phase, .. }
            | ShellError::Failure { phase, .. }
            | ShellError::NonText { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}
