//! Request/response access to an interactive shell over a PTY.
//!
//! A shell is spawned in a pseudo-terminal, its echo is disabled and its
//! prompt replaced by a random sentinel. From then on a command is complete
//! exactly when the sentinel prompt shows up again in the output stream.
//!
//! Key components:
//! - [`quoting`]: shell literals that survive any input, control bytes included
//! - [`sentinel`]: random prompt / container / staging names
//! - [`pty_pool`]: PTY process spawning, bounded per pool
//! - [`expect`]: pattern waits over the raw output stream
//! - [`bootstrap`]: prompt negotiation as an explicit stage machine
//! - [`session`]: the send / continuation / completion state machine

pub mod bootstrap;
pub mod error;
pub mod expect;
pub mod pty_pool;
pub mod quoting;
pub mod sentinel;
pub mod session;
pub mod transport;

pub use bootstrap::{bootstrap, BootstrapStage};
pub use error::{SessionPhase, ShellError};
pub use quoting::{command_to_string, quote, ShellCommand};
pub use session::{ShellSession, SessionState};
pub use transport::Transport;
