use std::path::PathBuf;

use ds_session::pty_pool::PtyError;
use ds_session::ShellError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContainerError {
    /// The container CLI exited non-zero; `stderr` is passed through verbatim.
    #[error("`{command}` failed:\n{stderr}")]
    Runtime { command: String, stderr: String },

    #[error("could not run container runtime: {0}")]
    Spawn(String),

    #[error("streaming the file is not allowed")]
    StreamingNotAllowed,

    #[error("host path with a container specifier is not allowed: {0}")]
    ContainerSpecifierNotAllowed(String),

    #[error("the requested file `{0}` is a directory")]
    IsDirectory(String),

    #[error("staging path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),

    #[error(transparent)]
    Shell(#[from] ShellError),

    #[error(transparent)]
    Pty(#[from] PtyError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ContainerError>;
