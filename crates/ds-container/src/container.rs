use std::path::Path;

use ds_session::pty_pool::PtyPool;
use ds_session::sentinel::new_sentinel;
use ds_session::ShellSession;
use tracing::{debug, info, instrument};

use crate::error::{ContainerError, Result};
use crate::runtime::{DockerRuntime, LifecycleManager};
use crate::staging::StagedPath;

/// Create a container from `image` under a freshly allocated sentinel name.
pub async fn create_container_from_image(runtime: &DockerRuntime, image: &str) -> Result<Container> {
    let name = new_sentinel(&runtime.docker_config().container_prefix);
    runtime.create(&name, image).await?;
    Ok(Container::new(runtime.clone(), name))
}

/// A handle to a named container, running or not.
///
/// The handle does not own the container: dropping it leaves the container
/// in place. Call [`Container::kill`] and [`Container::remove`] when done.
#[derive(Debug, Clone)]
pub struct Container {
    runtime: DockerRuntime,
    name: String,
}

impl Container {
    pub fn new(runtime: DockerRuntime, name: impl Into<String>) -> Self {
        Self {
            runtime,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn start(&self) -> Result<()> {
        self.runtime.start(&self.name).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.runtime.stop(&self.name).await
    }

    pub async fn kill(&self) -> Result<()> {
        self.runtime.kill(&self.name).await
    }

    pub async fn remove(&self) -> Result<()> {
        self.runtime.remove(&self.name).await
    }

    /// Reject host paths that would make `cp` stream through stdio or address
    /// another container. A colon at index 1 is a Windows drive letter.
    pub fn check_host_path(path: &str) -> Result<()> {
        if path == "-" {
            return Err(ContainerError::StreamingNotAllowed);
        }
        match path.find(':') {
            Some(idx) if idx != 1 => Err(ContainerError::ContainerSpecifierNotAllowed(
                path.to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn host_path_str(path: &Path) -> Result<&str> {
        let s = path
            .to_str()
            .ok_or_else(|| ContainerError::NonUtf8Path(path.to_path_buf()))?;
        Self::check_host_path(s)?;
        Ok(s)
    }

    /// Copy a file or directory into the container.
    #[instrument(skip(self), fields(container = %self.name))]
    pub async fn push_file(&self, host_path: &Path, container_path: &str) -> Result<()> {
        let host = Self::host_path_str(host_path)?;
        let target = format!("{}:{container_path}", self.name);
        self.runtime.run_checked(&["cp", host, &target]).await?;
        Ok(())
    }

    /// Copy a file or directory out of the container.
    #[instrument(skip(self), fields(container = %self.name))]
    pub async fn pull_file(&self, container_path: &str, host_path: &Path) -> Result<()> {
        let host = Self::host_path_str(host_path)?;
        let source = format!("{}:{container_path}", self.name);
        self.runtime.run_checked(&["cp", &source, host]).await?;
        Ok(())
    }

    fn stage(&self) -> StagedPath {
        StagedPath::new(&self.runtime.docker_config().staging_dir(), &self.name)
    }

    /// Read a binary file from the container through a staged host copy.
    ///
    /// Prefer the shell session for text files.
    pub async fn read_binary_file(&self, container_path: &str) -> Result<Vec<u8>> {
        let staged = self.stage();
        let result = self.read_staged(container_path, staged.path()).await;
        let cleanup = staged.cleanup().await;
        let data = result?;
        cleanup?;
        debug!(container_path, len = data.len(), "read binary file");
        Ok(data)
    }

    async fn read_staged(&self, container_path: &str, staged: &Path) -> Result<Vec<u8>> {
        self.pull_file(container_path, staged).await?;
        if tokio::fs::metadata(staged).await?.is_dir() {
            return Err(ContainerError::IsDirectory(container_path.to_string()));
        }
        Ok(tokio::fs::read(staged).await?)
    }

    /// Write `data` to a file in the container through a staged host copy.
    pub async fn write_binary_file(&self, container_path: &str, data: &[u8]) -> Result<()> {
        let staged = self.stage();
        let result = async {
            tokio::fs::write(staged.path(), data).await?;
            self.push_file(staged.path(), container_path).await
        }
        .await;
        let cleanup = staged.cleanup().await;
        result?;
        cleanup?;
        debug!(container_path, len = data.len(), "wrote binary file");
        Ok(())
    }

    /// Open an interactive shell in the container. Several shells may be
    /// open at once; each is an independent session.
    pub async fn open_shell(&self, pool: &PtyPool) -> Result<ShellSession> {
        let shell = self.runtime.shell_config();
        let term_env = format!("TERM={}", shell.term);
        let args = [
            "exec",
            "-it",
            "--env",
            term_env.as_str(),
            self.name.as_str(),
            shell.program.as_str(),
        ];
        info!(container = %self.name, "opening shell");
        let session =
            ShellSession::open(pool, self.runtime.executable(), &args, &self.name, shell).await?;
        Ok(session)
    }
}
