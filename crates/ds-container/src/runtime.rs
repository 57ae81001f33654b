use std::process::Output;

use async_trait::async_trait;
use ds_core::config::{Config, DockerConfig, ShellConfig};
use tracing::{debug, info, instrument};

use crate::error::{ContainerError, Result};

// ---------------------------------------------------------------------------
// LifecycleManager trait
// ---------------------------------------------------------------------------

/// Blocking lifecycle calls on a named execution environment. Each call
/// either completes or fails with the runtime's diagnostic output.
#[async_trait]
pub trait LifecycleManager: Send + Sync {
    async fn create(&self, name: &str, image: &str) -> Result<()>;

    async fn start(&self, name: &str) -> Result<()>;

    async fn stop(&self, name: &str) -> Result<()>;

    /// Stop without a graceful shutdown.
    async fn kill(&self, name: &str) -> Result<()>;

    /// Delete the environment, forcefully.
    async fn remove(&self, name: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// DockerRuntime
// ---------------------------------------------------------------------------

/// The Docker CLI (or anything speaking its command line, such as podman).
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: DockerConfig,
    shell: ShellConfig,
}

impl DockerRuntime {
    pub fn new(config: &Config) -> Self {
        Self {
            docker: config.docker.clone(),
            shell: config.shell.clone(),
        }
    }

    pub fn executable(&self) -> &str {
        &self.docker.executable
    }

    pub fn docker_config(&self) -> &DockerConfig {
        &self.docker
    }

    pub fn shell_config(&self) -> &ShellConfig {
        &self.shell
    }

    /// Check if the runtime answers `info`.
    pub async fn is_available(&self) -> bool {
        match tokio::process::Command::new(self.executable())
            .arg("info")
            .output()
            .await
        {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }

    /// Run the CLI with `args`, failing on a non-zero exit.
    pub(crate) async fn run_checked(&self, args: &[&str]) -> Result<Output> {
        debug!(args = ?args, "invoking container runtime");
        let output = tokio::process::Command::new(self.executable())
            .args(args)
            .output()
            .await
            .map_err(|e| ContainerError::Spawn(format!("{}: {e}", self.executable())))?;

        if !output.status.success() {
            return Err(ContainerError::Runtime {
                command: format!("{} {}", self.executable(), args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(output)
    }
}

#[async_trait]
impl LifecycleManager for DockerRuntime {
    #[instrument(skip(self))]
    async fn create(&self, name: &str, image: &str) -> Result<()> {
        self.run_checked(&["create", "-it", "--name", name, image])
            .await?;
        info!("container created");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn start(&self, name: &str) -> Result<()> {
        self.run_checked(&["start", name]).await?;
        info!("container started");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn stop(&self, name: &str) -> Result<()> {
        self.run_checked(&["stop", name]).await?;
        info!("container stopped");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn kill(&self, name: &str) -> Result<()> {
        self.run_checked(&["kill", name]).await?;
        info!("container killed");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, name: &str) -> Result<()> {
        self.run_checked(&["rm", "-f", name]).await?;
        info!("container removed");
        Ok(())
    }
}
