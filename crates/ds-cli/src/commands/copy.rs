use std::path::Path;

use ds_container::{Container, DockerRuntime};
use ds_core::config::Config;

pub async fn push(
    config: &Config,
    name: &str,
    host_path: &Path,
    container_path: &str,
) -> anyhow::Result<()> {
    let container = Container::new(DockerRuntime::new(config), name);
    container.push_file(host_path, container_path).await?;
    Ok(())
}

pub async fn pull(
    config: &Config,
    name: &str,
    container_path: &str,
    host_path: &Path,
) -> anyhow::Result<()> {
    let container = Container::new(DockerRuntime::new(config), name);
    container.pull_file(container_path, host_path).await?;
    Ok(())
}
