use ds_container::{create_container_from_image, Container, DockerRuntime};
use ds_core::config::Config;
use tracing::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
    Kill,
    Remove,
}

impl Action {
    fn name(self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Kill => "kill",
            Action::Remove => "rm",
        }
    }
}

pub async fn create(config: &Config, image: &str) -> anyhow::Result<()> {
    let runtime = DockerRuntime::new(config);
    let container = create_container_from_image(&runtime, image).await?;
    println!("{}", container.name());
    Ok(())
}

pub async fn apply(config: &Config, name: &str, action: Action) -> anyhow::Result<()> {
    let container = Container::new(DockerRuntime::new(config), name);
    let (span, _trace_id) = ds_telemetry::tracing_setup::create_operation_span(action.name(), name);
    async {
        match action {
            Action::Start => container.start().await,
            Action::Stop => container.stop().await,
            Action::Kill => container.kill().await,
            Action::Remove => container.remove().await,
        }
    }
    .instrument(span)
    .await?;
    Ok(())
}
