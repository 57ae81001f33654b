use anyhow::Context;
use clap::Args;
use ds_container::{create_container_from_image, Container, DockerRuntime};
use ds_core::config::Config;
use ds_session::pty_pool::PtyPool;
use ds_session::ShellCommand;
use serde_json::json;
use tracing::{warn, Instrument};

#[derive(Debug, Clone, Args)]
pub struct ExecArgs {
    /// Send the tokens joined by spaces, unquoted, so shell syntax applies.
    #[arg(long)]
    pub raw: bool,

    /// Keep the final newline of the output.
    #[arg(long)]
    pub keep_newline: bool,

    /// Also report the command's exit status.
    #[arg(long)]
    pub status: bool,

    /// The command to run.
    #[arg(trailing_var_arg = true, required = true)]
    pub command: Vec<String>,
}

impl ExecArgs {
    pub fn shell_command(&self) -> ShellCommand {
        if self.raw {
            ShellCommand::Line(self.command.join(" "))
        } else {
            ShellCommand::Argv(self.command.clone())
        }
    }
}

struct ExecOutcome {
    output: String,
    exit_status: Option<i32>,
}

async fn run_in(config: &Config, container: &Container, opts: &ExecArgs) -> anyhow::Result<ExecOutcome> {
    let pool = PtyPool::new(config.shell.max_sessions);
    let mut shell = container
        .open_shell(&pool)
        .await
        .with_context(|| format!("opening shell in {}", container.name()))?;

    let output = shell
        .run_command(opts.shell_command(), &[], !opts.keep_newline)
        .await?;
    let exit_status = if opts.status {
        Some(shell.last_exit_status().await?)
    } else {
        None
    };
    if let Err(e) = shell.kill() {
        warn!("closing shell: {e}");
    }
    Ok(ExecOutcome {
        output,
        exit_status,
    })
}

fn report(container: &str, outcome: &ExecOutcome, json_output: bool) {
    if json_output {
        println!(
            "{}",
            json!({
                "container": container,
                "output": outcome.output,
                "exit_status": outcome.exit_status,
            })
        );
        return;
    }
    if needs_trailing_newline(&outcome.output) {
        println!("{}", outcome.output);
    } else {
        print!("{}", outcome.output);
    }
    if let Some(status) = outcome.exit_status {
        eprintln!("exit status: {status}");
    }
}

fn needs_trailing_newline(output: &str) -> bool {
    !output.is_empty() && !output.ends_with('\n')
}

pub async fn exec(config: &Config, name: &str, opts: &ExecArgs, json_output: bool) -> anyhow::Result<()> {
    let container = Container::new(DockerRuntime::new(config), name);
    let (span, _trace_id) = ds_telemetry::tracing_setup::create_operation_span("exec", name);
    let outcome = run_in(config, &container, opts).instrument(span).await?;
    report(name, &outcome, json_output);
    Ok(())
}

pub async fn run(config: &Config, image: &str, opts: &ExecArgs, json_output: bool) -> anyhow::Result<()> {
    let runtime = DockerRuntime::new(config);
    let container = create_container_from_image(&runtime, image).await?;
    let (span, _trace_id) = ds_telemetry::tracing_setup::create_operation_span("run", container.name());

    let result = async {
        container.start().await?;
        run_in(config, &container, opts).await
    }
    .instrument(span)
    .await;

    if let Err(e) = container.kill().await {
        warn!(container = container.name(), "kill failed: {e}");
    }
    if let Err(e) = container.remove().await {
        warn!(container = container.name(), "remove failed: {e}");
    }

    let outcome = result?;
    report(container.name(), &outcome, json_output);
    Ok(())
}
