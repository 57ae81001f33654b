mod commands;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ds_core::config::Config;

/// dockshell -- drive interactive shells inside Docker containers.
#[derive(Parser)]
#[command(name = "ds", version, about)]
struct Cli {
    /// Config file (default: ~/.dockshell/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs and results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a container from an image and print its name.
    Create { image: String },

    /// Start a container.
    Start { name: String },

    /// Stop a container gracefully.
    Stop { name: String },

    /// Kill a container.
    Kill { name: String },

    /// Remove a container (forcefully).
    Rm { name: String },

    /// Run one command in a running container's shell.
    Exec {
        name: String,
        #[command(flatten)]
        opts: commands::exec::ExecArgs,
    },

    /// Create and start a container, run one command, then kill and remove it.
    Run {
        image: String,
        #[command(flatten)]
        opts: commands::exec::ExecArgs,
    },

    /// Copy a host file or directory into a container.
    Push {
        name: String,
        host_path: PathBuf,
        container_path: String,
    },

    /// Copy a file or directory out of a container.
    Pull {
        name: String,
        container_path: String,
        host_path: PathBuf,
    },
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(&path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Config::load().context("loading config"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config)?;

    if cli.json {
        ds_telemetry::logging::init_logging_json("ds", &config.general.log_level);
    } else {
        ds_telemetry::logging::init_logging("ds", &config.general.log_level);
    }

    match cli.command {
        Commands::Create { image } => commands::lifecycle::create(&config, &image).await?,
        Commands::Start { name } => {
            commands::lifecycle::apply(&config, &name, commands::lifecycle::Action::Start).await?
        }
        Commands::Stop { name } => {
            commands::lifecycle::apply(&config, &name, commands::lifecycle::Action::Stop).await?
        }
        Commands::Kill { name } => {
            commands::lifecycle::apply(&config, &name, commands::lifecycle::Action::Kill).await?
        }
        Commands::Rm { name } => {
            commands::lifecycle::apply(&config, &name, commands::lifecycle::Action::Remove).await?
        }
        Commands::Exec { name, opts } => {
            commands::exec::exec(&config, &name, &opts, cli.json).await?
        }
        Commands::Run { image, opts } => {
            commands::exec::run(&config, &image, &opts, cli.json).await?
        }
        Commands::Push {
            name,
            host_path,
            container_path,
        } => commands::copy::push(&config, &name, &host_path, &container_path).await?,
        Commands::Pull {
            name,
            container_path,
            host_path,
        } => commands::copy::pull(&config, &name, &container_path, &host_path).await?,
    }

    Ok(())
}
