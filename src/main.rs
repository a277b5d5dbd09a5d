// ABOUTME: Entry point for the lambdeploy CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use lambdeploy::config::Config;
use lambdeploy::error::Result;
use lambdeploy::output::{Output, OutputMode};
use std::env;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };

    if let Err(e) = run(cli, mode).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let cwd = env::current_dir()?;
    let output = Output::new(mode);

    match cli.command {
        Commands::Deploy {
            environment,
            event_sources,
            dry_run,
        } => {
            let config = load_config(&cwd, cli.config.as_deref(), environment.as_deref())?;
            commands::deploy(config, &cwd, event_sources, dry_run, output).await
        }
        Commands::Package {
            environment,
            output_dir,
        } => {
            let config = load_config(&cwd, cli.config.as_deref(), environment.as_deref())?;
            let output_dir = output_dir.map(|dir| absolutize(&cwd, dir));
            commands::package(config, &cwd, output_dir, output).await
        }
    }
}

/// Load the explicit or discovered config and apply the environment, if any.
fn load_config(cwd: &Path, path: Option<&Path>, environment: Option<&str>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(&absolutize(cwd, path.to_path_buf()))?,
        None => Config::discover(cwd)?,
    };

    match environment {
        Some(name) => config.for_environment(name),
        None => Ok(config),
    }
}

fn absolutize(cwd: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}
