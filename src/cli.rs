// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lambdeploy")]
#[command(about = "Build and deploy serverless functions with their event sources across regions")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Emit JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to the configuration file (default: discovered in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the artifact and deploy it to every configured region
    Deploy {
        /// Target environment; suffixes the function name and applies overrides
        #[arg(short, long)]
        environment: Option<String>,

        /// Event sources document (overrides deploy.event_sources)
        #[arg(long)]
        event_sources: Option<PathBuf>,

        /// Reconcile against an empty in-memory platform instead of the real one
        #[arg(long)]
        dry_run: bool,
    },

    /// Build the artifact and write it to the output directory
    Package {
        /// Target environment; suffixes the archive name and applies overrides
        #[arg(short, long)]
        environment: Option<String>,

        /// Directory to write the archive to (overrides build.output_dir)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}
