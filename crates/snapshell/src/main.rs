//! Snapshell CLI - post-build static prerendering pipeline.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;
mod pipeline;

#[derive(Parser)]
#[command(name = "snapshell")]
#[command(about = "Render, prerender, and staticize a bundled single-page app")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to snapshell.toml config file
    #[arg(short, long, default_value = "snapshell.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: shell, prerender, correct, persist
    Render {
        /// Built output directory (defaults to config or "dist")
        #[arg(short, long)]
        dist: Option<PathBuf>,
    },

    /// Render the shell and headers only, skipping the browser
    Shell {
        /// Built output directory (defaults to config or "dist")
        #[arg(short, long)]
        dist: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    // Execute command
    match cli.command {
        Commands::Render { dist } => {
            commands::render::run(cli.config, dist).await?;
        }
        Commands::Shell { dist } => {
            commands::shell::run(cli.config, dist).await?;
        }
    }

    Ok(())
}
