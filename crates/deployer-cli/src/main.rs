//! Deployer CLI - Run deployments against a local function store
//!
//! The store lives in a JSON snapshot file so consecutive invocations see
//! each other's versions and aliases:
//! - `deploy` feeds an upload notification through the full pipeline
//! - `prune` applies a retention limit to one function
//! - `show` prints a function's versions and aliases

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod state;

use commands::{deploy, prune, show};

/// Deployer CLI application
#[derive(Parser)]
#[command(name = "deployer")]
#[command(about = "Function deployer - Reconcile functions from uploaded artifacts", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level
    #[arg(long, env = "DEPLOYER_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "DEPLOYER_LOG_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Deploy the artifact named by an upload notification
    Deploy(deploy::DeployArgs),

    /// Delete unaliased versions beyond a limit
    Prune(prune::PruneArgs),

    /// Show a function's versions and aliases
    Show(show::ShowArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries command output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    if cli.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    match cli.command {
        Commands::Deploy(args) => deploy::execute(args).await,
        Commands::Prune(args) => prune::execute(args).await,
        Commands::Show(args) => show::execute(args).await,
    }
}
