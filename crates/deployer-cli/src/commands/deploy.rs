//! Deploy command

use super::print_json;
use crate::state;
use anyhow::{Context, Result};
use clap::Args;
use deployer_engine::{DeployerConfig, DeploymentOrchestrator, RetentionPolicy};
use deployer_store::InMemoryMetadataSource;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

/// Arguments for `deploy`
#[derive(Args)]
pub struct DeployArgs {
    /// Upload notification JSON
    #[arg(short, long)]
    pub event: PathBuf,

    /// Store snapshot, created if missing
    #[arg(short, long, default_value = "deployer-state.json")]
    pub state: PathBuf,

    /// Catalog of uploaded objects and their attributes
    #[arg(short, long)]
    pub metadata: PathBuf,

    /// Execution role, overriding DEPLOYER_FUNCTION_ROLE_ARN
    #[arg(long)]
    pub role: Option<String>,

    /// Retention limit, overriding DEPLOYER_POLICY_MAX_UNALIASED_VERSIONS
    #[arg(long)]
    pub keep: Option<u32>,
}

pub async fn execute(args: DeployArgs) -> Result<ExitCode> {
    let mut config = DeployerConfig::from_env().context("invalid deployer configuration")?;
    if let Some(role) = args.role {
        config.execution_role = Some(role);
    }
    if let Some(keep) = args.keep {
        config = config.with_retention(RetentionPolicy::keep(keep));
    }

    let payload = std::fs::read_to_string(&args.event)
        .with_context(|| format!("failed to read event {}", args.event.display()))?;

    let store = Arc::new(state::load_store(&args.state)?);
    let metadata = Arc::new(InMemoryMetadataSource::new());
    state::register_catalog(state::load_catalog(&args.metadata)?, &store, &metadata)?;

    let orchestrator = DeploymentOrchestrator::new(config, store.clone(), metadata);
    let outcome = orchestrator.handle_event(&payload).await;

    // Failed runs may still have changed the store
    state::save_store(&store, &args.state)?;
    info!(status = outcome.status(), "Deploy finished");

    print_json(&outcome)?;
    Ok(if outcome.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
