//! Prune command

use super::print_json;
use crate::state;
use anyhow::Result;
use clap::Args;
use deployer_engine::RetentionPruner;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;

/// Arguments for `prune`
#[derive(Args)]
pub struct PruneArgs {
    /// Function name or ARN
    #[arg(short, long)]
    pub function: String,

    /// Unaliased versions to keep
    #[arg(short, long)]
    pub keep: u32,

    /// Store snapshot
    #[arg(short, long, default_value = "deployer-state.json")]
    pub state: PathBuf,
}

pub async fn execute(args: PruneArgs) -> Result<ExitCode> {
    let store = Arc::new(state::load_store(&args.state)?);
    let pruner = RetentionPruner::new(store.clone());

    let result = pruner.prune(&args.function, args.keep).await;
    state::save_store(&store, &args.state)?;

    match result {
        Ok(deleted) => {
            print_json(&serde_json::json!({ "function": args.function, "deleted": deleted }))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!(kind = %err.kind(), error = %err, "Prune failed");
            print_json(&serde_json::json!({
                "function": args.function,
                "kind": err.kind(),
                "error": err.to_string(),
            }))?;
            Ok(ExitCode::FAILURE)
        }
    }
}
