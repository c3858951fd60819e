//! Show command

use super::print_json;
use crate::state;
use anyhow::{bail, Result};
use clap::Args;
use deployer_store::FunctionStore;
use std::path::PathBuf;
use std::process::ExitCode;

/// Arguments for `show`
#[derive(Args)]
pub struct ShowArgs {
    /// Function name or ARN
    #[arg(short, long)]
    pub function: String,

    /// Store snapshot
    #[arg(short, long, default_value = "deployer-state.json")]
    pub state: PathBuf,
}

pub async fn execute(args: ShowArgs) -> Result<ExitCode> {
    let store = state::load_store(&args.state)?;

    let Some(record) = store.get_function(&args.function).await? else {
        bail!("function not found: {}", args.function);
    };
    let versions = store.list_versions(&record.arn).await?;
    let aliases = store.list_aliases(&record.arn).await?;

    print_json(&serde_json::json!({
        "name": record.name,
        "arn": record.arn,
        "configuration": record.configuration,
        "configuration_hash": record.configuration_hash,
        "code_hash": record.code_hash,
        "versions": versions,
        "aliases": aliases,
    }))?;
    Ok(ExitCode::SUCCESS)
}
