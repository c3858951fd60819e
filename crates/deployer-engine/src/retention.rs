//! Version retention
//!
//! Keeps the number of published versions that no alias points at under a
//! configured maximum by deleting the oldest ones.

use crate::error::{DeployError, FailedDeletion, Result};
use deployer_store::{FunctionStore, StoreError};
use deployer_types::VersionId;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Choose which versions to delete so at most `max` unaliased versions remain
///
/// `$LATEST` and every version in `referenced` are never selected. The
/// result holds the oldest candidates, in ascending order.
pub fn select_for_deletion(
    versions: impl IntoIterator<Item = VersionId>,
    referenced: impl IntoIterator<Item = VersionId>,
    max: usize,
) -> Vec<VersionId> {
    let referenced: BTreeSet<VersionId> = referenced.into_iter().collect();

    let candidates: BTreeSet<VersionId> = versions
        .into_iter()
        .filter(|v| !v.is_latest() && !referenced.contains(v))
        .collect();

    let excess = candidates.len().saturating_sub(max);
    candidates.into_iter().take(excess).collect()
}

/// Deletes unaliased versions beyond the retention maximum
pub struct RetentionPruner {
    store: Arc<dyn FunctionStore>,
}

impl RetentionPruner {
    pub fn new(store: Arc<dyn FunctionStore>) -> Self {
        Self { store }
    }

    /// Prune `function` down to `max_unaliased` unaliased versions
    ///
    /// Deletions run one at a time. A failed deletion does not stop the
    /// rest; failures are reported together once every candidate was tried.
    #[instrument(skip(self))]
    pub async fn prune(&self, function: &str, max_unaliased: u32) -> Result<BTreeSet<VersionId>> {
        let versions = self.store.list_versions(function).await?;
        let aliases = self.store.list_aliases(function).await?;

        let selected = select_for_deletion(
            versions.into_iter().map(|v| v.id),
            aliases.into_iter().map(|a| a.function_version),
            max_unaliased as usize,
        );

        if selected.is_empty() {
            debug!("Nothing to prune");
            return Ok(BTreeSet::new());
        }

        let mut deleted = Vec::with_capacity(selected.len());
        let mut failed = Vec::new();

        for version in selected {
            match self.store.delete_version(function, version).await {
                Ok(()) => {
                    debug!(%version, "Version deleted");
                    deleted.push(version);
                }
                Err(StoreError::NotFound(_)) => {
                    debug!(%version, "Version already gone");
                    deleted.push(version);
                }
                Err(err) => {
                    warn!(%version, error = %err, "Failed to delete version");
                    failed.push(FailedDeletion {
                        version,
                        reason: err.to_string(),
                    });
                }
            }
        }

        if !failed.is_empty() {
            return Err(DeployError::DeletionPartialFailure { deleted, failed });
        }

        info!(count = deleted.len(), "Pruned versions");
        Ok(deleted.into_iter().collect())
    }
}
