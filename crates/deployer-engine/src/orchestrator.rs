//! Deployment orchestration
//!
//! Runs one deployment per uploaded artifact:
//!
//! ```text
//! Start -> MetadataLoaded -> FunctionReconciled -> AliasReconciled
//!       -> PruneSkipped | PruneCompleted -> Done
//! ```
//!
//! Any stage may fail instead, which ends the run in `Failed(stage)`. Stages
//! are awaited one after another and nothing is retried.

use crate::alias::AliasReconciler;
use crate::config::DeployerConfig;
use crate::error::{DeployError, DeploymentStage, StageError};
use crate::function::FunctionReconciler;
use crate::outcome::DeploymentOutcome;
use crate::retention::RetentionPruner;
use deployer_store::{ArtifactMetadataSource, FunctionStore, StoreError};
use deployer_types::{ArtifactLocation, DesiredStateDescriptor, UploadEvent, VersionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// States a deployment passes through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentState {
    Start,
    MetadataLoaded,
    FunctionReconciled,
    AliasReconciled,
    PruneSkipped,
    PruneCompleted,
    Done,
    Failed(DeploymentStage),
}

/// Summary of a successful deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentReport {
    pub function_arn: String,

    /// Version published by this deployment
    pub version: VersionId,

    pub alias_arn: String,

    /// Versions removed by the retention pass
    #[serde(default)]
    pub pruned: BTreeSet<VersionId>,

    /// States visited, in order
    pub states: Vec<DeploymentState>,
}

/// Sequences metadata loading, reconciliation and retention
pub struct DeploymentOrchestrator {
    config: DeployerConfig,
    store: Arc<dyn FunctionStore>,
    metadata: Arc<dyn ArtifactMetadataSource>,
    aliases: AliasReconciler,
    pruner: RetentionPruner,
}

impl DeploymentOrchestrator {
    pub fn new(
        config: DeployerConfig,
        store: Arc<dyn FunctionStore>,
        metadata: Arc<dyn ArtifactMetadataSource>,
    ) -> Self {
        Self {
            aliases: AliasReconciler::new(store.clone()),
            pruner: RetentionPruner::new(store.clone()),
            config,
            store,
            metadata,
        }
    }

    pub fn config(&self) -> &DeployerConfig {
        &self.config
    }

    /// Handle a raw upload notification and map the result to an outcome
    pub async fn handle_event(&self, payload: &str) -> DeploymentOutcome {
        info!(
            deployer_version = env!("CARGO_PKG_VERSION"),
            "Handling upload event"
        );

        let result = match UploadEvent::from_json(payload) {
            Ok(event) => self.handle_upload(&event).await,
            Err(e) => {
                let err = StageError::new(
                    DeploymentStage::ParseEvent,
                    DeployError::Configuration(format!("invalid upload event: {}", e)),
                );
                error!(error = %err, "Deployment failed");
                Err(err)
            }
        };

        DeploymentOutcome::from(result)
    }

    /// Deploy the artifact named by the first record of `event`
    pub async fn handle_upload(&self, event: &UploadEvent) -> Result<DeploymentReport, StageError> {
        let Some((record, rest)) = event.records.split_first() else {
            let err = StageError::new(
                DeploymentStage::ParseEvent,
                DeployError::Configuration("upload event contains no records".into()),
            );
            error!(error = %err, "Deployment failed");
            return Err(err);
        };

        if !rest.is_empty() {
            let ignored: Vec<String> = rest.iter().map(|r| r.location().to_string()).collect();
            warn!(
                ?ignored,
                "Upload event carries multiple records, deploying only the first"
            );
        }

        self.deploy(&record.location()).await
    }

    /// Run the full pipeline for one artifact
    #[instrument(skip(self, artifact), fields(artifact = %artifact))]
    pub async fn deploy(&self, artifact: &ArtifactLocation) -> Result<DeploymentReport, StageError> {
        let mut states = vec![DeploymentState::Start];

        let role = self
            .config
            .require_role()
            .map_err(|e| fail(&mut states, DeploymentStage::CheckConfiguration, e.into()))?;

        let desired = self
            .load_descriptor(artifact)
            .await
            .map_err(|e| fail(&mut states, DeploymentStage::LoadMetadata, e))?;
        advance(&mut states, DeploymentState::MetadataLoaded);
        info!(function = desired.name(), alias = desired.alias_name(), "Descriptor loaded");

        let function = FunctionReconciler::new(self.store.clone(), role)
            .reconcile(artifact, &desired)
            .await
            .map_err(|e| fail(&mut states, DeploymentStage::ReconcileFunction, e))?;
        advance(&mut states, DeploymentState::FunctionReconciled);

        let alias_arn = self
            .aliases
            .reconcile(&function.function_arn, desired.alias_name(), function.version)
            .await
            .map_err(|e| fail(&mut states, DeploymentStage::ReconcileAlias, e))?;
        advance(&mut states, DeploymentState::AliasReconciled);

        let pruned = match self.config.retention.max_unaliased_versions {
            Some(max) => {
                let pruned = self
                    .pruner
                    .prune(&function.function_arn, max)
                    .await
                    .map_err(|e| fail(&mut states, DeploymentStage::PruneVersions, e))?;
                advance(&mut states, DeploymentState::PruneCompleted);
                pruned
            }
            None => {
                advance(&mut states, DeploymentState::PruneSkipped);
                BTreeSet::new()
            }
        };
        advance(&mut states, DeploymentState::Done);

        info!(
            function_arn = %function.function_arn,
            version = %function.version,
            %alias_arn,
            pruned = pruned.len(),
            "Deployment complete"
        );

        Ok(DeploymentReport {
            function_arn: function.function_arn,
            version: function.version,
            alias_arn,
            pruned,
            states,
        })
    }

    async fn load_descriptor(
        &self,
        artifact: &ArtifactLocation,
    ) -> crate::error::Result<DesiredStateDescriptor> {
        let attributes = match self.metadata.head_object(artifact).await {
            Ok(attributes) => attributes,
            Err(StoreError::NotFound(_)) => {
                return Err(DeployError::Artifact(format!(
                    "artifact not found: {}",
                    artifact
                )))
            }
            Err(e) => return Err(e.into()),
        };

        Ok(DesiredStateDescriptor::from_metadata(
            &attributes,
            self.config.environment.clone(),
        )?)
    }
}

fn advance(states: &mut Vec<DeploymentState>, state: DeploymentState) {
    info!(?state, "Deployment state");
    states.push(state);
}

fn fail(states: &mut Vec<DeploymentState>, stage: DeploymentStage, source: DeployError) -> StageError {
    states.push(DeploymentState::Failed(stage));
    let err = StageError::new(stage, source);
    error!(
        %stage,
        kind = %err.kind(),
        retryable = err.source.is_retryable(),
        error = %err.source,
        "Deployment failed"
    );
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetentionPolicy;
    use crate::error::ErrorKind;
    use deployer_store::{InMemoryFunctionStore, InMemoryMetadataSource, StoreOperation};
    use std::collections::HashMap;

    const ROLE: &str = "arn:aws:iam::000000000000:role/exec";

    fn artifact() -> ArtifactLocation {
        ArtifactLocation::new("artifacts", "hello.zip")
    }

    fn attributes() -> HashMap<String, String> {
        [
            ("function-name", "hello"),
            ("function-handler", "main"),
            ("function-runtime", "go1.x"),
            ("function-memory-size", "128"),
            ("function-timeout", "30"),
            ("function-alias", "production"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn setup(
        config: DeployerConfig,
    ) -> (
        Arc<InMemoryFunctionStore>,
        Arc<InMemoryMetadataSource>,
        DeploymentOrchestrator,
    ) {
        let store = Arc::new(InMemoryFunctionStore::new());
        store.put_artifact(artifact(), b"bundle");
        let metadata = Arc::new(InMemoryMetadataSource::new());
        metadata.put_object(artifact(), attributes());
        let orchestrator = DeploymentOrchestrator::new(config, store.clone(), metadata.clone());
        (store, metadata, orchestrator)
    }

    #[tokio::test]
    async fn test_states_without_retention() {
        let (_store, _metadata, orchestrator) = setup(DeployerConfig::new(ROLE));

        let report = orchestrator.deploy(&artifact()).await.unwrap();

        assert_eq!(
            report.states,
            vec![
                DeploymentState::Start,
                DeploymentState::MetadataLoaded,
                DeploymentState::FunctionReconciled,
                DeploymentState::AliasReconciled,
                DeploymentState::PruneSkipped,
                DeploymentState::Done,
            ]
        );
        assert_eq!(report.version, VersionId::Published(1));
        assert!(report.alias_arn.ends_with(":hello:production"));
    }

    #[tokio::test]
    async fn test_states_with_retention() {
        let config = DeployerConfig::new(ROLE).with_retention(RetentionPolicy::keep(1));
        let (store, _metadata, orchestrator) = setup(config);

        orchestrator.deploy(&artifact()).await.unwrap();
        let report = orchestrator.deploy(&artifact()).await.unwrap();

        assert!(report.states.contains(&DeploymentState::PruneCompleted));
        assert!(report.pruned.is_empty());
        assert_eq!(store.call_count(StoreOperation::ListVersions), 2);
    }

    #[tokio::test]
    async fn test_missing_artifact_metadata_is_artifact_error() {
        let (store, _metadata, orchestrator) = setup(DeployerConfig::new(ROLE));

        let err = orchestrator
            .deploy(&ArtifactLocation::new("artifacts", "other.zip"))
            .await
            .unwrap_err();

        assert_eq!(err.stage, DeploymentStage::LoadMetadata);
        assert_eq!(err.kind(), ErrorKind::ArtifactError);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_incomplete_metadata_fails_before_mutation() {
        let (store, metadata, orchestrator) = setup(DeployerConfig::new(ROLE));
        let mut incomplete = attributes();
        incomplete.remove("function-runtime");
        metadata.put_object(artifact(), incomplete);

        let err = orchestrator.deploy(&artifact()).await.unwrap_err();

        assert_eq!(err.stage, DeploymentStage::LoadMetadata);
        assert_eq!(err.kind(), ErrorKind::ConfigurationError);
        assert_eq!(store.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_event_is_configuration_error() {
        let (_store, metadata, orchestrator) = setup(DeployerConfig::new(ROLE));

        let err = orchestrator
            .handle_upload(&UploadEvent::default())
            .await
            .unwrap_err();

        assert_eq!(err.stage, DeploymentStage::ParseEvent);
        assert_eq!(err.kind(), ErrorKind::ConfigurationError);
        assert_eq!(metadata.lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_payload_yields_error_outcome() {
        let (_store, _metadata, orchestrator) = setup(DeployerConfig::new(ROLE));

        let outcome = orchestrator.handle_event("{not json").await;
        assert_eq!(outcome.status(), "error");
    }
}
