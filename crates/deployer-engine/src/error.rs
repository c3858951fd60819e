//! Deployment error types
//!
//! Every failure is classified into one of four kinds. Components return the
//! most specific kind they can determine; the orchestrator only attaches the
//! stage it was running.

use crate::config::ConfigError;
use deployer_store::StoreError;
use deployer_types::{DescriptorError, VersionId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Deployment errors
#[derive(Debug, Clone, Error)]
pub enum DeployError {
    /// Bad or missing input; needs an operator fix
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The code artifact cannot be read
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// Backing store fault; the whole invocation may be retried
    #[error("Transient error: {0}")]
    Transient(String),

    /// Some selected versions could not be deleted
    #[error("Failed to delete {} of {} selected versions: {}", .failed.len(), .failed.len() + .deleted.len(), describe_failures(.failed))]
    DeletionPartialFailure {
        deleted: Vec<VersionId>,
        failed: Vec<FailedDeletion>,
    },
}

/// A version the pruner selected but could not delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDeletion {
    pub version: VersionId,
    pub reason: String,
}

fn describe_failures(failed: &[FailedDeletion]) -> String {
    failed
        .iter()
        .map(|f| format!("version {} ({})", f.version, f.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Error classification exposed at the outcome boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ConfigurationError,
    ArtifactError,
    TransientError,
    DeletionPartialFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::ConfigurationError => "ConfigurationError",
            ErrorKind::ArtifactError => "ArtifactError",
            ErrorKind::TransientError => "TransientError",
            ErrorKind::DeletionPartialFailure => "DeletionPartialFailure",
        };
        f.write_str(name)
    }
}

impl DeployError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeployError::Configuration(_) => ErrorKind::ConfigurationError,
            DeployError::Artifact(_) => ErrorKind::ArtifactError,
            DeployError::Transient(_) => ErrorKind::TransientError,
            DeployError::DeletionPartialFailure { .. } => ErrorKind::DeletionPartialFailure,
        }
    }

    /// Whether retrying the whole invocation can succeed without operator action
    pub fn is_retryable(&self) -> bool {
        matches!(self, DeployError::Transient(_))
    }
}

impl From<StoreError> for DeployError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidParameter(_) => DeployError::Configuration(err.to_string()),
            StoreError::ArtifactUnreadable(_) => DeployError::Artifact(err.to_string()),
            // A resource vanishing between calls is a race; a fresh run re-reads it
            StoreError::NotFound(_)
            | StoreError::Throttled(_)
            | StoreError::Unavailable(_)
            | StoreError::Conflict(_) => DeployError::Transient(err.to_string()),
        }
    }
}

impl From<DescriptorError> for DeployError {
    fn from(err: DescriptorError) -> Self {
        DeployError::Configuration(err.to_string())
    }
}

impl From<ConfigError> for DeployError {
    fn from(err: ConfigError) -> Self {
        DeployError::Configuration(err.to_string())
    }
}

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentStage {
    ParseEvent,
    CheckConfiguration,
    LoadMetadata,
    ReconcileFunction,
    ReconcileAlias,
    PruneVersions,
}

impl fmt::Display for DeploymentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeploymentStage::ParseEvent => "parse-event",
            DeploymentStage::CheckConfiguration => "check-configuration",
            DeploymentStage::LoadMetadata => "load-metadata",
            DeploymentStage::ReconcileFunction => "reconcile-function",
            DeploymentStage::ReconcileAlias => "reconcile-alias",
            DeploymentStage::PruneVersions => "prune-versions",
        };
        f.write_str(name)
    }
}

/// A deployment error tagged with the stage that produced it
#[derive(Debug, Clone, Error)]
#[error("{stage} failed: {source}")]
pub struct StageError {
    pub stage: DeploymentStage,
    #[source]
    pub source: DeployError,
}

impl StageError {
    pub fn new(stage: DeploymentStage, source: DeployError) -> Self {
        Self { stage, source }
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, DeployError>;
