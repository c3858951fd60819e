//! Terminal result of one invocation
//!
//! Serialized as `{"status":"ok","report":{..}}` or
//! `{"status":"error","cause":{..}}`. There is no partial-success status: a
//! deployment whose retention pass partly failed is an error.

use crate::error::{DeploymentStage, ErrorKind, StageError};
use crate::orchestrator::DeploymentReport;
use serde::{Deserialize, Serialize};

/// Structured failure cause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCause {
    pub stage: DeploymentStage,
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl From<&StageError> for FailureCause {
    fn from(err: &StageError) -> Self {
        Self {
            stage: err.stage,
            kind: err.kind(),
            message: err.source.to_string(),
            retryable: err.source.is_retryable(),
        }
    }
}

/// Outcome reported to the invoker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DeploymentOutcome {
    Ok { report: DeploymentReport },
    Error { cause: FailureCause },
}

impl DeploymentOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            DeploymentOutcome::Ok { .. } => "ok",
            DeploymentOutcome::Error { .. } => "error",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, DeploymentOutcome::Ok { .. })
    }

    pub fn report(&self) -> Option<&DeploymentReport> {
        match self {
            DeploymentOutcome::Ok { report } => Some(report),
            DeploymentOutcome::Error { .. } => None,
        }
    }

    pub fn cause(&self) -> Option<&FailureCause> {
        match self {
            DeploymentOutcome::Ok { .. } => None,
            DeploymentOutcome::Error { cause } => Some(cause),
        }
    }
}

impl From<Result<DeploymentReport, StageError>> for DeploymentOutcome {
    fn from(result: Result<DeploymentReport, StageError>) -> Self {
        match result {
            Ok(report) => DeploymentOutcome::Ok { report },
            Err(err) => DeploymentOutcome::Error {
                cause: FailureCause::from(&err),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeployError;
    use crate::orchestrator::DeploymentState;
    use deployer_types::VersionId;

    #[test]
    fn test_ok_outcome_json() {
        let outcome = DeploymentOutcome::from(Ok(DeploymentReport {
            function_arn: "arn:aws:lambda:us-east-1:000000000000:function:hello".into(),
            version: VersionId::Published(7),
            alias_arn: "arn:aws:lambda:us-east-1:000000000000:function:hello:production".into(),
            pruned: [VersionId::Published(2)].into_iter().collect(),
            states: vec![DeploymentState::Start, DeploymentState::Done],
        }));

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["report"]["version"], "7");
        assert_eq!(json["report"]["pruned"][0], "2");
        assert_eq!(json["report"]["states"][1], "done");
    }

    #[test]
    fn test_error_outcome_json() {
        let outcome = DeploymentOutcome::from(Err(StageError::new(
            DeploymentStage::PruneVersions,
            DeployError::Transient("throttled".into()),
        )));

        assert_eq!(outcome.status(), "error");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["cause"]["stage"], "prune-versions");
        assert_eq!(json["cause"]["kind"], "TransientError");
        assert_eq!(json["cause"]["message"], "Transient error: throttled");
        assert_eq!(json["cause"]["retryable"], true);

        let back: DeploymentOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(back, outcome);
    }
}
