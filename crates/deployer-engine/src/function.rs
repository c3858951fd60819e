//! Function reconciliation
//!
//! Brings the function named by a descriptor in line with the descriptor and
//! the uploaded code, then publishes an immutable version of the result.

use crate::error::Result;
use deployer_store::{CreateFunctionRequest, FunctionStore};
use deployer_types::{ArtifactLocation, DesiredStateDescriptor, VersionId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Result of reconciling a function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledFunction {
    /// ARN of the reconciled function
    pub function_arn: String,

    /// Version published by this reconciliation
    pub version: VersionId,

    /// Whether the function had to be created
    pub created: bool,
}

/// Creates or updates a function and publishes a version
pub struct FunctionReconciler {
    store: Arc<dyn FunctionStore>,
    execution_role: String,
}

impl FunctionReconciler {
    pub fn new(store: Arc<dyn FunctionStore>, execution_role: impl Into<String>) -> Self {
        Self {
            store,
            execution_role: execution_role.into(),
        }
    }

    /// Converge the function onto `desired` running the code at `artifact`
    ///
    /// Updates are issued unconditionally; the store treats unchanged fields
    /// as no-ops.
    #[instrument(skip(self, artifact, desired), fields(function = %desired.name(), artifact = %artifact))]
    pub async fn reconcile(
        &self,
        artifact: &ArtifactLocation,
        desired: &DesiredStateDescriptor,
    ) -> Result<ReconciledFunction> {
        let configuration = desired.configuration(&self.execution_role);

        let existing = self.store.get_function(desired.name()).await?;

        let Some(function) = existing else {
            info!("Function not found, creating");

            let record = self
                .store
                .create_function(CreateFunctionRequest {
                    name: desired.name().to_string(),
                    code: artifact.clone(),
                    configuration,
                    publish: true,
                })
                .await?;

            let version = match record.latest_published() {
                Some(version) => version.id,
                None => {
                    warn!("Create returned no published version, publishing explicitly");
                    self.store.publish_version(&record.arn).await?.id
                }
            };

            info!(function_arn = %record.arn, %version, "Function created");
            return Ok(ReconciledFunction {
                function_arn: record.arn,
                version,
                created: true,
            });
        };

        self.store
            .update_function_code(&function.arn, artifact)
            .await?;
        self.store
            .update_function_configuration(&function.arn, &configuration)
            .await?;

        // Code updates only touch $LATEST
        let version = self.store.publish_version(&function.arn).await?.id;

        info!(function_arn = %function.arn, %version, "Function updated and published");
        Ok(ReconciledFunction {
            function_arn: function.arn,
            version,
            created: false,
        })
    }
}
