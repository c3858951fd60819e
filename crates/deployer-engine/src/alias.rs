//! Alias reconciliation

use crate::error::{DeployError, Result};
use deployer_store::FunctionStore;
use deployer_types::VersionId;
use std::sync::Arc;
use tracing::{info, instrument};

/// Points a named alias at a published version
pub struct AliasReconciler {
    store: Arc<dyn FunctionStore>,
}

impl AliasReconciler {
    pub fn new(store: Arc<dyn FunctionStore>) -> Self {
        Self { store }
    }

    /// Create the alias or repoint it at `version`, returning the alias ARN
    ///
    /// The repoint is unconditional: whatever the alias targeted before, the
    /// deployment being reconciled wins.
    #[instrument(skip(self, version), fields(version = %version))]
    pub async fn reconcile(
        &self,
        function_arn: &str,
        alias_name: &str,
        version: VersionId,
    ) -> Result<String> {
        if version.is_latest() {
            return Err(DeployError::Configuration(format!(
                "alias {} cannot target $LATEST",
                alias_name
            )));
        }

        match self.store.get_alias(function_arn, alias_name).await? {
            None => {
                let alias = self
                    .store
                    .create_alias(function_arn, alias_name, version)
                    .await?;
                info!(alias_arn = %alias.arn, "Alias created");
                Ok(alias.arn)
            }
            Some(existing) => {
                self.store
                    .update_alias(function_arn, alias_name, version)
                    .await?;
                info!(
                    alias_arn = %existing.arn,
                    previous = %existing.function_version,
                    "Alias repointed"
                );
                Ok(existing.arn)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use deployer_store::{CreateFunctionRequest, InMemoryFunctionStore, StoreError, StoreOperation};
    use deployer_types::{ArtifactLocation, FunctionConfiguration};

    async fn store_with_versions(count: u64) -> Arc<InMemoryFunctionStore> {
        let store = Arc::new(InMemoryFunctionStore::new());
        let code = ArtifactLocation::new("artifacts", "hello.zip");
        store.put_artifact(code.clone(), b"bundle");
        store
            .create_function(CreateFunctionRequest {
                name: "hello".into(),
                code: code.clone(),
                configuration: FunctionConfiguration {
                    handler: "main".into(),
                    runtime: "go1.x".into(),
                    memory_size_mb: 128,
                    timeout_secs: 30,
                    description: String::new(),
                    role: "role".into(),
                    environment: Default::default(),
                },
                publish: true,
            })
            .await
            .unwrap();
        for _ in 1..count {
            store.update_function_code("hello", &code).await.unwrap();
            store.publish_version("hello").await.unwrap();
        }
        store.clear_calls();
        store
    }

    #[tokio::test]
    async fn test_creates_missing_alias() {
        let store = store_with_versions(1).await;
        let reconciler = AliasReconciler::new(store.clone());
        let function_arn = store.function_arn("hello");

        let alias_arn = reconciler
            .reconcile(&function_arn, "production", VersionId::Published(1))
            .await
            .unwrap();

        assert_eq!(alias_arn, format!("{}:production", function_arn));
        assert_eq!(store.call_count(StoreOperation::CreateAlias), 1);
        assert_eq!(store.call_count(StoreOperation::UpdateAlias), 0);
    }

    #[tokio::test]
    async fn test_repoints_existing_alias() {
        let store = store_with_versions(3).await;
        let reconciler = AliasReconciler::new(store.clone());
        let function_arn = store.function_arn("hello");

        reconciler
            .reconcile(&function_arn, "production", VersionId::Published(1))
            .await
            .unwrap();
        reconciler
            .reconcile(&function_arn, "production", VersionId::Published(3))
            .await
            .unwrap();

        let alias = store.get_alias("hello", "production").await.unwrap().unwrap();
        assert_eq!(alias.function_version, VersionId::Published(3));
        assert_eq!(store.call_count(StoreOperation::UpdateAlias), 1);
    }

    #[tokio::test]
    async fn test_repoint_to_same_version_still_updates() {
        let store = store_with_versions(1).await;
        let reconciler = AliasReconciler::new(store.clone());

        for _ in 0..2 {
            reconciler
                .reconcile("hello", "production", VersionId::Published(1))
                .await
                .unwrap();
        }
        assert_eq!(store.call_count(StoreOperation::CreateAlias), 1);
        assert_eq!(store.call_count(StoreOperation::UpdateAlias), 1);
    }

    #[tokio::test]
    async fn test_rejects_latest_without_store_calls() {
        let store = store_with_versions(1).await;
        let reconciler = AliasReconciler::new(store.clone());

        let err = reconciler
            .reconcile("hello", "production", VersionId::Latest)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationError);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_version_is_configuration_error() {
        let store = store_with_versions(1).await;
        let reconciler = AliasReconciler::new(store.clone());

        let err = reconciler
            .reconcile("hello", "production", VersionId::Published(42))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationError);
    }

    #[tokio::test]
    async fn test_store_fault_is_transient() {
        let store = store_with_versions(1).await;
        store.fail(StoreOperation::GetAlias, StoreError::Unavailable("503".into()));
        let reconciler = AliasReconciler::new(store.clone());

        let err = reconciler
            .reconcile("hello", "production", VersionId::Published(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransientError);
    }
}
