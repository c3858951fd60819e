//! Function store trait
//!
//! The FunctionStore is the engine's view of the function execution platform.
//! Every operation is a single request; lookups return `None` when the
//! resource does not exist.

use crate::error::Result;
use async_trait::async_trait;
use deployer_types::{Alias, ArtifactLocation, FunctionConfiguration, FunctionRecord, Version, VersionId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameters for creating a function
#[derive(Debug, Clone)]
pub struct CreateFunctionRequest {
    /// Function name
    pub name: String,

    /// Code bundle to deploy
    pub code: ArtifactLocation,

    /// Configuration fields
    pub configuration: FunctionConfiguration,

    /// Publish version 1 as part of creation
    pub publish: bool,
}

/// Store of function code, configuration, versions and aliases
///
/// `function` parameters accept either the function name or its ARN.
#[async_trait]
pub trait FunctionStore: Send + Sync {
    /// Get a function by name
    async fn get_function(&self, function: &str) -> Result<Option<FunctionRecord>>;

    /// Create a function
    async fn create_function(&self, request: CreateFunctionRequest) -> Result<FunctionRecord>;

    /// Replace the `$LATEST` code
    async fn update_function_code(&self, function: &str, code: &ArtifactLocation) -> Result<()>;

    /// Replace the `$LATEST` configuration
    async fn update_function_configuration(
        &self,
        function: &str,
        configuration: &FunctionConfiguration,
    ) -> Result<()>;

    /// Snapshot `$LATEST` as a published version
    async fn publish_version(&self, function: &str) -> Result<Version>;

    /// Get an alias by name
    async fn get_alias(&self, function: &str, alias: &str) -> Result<Option<Alias>>;

    /// Create an alias pointing at `version`
    async fn create_alias(&self, function: &str, alias: &str, version: VersionId) -> Result<Alias>;

    /// Repoint an existing alias at `version`
    async fn update_alias(&self, function: &str, alias: &str, version: VersionId) -> Result<()>;

    /// List all versions, `$LATEST` included
    async fn list_versions(&self, function: &str) -> Result<Vec<Version>>;

    /// List all aliases
    async fn list_aliases(&self, function: &str) -> Result<Vec<Alias>>;

    /// Delete a published version
    async fn delete_version(&self, function: &str, version: VersionId) -> Result<()>;
}

/// Store operations, used for call recording and fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoreOperation {
    GetFunction,
    CreateFunction,
    UpdateFunctionCode,
    UpdateFunctionConfiguration,
    PublishVersion,
    GetAlias,
    CreateAlias,
    UpdateAlias,
    ListVersions,
    ListAliases,
    DeleteVersion,
}

impl StoreOperation {
    /// Whether the operation changes store state
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            StoreOperation::GetFunction
                | StoreOperation::GetAlias
                | StoreOperation::ListVersions
                | StoreOperation::ListAliases
        )
    }
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreOperation::GetFunction => "GetFunction",
            StoreOperation::CreateFunction => "CreateFunction",
            StoreOperation::UpdateFunctionCode => "UpdateFunctionCode",
            StoreOperation::UpdateFunctionConfiguration => "UpdateFunctionConfiguration",
            StoreOperation::PublishVersion => "PublishVersion",
            StoreOperation::GetAlias => "GetAlias",
            StoreOperation::CreateAlias => "CreateAlias",
            StoreOperation::UpdateAlias => "UpdateAlias",
            StoreOperation::ListVersions => "ListVersions",
            StoreOperation::ListAliases => "ListAliases",
            StoreOperation::DeleteVersion => "DeleteVersion",
        };
        f.write_str(name)
    }
}

/// A recorded store call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCall {
    pub operation: StoreOperation,
    pub function: String,
    pub target: Option<String>,
}
