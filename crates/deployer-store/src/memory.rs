//! In-memory implementations of the store traits
//!
//! These follow the execution platform's observable semantics closely enough
//! to exercise the engine: version numbers are never reused, publishing an
//! unchanged `$LATEST` returns the existing version, versions with aliases
//! cannot be deleted and `$LATEST` cannot be deleted at all.

use crate::error::{Result, StoreError};
use crate::function::{CreateFunctionRequest, FunctionStore, StoreCall, StoreOperation};
use crate::metadata::ArtifactMetadataSource;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use deployer_types::{
    Alias, ArtifactLocation, FunctionConfiguration, FunctionRecord, Version, VersionId,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_ACCOUNT_ID: &str = "000000000000";

const DEFAULT_RUNTIMES: &[&str] = &[
    "go1.x",
    "provided",
    "provided.al2",
    "provided.al2023",
    "python3.11",
    "python3.12",
    "nodejs18.x",
    "nodejs20.x",
    "java17",
    "java21",
    "ruby3.2",
    "dotnet8",
];

const MIN_MEMORY_MB: u32 = 128;
const MAX_MEMORY_MB: u32 = 10_240;
const MAX_TIMEOUT_SECS: u32 = 900;

/// Marker for the last publish: which `$LATEST` revision produced which version
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct PublishMark {
    revision: u64,
    version: u64,
}

/// A function as held by the in-memory store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFunction {
    name: String,
    arn: String,
    configuration: FunctionConfiguration,
    code: ArtifactLocation,
    code_hash: String,
    /// Bumped by every code or configuration update
    revision: u64,
    last_publish: Option<PublishMark>,
    next_version: u64,
    last_modified: DateTime<Utc>,
    versions: BTreeMap<u64, Version>,
    aliases: BTreeMap<String, VersionId>,
}

impl StoredFunction {
    fn latest(&self) -> Version {
        Version {
            id: VersionId::Latest,
            code_hash: self.code_hash.clone(),
            configuration: self.configuration.clone(),
            created_at: self.last_modified,
        }
    }

    fn record(&self) -> FunctionRecord {
        let mut versions = vec![self.latest()];
        versions.extend(self.versions.values().cloned());

        FunctionRecord {
            name: self.name.clone(),
            arn: self.arn.clone(),
            configuration: self.configuration.clone(),
            configuration_hash: self.configuration.fingerprint(),
            code_hash: self.code_hash.clone(),
            versions,
        }
    }

    fn alias(&self, name: &str, target: VersionId) -> Alias {
        Alias {
            name: name.to_string(),
            arn: format!("{}:{}", self.arn, name),
            function_version: target,
        }
    }

    fn has_version(&self, version: VersionId) -> bool {
        match version {
            VersionId::Latest => true,
            VersionId::Published(n) => self.versions.contains_key(&n),
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.last_modified = Utc::now();
    }

    fn publish(&mut self) -> Version {
        if let Some(mark) = self.last_publish {
            if mark.revision == self.revision {
                if let Some(existing) = self.versions.get(&mark.version) {
                    return existing.clone();
                }
            }
        }

        let number = self.next_version;
        self.next_version += 1;

        let version = Version {
            id: VersionId::Published(number),
            code_hash: self.code_hash.clone(),
            configuration: self.configuration.clone(),
            created_at: Utc::now(),
        };
        self.versions.insert(number, version.clone());
        self.last_publish = Some(PublishMark {
            revision: self.revision,
            version: number,
        });
        version
    }
}

/// An artifact known to the in-memory store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredArtifact {
    pub location: ArtifactLocation,
    pub code_hash: String,
}

/// Serializable image of an [`InMemoryFunctionStore`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub region: String,
    pub account_id: String,
    #[serde(default)]
    pub artifacts: Vec<StoredArtifact>,
    #[serde(default)]
    pub functions: Vec<StoredFunction>,
}

impl Default for StoreSnapshot {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            account_id: DEFAULT_ACCOUNT_ID.to_string(),
            artifacts: Vec::new(),
            functions: Vec::new(),
        }
    }
}

/// In-memory function store
pub struct InMemoryFunctionStore {
    region: String,
    account_id: String,
    runtimes: Vec<String>,
    artifacts: DashMap<ArtifactLocation, String>,
    functions: DashMap<String, StoredFunction>,
    calls: Mutex<Vec<StoreCall>>,
    faults: DashMap<(StoreOperation, Option<VersionId>), StoreError>,
}

impl InMemoryFunctionStore {
    pub fn new() -> Self {
        Self::with_region(DEFAULT_REGION, DEFAULT_ACCOUNT_ID)
    }

    /// Create a store that issues ARNs for the given region and account
    pub fn with_region(region: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            account_id: account_id.into(),
            runtimes: DEFAULT_RUNTIMES.iter().map(|r| r.to_string()).collect(),
            artifacts: DashMap::new(),
            functions: DashMap::new(),
            calls: Mutex::new(Vec::new()),
            faults: DashMap::new(),
        }
    }

    /// Restore a store from a snapshot
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let store = Self::with_region(snapshot.region, snapshot.account_id);
        for artifact in snapshot.artifacts {
            store.artifacts.insert(artifact.location, artifact.code_hash);
        }
        for function in snapshot.functions {
            store.functions.insert(function.name.clone(), function);
        }
        store
    }

    /// Capture the current state
    pub fn snapshot(&self) -> StoreSnapshot {
        let mut artifacts: Vec<StoredArtifact> = self
            .artifacts
            .iter()
            .map(|a| StoredArtifact {
                location: a.key().clone(),
                code_hash: a.value().clone(),
            })
            .collect();
        artifacts.sort_by(|a, b| a.location.to_string().cmp(&b.location.to_string()));

        let mut functions: Vec<StoredFunction> =
            self.functions.iter().map(|f| f.value().clone()).collect();
        functions.sort_by(|a, b| a.name.cmp(&b.name));

        StoreSnapshot {
            region: self.region.clone(),
            account_id: self.account_id.clone(),
            artifacts,
            functions,
        }
    }

    /// Make a code bundle available, returning its content hash
    pub fn put_artifact(&self, location: ArtifactLocation, content: &[u8]) -> String {
        let hash = blake3::hash(content).to_hex().to_string();
        self.artifacts.insert(location, hash.clone());
        hash
    }

    /// Make a code bundle available under a known hash
    pub fn register_artifact(&self, location: ArtifactLocation, code_hash: impl Into<String>) {
        self.artifacts.insert(location, code_hash.into());
    }

    /// Fail every call of `operation` with `error`
    pub fn fail(&self, operation: StoreOperation, error: StoreError) {
        self.faults.insert((operation, None), error);
    }

    /// Fail calls of `operation` that target `version`
    pub fn fail_version(&self, operation: StoreOperation, version: VersionId, error: StoreError) {
        self.faults.insert((operation, Some(version)), error);
    }

    pub fn clear_faults(&self) {
        self.faults.clear();
    }

    /// All calls made so far, in order
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    /// Number of calls of one operation
    pub fn call_count(&self, operation: StoreOperation) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Number of state-changing calls
    pub fn mutation_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.operation.is_mutation())
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// ARN for a function name
    pub fn function_arn(&self, name: &str) -> String {
        format!(
            "arn:aws:lambda:{}:{}:function:{}",
            self.region, self.account_id, name
        )
    }

    /// Accept a bare name, a function ARN or a qualified function ARN
    fn resolve_name(function: &str) -> String {
        if !function.starts_with("arn:") {
            return function.to_string();
        }
        let parts: Vec<&str> = function.split(':').collect();
        parts
            .iter()
            .position(|p| *p == "function")
            .and_then(|i| parts.get(i + 1))
            .map(|name| name.to_string())
            .unwrap_or_else(|| function.to_string())
    }

    fn record_call(&self, operation: StoreOperation, function: &str, target: Option<String>) {
        debug!(%operation, function, target = ?target, "store call");
        self.calls.lock().push(StoreCall {
            operation,
            function: function.to_string(),
            target,
        });
    }

    fn check_fault(&self, operation: StoreOperation, version: Option<VersionId>) -> Result<()> {
        if version.is_some() {
            if let Some(error) = self.faults.get(&(operation, version)) {
                return Err(error.clone());
            }
        }
        if let Some(error) = self.faults.get(&(operation, None)) {
            return Err(error.clone());
        }
        Ok(())
    }

    fn validate_configuration(&self, configuration: &FunctionConfiguration) -> Result<()> {
        if configuration.handler.trim().is_empty() {
            return Err(StoreError::InvalidParameter("handler must not be empty".into()));
        }
        if !self.runtimes.iter().any(|r| r == &configuration.runtime) {
            return Err(StoreError::InvalidParameter(format!(
                "unsupported runtime: {}",
                configuration.runtime
            )));
        }
        if !(MIN_MEMORY_MB..=MAX_MEMORY_MB).contains(&configuration.memory_size_mb) {
            return Err(StoreError::InvalidParameter(format!(
                "memory size {} outside {}..={} MB",
                configuration.memory_size_mb, MIN_MEMORY_MB, MAX_MEMORY_MB
            )));
        }
        if configuration.timeout_secs == 0 || configuration.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(StoreError::InvalidParameter(format!(
                "timeout {}s outside 1..={}s",
                configuration.timeout_secs, MAX_TIMEOUT_SECS
            )));
        }
        if configuration.role.trim().is_empty() {
            return Err(StoreError::InvalidParameter("role must not be empty".into()));
        }
        Ok(())
    }

    fn artifact_hash(&self, code: &ArtifactLocation) -> Result<String> {
        self.artifacts
            .get(code)
            .map(|hash| hash.value().clone())
            .ok_or_else(|| StoreError::ArtifactUnreadable(format!("no such object: {}", code)))
    }

    fn not_found(name: &str) -> StoreError {
        StoreError::NotFound(format!("function {}", name))
    }
}

impl Default for InMemoryFunctionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FunctionStore for InMemoryFunctionStore {
    async fn get_function(&self, function: &str) -> Result<Option<FunctionRecord>> {
        let name = Self::resolve_name(function);
        self.record_call(StoreOperation::GetFunction, &name, None);
        self.check_fault(StoreOperation::GetFunction, None)?;

        Ok(self.functions.get(&name).map(|f| f.record()))
    }

    async fn create_function(&self, request: CreateFunctionRequest) -> Result<FunctionRecord> {
        self.record_call(StoreOperation::CreateFunction, &request.name, None);
        self.check_fault(StoreOperation::CreateFunction, None)?;
        self.validate_configuration(&request.configuration)?;
        let code_hash = self.artifact_hash(&request.code)?;

        match self.functions.entry(request.name.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "function already exists: {}",
                request.name
            ))),
            Entry::Vacant(slot) => {
                let mut function = StoredFunction {
                    arn: self.function_arn(&request.name),
                    name: request.name,
                    configuration: request.configuration,
                    code: request.code,
                    code_hash,
                    revision: 1,
                    last_publish: None,
                    next_version: 1,
                    last_modified: Utc::now(),
                    versions: BTreeMap::new(),
                    aliases: BTreeMap::new(),
                };
                if request.publish {
                    function.publish();
                }
                let record = function.record();
                slot.insert(function);
                Ok(record)
            }
        }
    }

    async fn update_function_code(&self, function: &str, code: &ArtifactLocation) -> Result<()> {
        let name = Self::resolve_name(function);
        self.record_call(
            StoreOperation::UpdateFunctionCode,
            &name,
            Some(code.to_string()),
        );
        self.check_fault(StoreOperation::UpdateFunctionCode, None)?;
        let code_hash = self.artifact_hash(code)?;

        let mut stored = self
            .functions
            .get_mut(&name)
            .ok_or_else(|| Self::not_found(&name))?;
        stored.code = code.clone();
        stored.code_hash = code_hash;
        stored.touch();
        Ok(())
    }

    async fn update_function_configuration(
        &self,
        function: &str,
        configuration: &FunctionConfiguration,
    ) -> Result<()> {
        let name = Self::resolve_name(function);
        self.record_call(StoreOperation::UpdateFunctionConfiguration, &name, None);
        self.check_fault(StoreOperation::UpdateFunctionConfiguration, None)?;
        self.validate_configuration(configuration)?;

        let mut stored = self
            .functions
            .get_mut(&name)
            .ok_or_else(|| Self::not_found(&name))?;
        stored.configuration = configuration.clone();
        stored.touch();
        Ok(())
    }

    async fn publish_version(&self, function: &str) -> Result<Version> {
        let name = Self::resolve_name(function);
        self.record_call(StoreOperation::PublishVersion, &name, None);
        self.check_fault(StoreOperation::PublishVersion, None)?;

        let mut stored = self
            .functions
            .get_mut(&name)
            .ok_or_else(|| Self::not_found(&name))?;
        Ok(stored.publish())
    }

    async fn get_alias(&self, function: &str, alias: &str) -> Result<Option<Alias>> {
        let name = Self::resolve_name(function);
        self.record_call(StoreOperation::GetAlias, &name, Some(alias.to_string()));
        self.check_fault(StoreOperation::GetAlias, None)?;

        let stored = self
            .functions
            .get(&name)
            .ok_or_else(|| Self::not_found(&name))?;
        Ok(stored
            .aliases
            .get(alias)
            .map(|target| stored.alias(alias, *target)))
    }

    async fn create_alias(&self, function: &str, alias: &str, version: VersionId) -> Result<Alias> {
        let name = Self::resolve_name(function);
        self.record_call(
            StoreOperation::CreateAlias,
            &name,
            Some(format!("{}={}", alias, version)),
        );
        self.check_fault(StoreOperation::CreateAlias, Some(version))?;

        let mut stored = self
            .functions
            .get_mut(&name)
            .ok_or_else(|| Self::not_found(&name))?;
        if !stored.has_version(version) {
            return Err(StoreError::InvalidParameter(format!(
                "version {} does not exist",
                version
            )));
        }
        if stored.aliases.contains_key(alias) {
            return Err(StoreError::Conflict(format!("alias already exists: {}", alias)));
        }
        stored.aliases.insert(alias.to_string(), version);
        Ok(stored.alias(alias, version))
    }

    async fn update_alias(&self, function: &str, alias: &str, version: VersionId) -> Result<()> {
        let name = Self::resolve_name(function);
        self.record_call(
            StoreOperation::UpdateAlias,
            &name,
            Some(format!("{}={}", alias, version)),
        );
        self.check_fault(StoreOperation::UpdateAlias, Some(version))?;

        let mut stored = self
            .functions
            .get_mut(&name)
            .ok_or_else(|| Self::not_found(&name))?;
        if !stored.has_version(version) {
            return Err(StoreError::InvalidParameter(format!(
                "version {} does not exist",
                version
            )));
        }
        match stored.aliases.get_mut(alias) {
            Some(target) => {
                *target = version;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("alias {}", alias))),
        }
    }

    async fn list_versions(&self, function: &str) -> Result<Vec<Version>> {
        let name = Self::resolve_name(function);
        self.record_call(StoreOperation::ListVersions, &name, None);
        self.check_fault(StoreOperation::ListVersions, None)?;

        let stored = self
            .functions
            .get(&name)
            .ok_or_else(|| Self::not_found(&name))?;
        Ok(stored.record().versions)
    }

    async fn list_aliases(&self, function: &str) -> Result<Vec<Alias>> {
        let name = Self::resolve_name(function);
        self.record_call(StoreOperation::ListAliases, &name, None);
        self.check_fault(StoreOperation::ListAliases, None)?;

        let stored = self
            .functions
            .get(&name)
            .ok_or_else(|| Self::not_found(&name))?;
        Ok(stored
            .aliases
            .iter()
            .map(|(alias, target)| stored.alias(alias, *target))
            .collect())
    }

    async fn delete_version(&self, function: &str, version: VersionId) -> Result<()> {
        let name = Self::resolve_name(function);
        self.record_call(
            StoreOperation::DeleteVersion,
            &name,
            Some(version.to_string()),
        );
        self.check_fault(StoreOperation::DeleteVersion, Some(version))?;

        let mut stored = self
            .functions
            .get_mut(&name)
            .ok_or_else(|| Self::not_found(&name))?;
        let number = match version {
            VersionId::Latest => {
                return Err(StoreError::InvalidParameter(
                    "$LATEST cannot be deleted".into(),
                ))
            }
            VersionId::Published(n) => n,
        };
        if let Some(alias) = stored
            .aliases
            .iter()
            .find(|(_, target)| **target == version)
            .map(|(alias, _)| alias.clone())
        {
            return Err(StoreError::Conflict(format!(
                "version {} is referenced by alias {}",
                version, alias
            )));
        }
        stored
            .versions
            .remove(&number)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("version {}", version)))
    }
}

/// In-memory artifact metadata source
pub struct InMemoryMetadataSource {
    objects: DashMap<ArtifactLocation, HashMap<String, String>>,
    lookups: AtomicU64,
    fault: Mutex<Option<StoreError>>,
}

impl InMemoryMetadataSource {
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
            lookups: AtomicU64::new(0),
            fault: Mutex::new(None),
        }
    }

    /// Attach attributes to an object
    pub fn put_object(&self, location: ArtifactLocation, attributes: HashMap<String, String>) {
        self.objects.insert(location, attributes);
    }

    /// Fail every lookup with `error`
    pub fn fail(&self, error: StoreError) {
        *self.fault.lock() = Some(error);
    }

    /// Number of lookups made so far
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryMetadataSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactMetadataSource for InMemoryMetadataSource {
    async fn head_object(&self, location: &ArtifactLocation) -> Result<HashMap<String, String>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        debug!(%location, "head object");

        if let Some(error) = self.fault.lock().clone() {
            return Err(error);
        }
        self.objects
            .get(location)
            .map(|attrs| attrs.value().clone())
            .ok_or_else(|| StoreError::NotFound(format!("object {}", location)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configuration() -> FunctionConfiguration {
        FunctionConfiguration {
            handler: "main".into(),
            runtime: "go1.x".into(),
            memory_size_mb: 128,
            timeout_secs: 30,
            description: String::new(),
            role: "arn:aws:iam::000000000000:role/exec".into(),
            environment: BTreeMap::new(),
        }
    }

    fn artifact() -> ArtifactLocation {
        ArtifactLocation::new("artifacts", "hello.zip")
    }

    async fn create(store: &InMemoryFunctionStore) -> FunctionRecord {
        store.put_artifact(artifact(), b"bundle");
        store
            .create_function(CreateFunctionRequest {
                name: "hello".into(),
                code: artifact(),
                configuration: configuration(),
                publish: true,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_publishes_first_version() {
        let store = InMemoryFunctionStore::new();
        let record = create(&store).await;

        assert_eq!(record.arn, "arn:aws:lambda:us-east-1:000000000000:function:hello");
        assert_eq!(record.latest_published().unwrap().id, VersionId::Published(1));
        assert_eq!(record.versions[0].id, VersionId::Latest);
    }

    #[tokio::test]
    async fn test_create_twice_conflicts() {
        let store = InMemoryFunctionStore::new();
        create(&store).await;

        let err = store
            .create_function(CreateFunctionRequest {
                name: "hello".into(),
                code: artifact(),
                configuration: configuration(),
                publish: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_publish_without_changes_returns_existing_version() {
        let store = InMemoryFunctionStore::new();
        create(&store).await;

        let again = store.publish_version("hello").await.unwrap();
        assert_eq!(again.id, VersionId::Published(1));

        store.update_function_code("hello", &artifact()).await.unwrap();
        let next = store.publish_version("hello").await.unwrap();
        assert_eq!(next.id, VersionId::Published(2));
    }

    #[tokio::test]
    async fn test_version_numbers_are_not_reused() {
        let store = InMemoryFunctionStore::new();
        create(&store).await;

        store.update_function_code("hello", &artifact()).await.unwrap();
        store.publish_version("hello").await.unwrap();
        store.delete_version("hello", VersionId::Published(2)).await.unwrap();

        store.update_function_code("hello", &artifact()).await.unwrap();
        let next = store.publish_version("hello").await.unwrap();
        assert_eq!(next.id, VersionId::Published(3));
    }

    #[tokio::test]
    async fn test_unknown_artifact_is_unreadable() {
        let store = InMemoryFunctionStore::new();
        create(&store).await;

        let err = store
            .update_function_code("hello", &ArtifactLocation::new("artifacts", "missing.zip"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ArtifactUnreadable(_)));
    }

    #[tokio::test]
    async fn test_rejects_unsupported_runtime() {
        let store = InMemoryFunctionStore::new();
        create(&store).await;

        let mut config = configuration();
        config.runtime = "cobol85".into();
        let err = store
            .update_function_configuration("hello", &config)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidParameter(_)));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_aliases_and_arn_resolution() {
        let store = InMemoryFunctionStore::new();
        let record = create(&store).await;

        let alias = store
            .create_alias(&record.arn, "production", VersionId::Published(1))
            .await
            .unwrap();
        assert_eq!(alias.arn, format!("{}:production", record.arn));

        let fetched = store.get_alias("hello", "production").await.unwrap().unwrap();
        assert_eq!(fetched, alias);

        let err = store
            .update_alias("hello", "production", VersionId::Published(7))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn test_delete_guards() {
        let store = InMemoryFunctionStore::new();
        create(&store).await;
        store
            .create_alias("hello", "production", VersionId::Published(1))
            .await
            .unwrap();

        let err = store.delete_version("hello", VersionId::Latest).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidParameter(_)));

        let err = store
            .delete_version("hello", VersionId::Published(1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let err = store
            .delete_version("hello", VersionId::Published(9))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_faults_and_call_recording() {
        let store = InMemoryFunctionStore::new();
        create(&store).await;
        store.clear_calls();

        store.fail_version(
            StoreOperation::DeleteVersion,
            VersionId::Published(1),
            StoreError::Throttled("slow down".into()),
        );
        let err = store
            .delete_version("hello", VersionId::Published(1))
            .await
            .unwrap_err();
        assert!(err.is_transient());

        store.list_versions("hello").await.unwrap();
        assert_eq!(store.call_count(StoreOperation::DeleteVersion), 1);
        assert_eq!(store.mutation_count(), 1);
        assert_eq!(store.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_snapshot_round_trip_preserves_numbering() {
        let store = InMemoryFunctionStore::new();
        create(&store).await;

        let json = serde_json::to_string(&store.snapshot()).unwrap();
        let restored = InMemoryFunctionStore::from_snapshot(serde_json::from_str(&json).unwrap());

        restored.update_function_code("hello", &artifact()).await.unwrap();
        let next = restored.publish_version("hello").await.unwrap();
        assert_eq!(next.id, VersionId::Published(2));
    }

    #[tokio::test]
    async fn test_metadata_source() {
        let source = InMemoryMetadataSource::new();
        let mut attrs = HashMap::new();
        attrs.insert("function-name".to_string(), "hello".to_string());
        source.put_object(artifact(), attrs.clone());

        assert_eq!(source.head_object(&artifact()).await.unwrap(), attrs);
        let err = source
            .head_object(&ArtifactLocation::new("artifacts", "other.zip"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert_eq!(source.lookup_count(), 2);
    }
}
