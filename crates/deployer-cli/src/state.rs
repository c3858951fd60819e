//! Snapshot and artifact catalog files

use anyhow::{Context, Result};
use deployer_store::{InMemoryFunctionStore, InMemoryMetadataSource, StoreSnapshot};
use deployer_types::ArtifactLocation;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Load the store from `path`, starting empty if the file does not exist
pub fn load_store(path: &Path) -> Result<InMemoryFunctionStore> {
    if !path.exists() {
        debug!(path = %path.display(), "No snapshot, starting empty");
        return Ok(InMemoryFunctionStore::from_snapshot(StoreSnapshot::default()));
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    let snapshot: StoreSnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("invalid snapshot {}", path.display()))?;
    Ok(InMemoryFunctionStore::from_snapshot(snapshot))
}

/// Write the store back to `path`
pub fn save_store(store: &InMemoryFunctionStore, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&store.snapshot())?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write snapshot {}", path.display()))?;
    debug!(path = %path.display(), "Snapshot saved");
    Ok(())
}

/// An uploaded object as described in a catalog file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub bucket: String,
    pub key: String,

    /// Local file holding the bundle; its content is hashed
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Known content hash, used when no file is given
    #[serde(default)]
    pub code_hash: Option<String>,

    /// Object attributes
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CatalogEntry {
    pub fn location(&self) -> ArtifactLocation {
        ArtifactLocation::new(&self.bucket, &self.key)
    }
}

/// Read a catalog file
pub fn load_catalog(path: &Path) -> Result<Vec<CatalogEntry>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid catalog {}", path.display()))
}

/// Make catalog objects visible to the store and the metadata source
///
/// Entries with neither a file nor a hash stay unknown to the store, so a
/// deployment of them fails as an unreadable artifact.
pub fn register_catalog(
    entries: Vec<CatalogEntry>,
    store: &InMemoryFunctionStore,
    metadata: &InMemoryMetadataSource,
) -> Result<()> {
    for entry in entries {
        let location = entry.location();
        match (&entry.path, &entry.code_hash) {
            (Some(path), _) => {
                let content = std::fs::read(path)
                    .with_context(|| format!("failed to read bundle {}", path.display()))?;
                store.put_artifact(location.clone(), &content);
            }
            (None, Some(hash)) => store.register_artifact(location.clone(), hash.clone()),
            (None, None) => {}
        }
        metadata.put_object(location, entry.metadata);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use deployer_store::{ArtifactMetadataSource, CreateFunctionRequest, FunctionStore};
    use deployer_types::FunctionConfiguration;

    #[tokio::test]
    async fn test_snapshot_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = load_store(&path).unwrap();
        let code = ArtifactLocation::new("artifacts", "a.zip");
        store.put_artifact(code.clone(), b"a");
        store
            .create_function(CreateFunctionRequest {
                name: "a".into(),
                code,
                configuration: FunctionConfiguration {
                    handler: "main".into(),
                    runtime: "go1.x".into(),
                    memory_size_mb: 128,
                    timeout_secs: 3,
                    description: String::new(),
                    role: "role".into(),
                    environment: Default::default(),
                },
                publish: true,
            })
            .await
            .unwrap();
        save_store(&store, &path).unwrap();

        let restored = load_store(&path).unwrap();
        let record = restored.get_function("a").await.unwrap().unwrap();
        assert_eq!(record.arn, store.function_arn("a"));
        assert!(record.latest_published().is_some());
    }

    #[tokio::test]
    async fn test_catalog_registration() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("bundle.zip");
        std::fs::write(&bundle, b"zip").unwrap();
        let catalog = dir.path().join("catalog.json");
        std::fs::write(
            &catalog,
            serde_json::json!([
                {
                    "bucket": "artifacts",
                    "key": "hello.zip",
                    "path": bundle,
                    "metadata": { "function-name": "hello" }
                },
                { "bucket": "artifacts", "key": "missing.zip" }
            ])
            .to_string(),
        )
        .unwrap();

        let store = InMemoryFunctionStore::new();
        let metadata = InMemoryMetadataSource::new();
        register_catalog(load_catalog(&catalog).unwrap(), &store, &metadata).unwrap();

        let attributes = metadata
            .head_object(&ArtifactLocation::new("artifacts", "hello.zip"))
            .await
            .unwrap();
        assert_eq!(attributes.get("function-name").map(String::as_str), Some("hello"));
        let snapshot = store.snapshot();
        assert_eq!(snapshot.artifacts.len(), 1);
        assert_eq!(
            snapshot.artifacts[0].code_hash,
            blake3_hex(b"zip")
        );
    }

    fn blake3_hex(content: &[u8]) -> String {
        let store = InMemoryFunctionStore::new();
        store.put_artifact(ArtifactLocation::new("x", "y"), content)
    }
}
