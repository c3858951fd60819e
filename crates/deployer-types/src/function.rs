//! Function and alias records as held by the backing store

use crate::{Version, VersionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration fields applied to a function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionConfiguration {
    /// Entry point, e.g. `main` or `index.handler`
    pub handler: String,

    /// Runtime identifier, e.g. `go1.x`
    pub runtime: String,

    /// Memory in megabytes
    pub memory_size_mb: u32,

    /// Execution timeout in seconds
    pub timeout_secs: u32,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Execution role the function runs as
    pub role: String,

    /// Environment variables
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

impl FunctionConfiguration {
    /// Content hash of the configuration
    ///
    /// Fields are fed length-prefixed so that adjacent values cannot collide.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        let mut feed = |value: &[u8]| {
            hasher.update(&(value.len() as u64).to_le_bytes());
            hasher.update(value);
        };

        feed(self.handler.as_bytes());
        feed(self.runtime.as_bytes());
        feed(&self.memory_size_mb.to_le_bytes()[..]);
        feed(&self.timeout_secs.to_le_bytes()[..]);
        feed(self.description.as_bytes());
        feed(self.role.as_bytes());
        for (key, value) in &self.environment {
            feed(key.as_bytes());
            feed(value.as_bytes());
        }

        hasher.finalize().to_hex().to_string()
    }
}

/// A function as reported by the backing store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionRecord {
    /// Function name (unique per store)
    pub name: String,

    /// Fully qualified function ARN
    pub arn: String,

    /// Current `$LATEST` configuration
    pub configuration: FunctionConfiguration,

    /// Hash of the current configuration
    pub configuration_hash: String,

    /// Hash of the current `$LATEST` code
    pub code_hash: String,

    /// Known versions, `$LATEST` included
    pub versions: Vec<Version>,
}

impl FunctionRecord {
    /// Highest published version, if any
    pub fn latest_published(&self) -> Option<&Version> {
        self.versions
            .iter()
            .filter(|v| !v.id.is_latest())
            .max_by_key(|v| v.id)
    }
}

/// A named pointer at a published version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    /// Alias name
    pub name: String,

    /// Fully qualified alias ARN
    pub arn: String,

    /// Version the alias resolves to
    pub function_version: VersionId,
}
