//! Artifact locations and the upload notification that carries them

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a code bundle lives in the artifact store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactLocation {
    pub bucket: String,
    pub key: String,
}

impl ArtifactLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Object-created notification delivered by the artifact store
///
/// Only the fields the deployer reads are modelled; the rest of the payload
/// is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<UploadRecord>,
}

impl UploadEvent {
    /// Parse a raw notification payload
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

/// One uploaded object
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    #[serde(default)]
    pub event_name: String,

    #[serde(default)]
    pub event_time: Option<chrono::DateTime<chrono::Utc>>,

    #[serde(default)]
    pub aws_region: Option<String>,

    pub s3: StorageEntity,
}

impl UploadRecord {
    /// Location of the uploaded artifact
    pub fn location(&self) -> ArtifactLocation {
        ArtifactLocation::new(&self.s3.bucket.name, &self.s3.object.key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageEntity {
    pub bucket: BucketEntity,
    pub object: ObjectEntity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketEntity {
    pub name: String,

    #[serde(default)]
    pub arn: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectEntity {
    pub key: String,

    #[serde(default)]
    pub size: Option<u64>,

    #[serde(rename = "eTag", default)]
    pub e_tag: Option<String>,

    #[serde(default)]
    pub sequencer: Option<String>,
}
