//! Artifact metadata source trait

use crate::error::Result;
use async_trait::async_trait;
use deployer_types::ArtifactLocation;
use std::collections::HashMap;

/// Read-only view of the attributes attached to an uploaded artifact
#[async_trait]
pub trait ArtifactMetadataSource: Send + Sync {
    /// Fetch the object's user-defined attributes
    async fn head_object(&self, location: &ArtifactLocation) -> Result<HashMap<String, String>>;
}
