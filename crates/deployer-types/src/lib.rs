//! Deployer Types - Core types for function deployment
//!
//! The deployer converges a live serverless function onto the configuration
//! declared by an uploaded code artifact. These are the values that flow
//! between the engine and its collaborators.
//!
//! ## Key Concepts
//!
//! - **DesiredStateDescriptor**: What the artifact says the function should look like
//! - **FunctionConfiguration**: The configuration fields sent to the backing store
//! - **Version**: An immutable published snapshot (or the mutable `$LATEST` slot)
//! - **Alias**: A named pointer at exactly one published version
//! - **UploadEvent**: The storage notification that starts a deployment

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod artifact;
pub mod descriptor;
pub mod function;
pub mod version;

// Re-export main types
pub use artifact::{ArtifactLocation, BucketEntity, ObjectEntity, StorageEntity, UploadEvent, UploadRecord};
pub use descriptor::{attributes, DescriptorBuilder, DescriptorError, DesiredStateDescriptor};
pub use function::{Alias, FunctionConfiguration, FunctionRecord};
pub use version::{Version, VersionId, VersionIdError};
