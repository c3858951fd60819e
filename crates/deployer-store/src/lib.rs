//! Deployer Store - Capabilities the deployment engine reconciles against
//!
//! The engine never talks to a cloud SDK directly. It consumes two narrow
//! capability traits:
//!
//! - **FunctionStore**: Function code, configuration, versions and aliases
//! - **ArtifactMetadataSource**: Attributes attached to an uploaded code bundle
//!
//! ## In-Memory vs Remote
//!
//! The crate provides in-memory implementations used by tests and by the
//! local CLI. They record every call and accept injected faults so that
//! failure paths can be exercised. Platform-backed implementations provide
//! the same traits.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod error;
pub mod function;
pub mod memory;
pub mod metadata;

// Re-exports
pub use error::{Result, StoreError};
pub use function::{CreateFunctionRequest, FunctionStore, StoreCall, StoreOperation};
pub use memory::{InMemoryFunctionStore, InMemoryMetadataSource, StoreSnapshot};
pub use metadata::ArtifactMetadataSource;
