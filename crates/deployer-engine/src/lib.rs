//! Deployer Engine - Version/alias reconciliation and retention
//!
//! Converges a serverless function onto the configuration declared by a
//! freshly uploaded code artifact:
//!
//! 1. **FunctionReconciler** creates or updates the function and publishes a version
//! 2. **AliasReconciler** points the named alias at that version
//! 3. **RetentionPruner** deletes the oldest unaliased versions beyond the policy limit
//! 4. **DeploymentOrchestrator** runs the three in order and stops at the first failure
//!
//! ## Key Principle
//!
//! The engine is stateless. Every run re-reads the backing store through the
//! [`FunctionStore`](deployer_store::FunctionStore) capability, so a failed
//! invocation can be retried as a whole.
//!
//! ## Usage
//!
//! ```no_run
//! use deployer_engine::{DeployerConfig, DeploymentOrchestrator, RetentionPolicy};
//! use deployer_store::{InMemoryFunctionStore, InMemoryMetadataSource};
//! use std::sync::Arc;
//!
//! # async fn example(payload: &str) {
//! let config = DeployerConfig::new("arn:aws:iam::000000000000:role/exec")
//!     .with_retention(RetentionPolicy::keep(5));
//! let orchestrator = DeploymentOrchestrator::new(
//!     config,
//!     Arc::new(InMemoryFunctionStore::new()),
//!     Arc::new(InMemoryMetadataSource::new()),
//! );
//!
//! let outcome = orchestrator.handle_event(payload).await;
//! println!("{}", outcome.status());
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod alias;
pub mod config;
pub mod error;
pub mod function;
pub mod orchestrator;
pub mod outcome;
pub mod retention;

// Re-exports
pub use alias::AliasReconciler;
pub use config::{ConfigError, DeployerConfig, RetentionPolicy};
pub use error::{DeployError, DeploymentStage, ErrorKind, FailedDeletion, Result, StageError};
pub use function::{FunctionReconciler, ReconciledFunction};
pub use orchestrator::{DeploymentOrchestrator, DeploymentReport, DeploymentState};
pub use outcome::{DeploymentOutcome, FailureCause};
pub use retention::{select_for_deletion, RetentionPruner};
