//! Desired state of a function, as declared by artifact metadata
//!
//! The uploader attaches the function's configuration to the code bundle as
//! object attributes. A descriptor is assembled from those attributes once per
//! deployment and never modified afterwards.

use crate::FunctionConfiguration;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Object attribute names carrying the descriptor fields
pub mod attributes {
    pub const FUNCTION_NAME: &str = "function-name";
    pub const FUNCTION_HANDLER: &str = "function-handler";
    pub const FUNCTION_RUNTIME: &str = "function-runtime";
    pub const FUNCTION_MEMORY_SIZE: &str = "function-memory-size";
    pub const FUNCTION_TIMEOUT: &str = "function-timeout";
    pub const FUNCTION_DESCRIPTION: &str = "function-description";
    pub const FUNCTION_ALIAS: &str = "function-alias";

    /// Prefix some storage clients leave on user-defined attributes
    pub const USER_METADATA_PREFIX: &str = "x-amz-meta-";
}

/// Descriptor construction errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    #[error("missing mandatory field: {0}")]
    Missing(&'static str),

    #[error("cannot parse {field}: {value:?}")]
    Unparseable { field: &'static str, value: String },

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// The configuration a deployment converges a function onto
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredStateDescriptor {
    name: String,
    handler: String,
    runtime: String,
    memory_size_mb: u32,
    timeout_secs: u32,
    description: String,
    alias_name: String,
    environment: BTreeMap<String, String>,
}

impl DesiredStateDescriptor {
    /// Start building a descriptor for the named function
    pub fn builder(name: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Assemble a descriptor from object attributes
    ///
    /// Attribute names are matched case-insensitively and an `x-amz-meta-`
    /// prefix is ignored. `environment` is the operator-configured overlay.
    pub fn from_metadata(
        metadata: &HashMap<String, String>,
        environment: BTreeMap<String, String>,
    ) -> Result<Self, DescriptorError> {
        let attrs: HashMap<String, &str> = metadata
            .iter()
            .map(|(k, v)| {
                let key = k.to_ascii_lowercase();
                let key = key
                    .strip_prefix(attributes::USER_METADATA_PREFIX)
                    .map(str::to_string)
                    .unwrap_or(key);
                (key, v.as_str())
            })
            .collect();
        let get = |name: &str| attrs.get(name).map(|v| v.trim()).unwrap_or_default();

        let memory = parse_positive(attributes::FUNCTION_MEMORY_SIZE, get(attributes::FUNCTION_MEMORY_SIZE))?;
        let timeout = parse_positive(attributes::FUNCTION_TIMEOUT, get(attributes::FUNCTION_TIMEOUT))?;

        Self::builder(get(attributes::FUNCTION_NAME))
            .handler(get(attributes::FUNCTION_HANDLER))
            .runtime(get(attributes::FUNCTION_RUNTIME))
            .memory_size_mb(memory)
            .timeout_secs(timeout)
            .description(get(attributes::FUNCTION_DESCRIPTION))
            .alias(get(attributes::FUNCTION_ALIAS))
            .environment(environment)
            .build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &str {
        &self.handler
    }

    pub fn runtime(&self) -> &str {
        &self.runtime
    }

    pub fn memory_size_mb(&self) -> u32 {
        self.memory_size_mb
    }

    pub fn timeout_secs(&self) -> u32 {
        self.timeout_secs
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn alias_name(&self) -> &str {
        &self.alias_name
    }

    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    /// Configuration fields to apply, running as `role`
    pub fn configuration(&self, role: &str) -> FunctionConfiguration {
        FunctionConfiguration {
            handler: self.handler.clone(),
            runtime: self.runtime.clone(),
            memory_size_mb: self.memory_size_mb,
            timeout_secs: self.timeout_secs,
            description: self.description.clone(),
            role: role.to_string(),
            environment: self.environment.clone(),
        }
    }
}

/// Validating builder for [`DesiredStateDescriptor`]
#[derive(Debug, Clone, Default)]
pub struct DescriptorBuilder {
    name: String,
    handler: String,
    runtime: String,
    memory_size_mb: Option<u32>,
    timeout_secs: Option<u32>,
    description: String,
    alias_name: String,
    environment: BTreeMap<String, String>,
}

impl DescriptorBuilder {
    pub fn handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = handler.into();
        self
    }

    pub fn runtime(mut self, runtime: impl Into<String>) -> Self {
        self.runtime = runtime.into();
        self
    }

    pub fn memory_size_mb(mut self, memory: u32) -> Self {
        self.memory_size_mb = Some(memory);
        self
    }

    pub fn timeout_secs(mut self, timeout: u32) -> Self {
        self.timeout_secs = Some(timeout);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias_name = alias.into();
        self
    }

    pub fn environment(mut self, environment: BTreeMap<String, String>) -> Self {
        self.environment = environment;
        self
    }

    /// Validate and freeze the descriptor
    pub fn build(self) -> Result<DesiredStateDescriptor, DescriptorError> {
        let required = |field: &'static str, value: String| {
            if value.trim().is_empty() {
                Err(DescriptorError::Missing(field))
            } else {
                Ok(value)
            }
        };

        let name = required(attributes::FUNCTION_NAME, self.name)?;
        let handler = required(attributes::FUNCTION_HANDLER, self.handler)?;
        let runtime = required(attributes::FUNCTION_RUNTIME, self.runtime)?;
        let memory_size_mb = positive(attributes::FUNCTION_MEMORY_SIZE, self.memory_size_mb)?;
        let timeout_secs = positive(attributes::FUNCTION_TIMEOUT, self.timeout_secs)?;
        let alias_name = required(attributes::FUNCTION_ALIAS, self.alias_name)?;

        if alias_name == crate::version::LATEST {
            return Err(DescriptorError::Invalid {
                field: attributes::FUNCTION_ALIAS,
                reason: "alias name cannot be $LATEST".into(),
            });
        }

        Ok(DesiredStateDescriptor {
            name,
            handler,
            runtime,
            memory_size_mb,
            timeout_secs,
            description: self.description,
            alias_name,
            environment: self.environment,
        })
    }
}

fn positive(field: &'static str, value: Option<u32>) -> Result<u32, DescriptorError> {
    match value {
        None => Err(DescriptorError::Missing(field)),
        Some(0) => Err(DescriptorError::Invalid {
            field,
            reason: "must be greater than zero".into(),
        }),
        Some(v) => Ok(v),
    }
}

fn parse_positive(field: &'static str, raw: &str) -> Result<u32, DescriptorError> {
    if raw.is_empty() {
        return Err(DescriptorError::Missing(field));
    }
    let value = raw.parse::<u32>().map_err(|_| DescriptorError::Unparseable {
        field,
        value: raw.to_string(),
    })?;
    positive(field, Some(value))
}
