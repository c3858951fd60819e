//! Runtime configuration for the deployer
//!
//! Built once at process start and handed to the orchestrator. No engine
//! component reads the process environment itself.
//!
//! | variable | meaning |
//! |---|---|
//! | `DEPLOYER_FUNCTION_ROLE_ARN` | execution role for created functions (required to deploy) |
//! | `DEPLOYER_FUNCTION_ENV_VARS` | JSON object merged into the function environment |
//! | `DEPLOYER_POLICY_MAX_UNALIASED_VERSIONS` | retention limit; setting it enables pruning |

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "DEPLOYER";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DEPLOYER_FUNCTION_ROLE_ARN not set")]
    MissingRole,

    #[error("invalid DEPLOYER_FUNCTION_ENV_VARS: {0}")]
    InvalidEnvironment(String),

    #[error("invalid DEPLOYER_POLICY_MAX_UNALIASED_VERSIONS: {0}")]
    InvalidRetention(String),

    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// How many unaliased versions to keep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// `None` disables pruning
    pub max_unaliased_versions: Option<u32>,
}

impl RetentionPolicy {
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Keep at most `max` unaliased versions
    pub fn keep(max: u32) -> Self {
        Self {
            max_unaliased_versions: Some(max),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_unaliased_versions.is_some()
    }
}

/// Deployer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployerConfig {
    /// Role assumed by deployed functions
    pub execution_role: Option<String>,

    /// Overlay merged into every deployed function's environment
    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    /// Version retention
    #[serde(default)]
    pub retention: RetentionPolicy,
}

/// Settings as they arrive from the environment, before validation
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    function_role_arn: Option<String>,
    function_env_vars: Option<String>,
    policy_max_unaliased_versions: Option<String>,
}

impl DeployerConfig {
    pub fn new(execution_role: impl Into<String>) -> Self {
        Self {
            execution_role: Some(execution_role.into()),
            ..Default::default()
        }
    }

    pub fn with_environment(mut self, environment: BTreeMap<String, String>) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Load from an explicit set of variables, e.g. in tests
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let source: config::Map<String, String> = vars.into_iter().collect();
        Self::load(config::Environment::with_prefix(ENV_PREFIX).source(Some(source)))
    }

    fn load(environment: config::Environment) -> Result<Self, ConfigError> {
        let raw: RawSettings = config::Config::builder()
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        let execution_role = raw
            .function_role_arn
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        let environment = match raw.function_env_vars.as_deref().map(str::trim) {
            None | Some("") => BTreeMap::new(),
            Some(json) => parse_environment(json)?,
        };

        let retention = match raw.policy_max_unaliased_versions.as_deref().map(str::trim) {
            None | Some("") => RetentionPolicy::disabled(),
            Some(value) => RetentionPolicy::keep(
                value
                    .parse::<u32>()
                    .map_err(|e| ConfigError::InvalidRetention(format!("{:?}: {}", value, e)))?,
            ),
        };

        Ok(Self {
            execution_role,
            environment,
            retention,
        })
    }

    /// The execution role, which every deployment needs
    pub fn require_role(&self) -> Result<&str, ConfigError> {
        self.execution_role.as_deref().ok_or(ConfigError::MissingRole)
    }
}

/// Parse the environment overlay
///
/// Scalars are accepted and stringified; nested values and nulls are not.
fn parse_environment(json: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let object: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(json).map_err(|e| ConfigError::InvalidEnvironment(e.to_string()))?;

    object
        .into_iter()
        .map(|(key, value)| match value {
            serde_json::Value::String(s) => Ok((key, s)),
            serde_json::Value::Number(n) => Ok((key, n.to_string())),
            serde_json::Value::Bool(b) => Ok((key, b.to_string())),
            other => Err(ConfigError::InvalidEnvironment(format!(
                "value for {} must be a string, number or boolean, got {}",
                key, other
            ))),
        })
        .collect()
}
