//! Function versions
//!
//! Published versions are numbered by the backing store and never change once
//! created. `$LATEST` is the mutable staging slot that code and configuration
//! updates write to.

use crate::FunctionConfiguration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of the mutable staging version
pub const LATEST: &str = "$LATEST";

/// Identifier of a function version
///
/// The backing store reports version ids as strings. They are parsed once at
/// the boundary so that ordering is numeric: `9 < 10`, and `$LATEST` sorts
/// after every published version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VersionId {
    /// An immutable published version
    Published(u64),

    /// The mutable staging slot
    Latest,
}

impl VersionId {
    /// Whether this is the `$LATEST` staging slot
    pub fn is_latest(&self) -> bool {
        matches!(self, VersionId::Latest)
    }

    /// The version number, if published
    pub fn number(&self) -> Option<u64> {
        match self {
            VersionId::Published(n) => Some(*n),
            VersionId::Latest => None,
        }
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionId::Published(n) => write!(f, "{}", n),
            VersionId::Latest => f.write_str(LATEST),
        }
    }
}

/// Error parsing a version identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid version id: {0:?}")]
pub struct VersionIdError(pub String);

impl FromStr for VersionId {
    type Err = VersionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == LATEST {
            return Ok(VersionId::Latest);
        }
        // u64::from_str accepts a leading '+', the store never emits one
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(VersionIdError(s.to_string()));
        }
        s.parse::<u64>()
            .map(VersionId::Published)
            .map_err(|_| VersionIdError(s.to_string()))
    }
}

impl TryFrom<String> for VersionId {
    type Error = VersionIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionId> for String {
    fn from(id: VersionId) -> Self {
        id.to_string()
    }
}

impl From<u64> for VersionId {
    fn from(n: u64) -> Self {
        VersionId::Published(n)
    }
}

/// A snapshot of a function's code and configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    /// Version identifier
    pub id: VersionId,

    /// Digest of the code bundle
    pub code_hash: String,

    /// Configuration at the time the version was published
    pub configuration: FunctionConfiguration,

    /// When the version was created
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_ids() {
        assert_eq!("$LATEST".parse::<VersionId>().unwrap(), VersionId::Latest);
        assert_eq!("42".parse::<VersionId>().unwrap(), VersionId::Published(42));
        assert!("".parse::<VersionId>().is_err());
        assert!("+3".parse::<VersionId>().is_err());
        assert!("latest".parse::<VersionId>().is_err());
        assert!("1.0".parse::<VersionId>().is_err());
    }

    #[test]
    fn test_numeric_ordering() {
        let mut ids: Vec<VersionId> = ["10", "9", "$LATEST", "21", "3"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        ids.sort();

        let rendered: Vec<String> = ids.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["3", "9", "10", "21", "$LATEST"]);
    }

    #[test]
    fn test_serde_uses_string_form() {
        let json = serde_json::to_string(&vec![VersionId::Published(7), VersionId::Latest]).unwrap();
        assert_eq!(json, r#"["7","$LATEST"]"#);

        let parsed: Vec<VersionId> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vec![VersionId::Published(7), VersionId::Latest]);

        assert!(serde_json::from_str::<VersionId>(r#""v2""#).is_err());
    }
}
