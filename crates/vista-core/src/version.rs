//! VIS release identifiers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix used when a version appears inside a LocalId (`vis-3-4a`).
pub const VIS_PREFIX: &str = "vis-";

/// A VIS release, e.g. `3-4a`.
///
/// Versions are opaque tokens: ASCII letters, digits, `-` and `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VisVersion(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid VIS version '{0}'")]
pub struct InvalidVersion(pub String);

impl VisVersion {
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidVersion> {
        let value = value.into();
        let valid = !value.is_empty()
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
        if valid {
            Ok(VisVersion(value))
        } else {
            Err(InvalidVersion(value))
        }
    }

    /// Parse the `vis-<version>` token used in LocalIds.
    pub fn from_local_id_token(token: &str) -> Result<Self, InvalidVersion> {
        match token.strip_prefix(VIS_PREFIX) {
            Some(rest) => Self::new(rest),
            None => Err(InvalidVersion(token.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_local_id_token(&self) -> String {
        format!("{VIS_PREFIX}{}", self.0)
    }
}

impl fmt::Display for VisVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VisVersion {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for VisVersion {
    type Error = InvalidVersion;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VisVersion> for String {
    fn from(version: VisVersion) -> Self {
        version.0
    }
}
