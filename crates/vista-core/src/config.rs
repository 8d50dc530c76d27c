//! Runtime configuration, loaded from TOML

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chd::HashFunction;
use crate::error::ConfigError;

/// Default bound on the displacement seed search, as a multiple of the table size.
pub const DEFAULT_MAX_SEED_SEARCH_MULTIPLIER: u32 = 100;

/// Default number of times a code may appear on the active ancestor chain.
pub const DEFAULT_MAX_TRAVERSAL_OCCURRENCE: usize = 1;

/// Top-level configuration.
///
/// Every section and key is optional; missing values take their defaults.
///
/// ```toml
/// [chd]
/// hash_function = "fnv"
/// max_seed_search_multiplier = 100
///
/// [traversal]
/// max_traversal_occurrence = 1
///
/// [versioning]
/// repair_missing_links = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VistaConfig {
    pub chd: ChdConfig,
    pub traversal: TraversalOptions,
    pub versioning: VersioningConfig,
}

/// Perfect-hash table construction settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChdConfig {
    /// Key mixing function used for both bucketing and lookup.
    pub hash_function: HashFunction,
    /// Seeds tried per bucket before the table is regrown, times the table size.
    pub max_seed_search_multiplier: u32,
}

impl Default for ChdConfig {
    fn default() -> Self {
        ChdConfig {
            hash_function: HashFunction::default(),
            max_seed_search_multiplier: DEFAULT_MAX_SEED_SEARCH_MULTIPLIER,
        }
    }
}

/// Recurrence policy for traversal and path validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalOptions {
    /// How many times one code may appear among the ancestors of a node.
    pub max_traversal_occurrence: usize,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        TraversalOptions {
            max_traversal_occurrence: DEFAULT_MAX_TRAVERSAL_OCCURRENCE,
        }
    }
}

/// Version conversion settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VersioningConfig {
    /// Splice in a unique intermediate route when a converted step is not a
    /// direct parent/child relation in the target graph.
    pub repair_missing_links: bool,
}

impl VistaConfig {
    /// Parse configuration from a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: VistaConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.chd.max_seed_search_multiplier == 0 {
            return Err(ConfigError::Invalid {
                key: "chd.max_seed_search_multiplier",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.traversal.max_traversal_occurrence == 0 {
            return Err(ConfigError::Invalid {
                key: "traversal.max_traversal_occurrence",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
