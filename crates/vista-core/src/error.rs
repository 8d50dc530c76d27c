//! Error types for graph construction, path parsing, locations and configuration

use thiserror::Error;

use crate::location::LocationGroup;

/// Fatal inconsistency found while building a [`Gmod`](crate::Gmod).
///
/// Nothing usable can be built on a graph that fails these checks, so
/// construction stops at the first one found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("dataset contains no nodes")]
    Empty,

    #[error("duplicate node code '{0}'")]
    DuplicateCode(String),

    #[error("relation {parent} -> {child} references unknown code '{code}'")]
    DanglingRelation {
        parent: String,
        child: String,
        code: String,
    },

    #[error("relation must be a [parent, child] pair, got {0:?}")]
    MalformedRelation(Vec<String>),

    #[error("graph has no root node")]
    NoRoot,

    #[error("graph has multiple root nodes: {}", .0.join(", "))]
    MultipleRoots(Vec<String>),

    #[error("graph root is '{0}' but 'VE' is present")]
    RootNotVessel(String),

    #[error("failed to build code index: {0}")]
    Index(#[from] ChdBuildError),
}

/// Failure while building a [`ChdDictionary`](crate::chd::ChdDictionary).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChdBuildError {
    #[error("duplicate key '{0}'")]
    DuplicateKey(String),

    #[error("no displacement seeds found for {entries} entries (last table size {size})")]
    SeedSearchExhausted { entries: usize, size: usize },
}

/// Rejected location qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location is empty")]
    Empty,

    #[error("location '{0}' contains whitespace")]
    Whitespace(String),

    #[error("location '{location}' contains invalid code '{code}'")]
    InvalidCode { location: String, code: char },

    #[error("location '{0}' must start with its number")]
    NumberNotLeading(String),

    #[error("location '{0}' codes are not in alphabetical order")]
    NotSorted(String),

    #[error("location '{location}' has multiple {group} values: '{first}' and '{second}'")]
    GroupConflict {
        location: String,
        group: LocationGroup,
        first: char,
        second: char,
    },

    #[error("location number must be positive, got {0}")]
    InvalidNumber(i64),

    #[error("'{code}' is not a {group} code")]
    WrongGroup { code: char, group: LocationGroup },
}

/// Errors from parsing or validating a [`GmodPath`](crate::GmodPath).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,

    #[error("malformed segment '{segment}' at position {position}")]
    MalformedSegment { segment: String, position: usize },

    #[error("unknown node code '{code}' at position {position}")]
    UnknownCode { code: String, position: usize },

    #[error("path must start at the root or a child of the root, found '{0}'")]
    NotRooted(String),

    #[error("invalid parent/child step: '{child}' is not a child of '{parent}'")]
    InvalidStep { parent: String, child: String },

    #[error("invalid location on '{code}': {source}")]
    InvalidLocation {
        code: String,
        #[source]
        source: LocationError,
    },

    #[error("node '{code}' does not accept a location (got '{location}')")]
    LocationNotAllowed { code: String, location: String },

    #[error("individualizable set mixes locations '{first}' and '{second}'")]
    MixedSetLocations { first: String, second: String },

    #[error("individualizable set is interrupted before '{0}'")]
    SplitIndividualizableSet(String),

    #[error("code '{code}' occurs {count} times along the path (limit {limit})")]
    Recursion {
        code: String,
        count: usize,
        limit: usize,
    },

    #[error("secondary sequence does not diverge from the primary at a shared ancestor")]
    SecondaryDoesNotDiverge,

    #[error("no path in the graph matches '{0}'")]
    NoMatch(String),

    #[error("depth {depth} is out of range for a path of length {len}")]
    DepthOutOfRange { depth: usize, len: usize },
}

/// Failure loading a [`VistaConfig`](crate::VistaConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}
