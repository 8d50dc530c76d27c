//! Perfect-hash index, GMOD taxonomy graph, paths and traversal

pub mod chd;
pub mod config;
pub mod error;
pub mod graph;
pub mod location;
pub mod node;
pub mod path;
pub mod traversal;
pub mod version;


#[cfg(any(test, feature = "test-fixtures"))]
pub mod test_utils;

pub use chd::{ChdDictionary, HashFunction};
pub use config::{ChdConfig, TraversalOptions, VersioningConfig, VistaConfig};
pub use error::{ChdBuildError, ConfigError, LocationError, PathError, StructuralError};
pub use graph::{Gmod, ROOT_CODE};
pub use location::{Location, LocationBuilder, LocationGroup, Locations, LocationsDto, RelativeLocation};
pub use node::{GmodDto, GmodNode, GmodNodeDto, GmodNodeMetadata, NodeId};
pub use path::{GmodPath, IndividualizableSet, PathNode};
pub use traversal::{Parents, TraversalHandlerResult};
pub use version::{InvalidVersion, VisVersion};
