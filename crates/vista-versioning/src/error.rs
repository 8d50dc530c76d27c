use thiserror::Error;

use vista_core::{PathError, VisVersion};
use vista_localid::LocalIdError;

/// Failure converting a node, path or LocalId to another release.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("'{code}' has no counterpart in {to_version} (converting from {from_version})")]
    NoMapping {
        code: String,
        from_version: VisVersion,
        to_version: VisVersion,
    },

    #[error("converted code '{code}' does not exist in {version}")]
    UnknownTargetCode { code: String, version: VisVersion },

    #[error("node '{code}' in {version} does not accept location '{location}'")]
    LocationNotAllowed {
        code: String,
        location: String,
        version: VisVersion,
    },

    #[error("converted path '{path}' is not valid in {version}: {error}")]
    InvalidTargetPath {
        path: String,
        version: VisVersion,
        #[source]
        error: PathError,
    },

    #[error("no route from '{parent}' to '{child}' in {version}")]
    Unrepairable {
        parent: String,
        child: String,
        version: VisVersion,
    },

    #[error("no target graphs given")]
    EmptyChain,

    #[error(transparent)]
    LocalId(#[from] LocalIdError),
}
