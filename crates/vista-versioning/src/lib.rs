//! Carries paths and LocalIds across VIS releases

pub mod change;
pub mod converter;
pub mod error;


#[cfg(any(test, feature = "test-fixtures"))]
pub mod test_utils;

pub use change::{ChangeTable, NodeChangeDto, VersionChange, VersionChangeRecord, VersionChangeTable, VersionChangesDto};
pub use converter::VersionConverter;
pub use error::ConversionError;
