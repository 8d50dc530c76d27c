//! Data-channel identifiers built on taxonomy paths

pub mod codebook;
pub mod errors;
pub mod local_id;
pub mod parser;
pub mod query;
pub mod tag;
pub mod universal_id;

#[cfg(test)]
pub mod tests;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod test_utils;

pub use codebook::{CodebookDto, CodebookName, CodebookTable, Codebooks, CodebooksDto, TagValidity};
pub use errors::{InvalidImoNumber, LocalIdError, LocalIdErrorCollector, ParsingErrors, ParsingState};
pub use local_id::{LocalId, LocalIdBuilder, NAMING_RULE};
pub use parser::LocalIdParser;
pub use query::{GmodPathQuery, LocalIdQuery, MetadataTagsQuery};
pub use tag::MetadataTag;
pub use universal_id::{ImoNumber, NAMING_ENTITY, UniversalId, UniversalIdBuilder};
