//! Codebook fixtures for tests

use crate::codebook::{CodebookName, CodebookTable, Codebooks};
use crate::tag::MetadataTag;

/// A handful of standard values per codebook.
pub fn sample_codebooks() -> CodebookTable {
    CodebookTable::new()
        .with_standard_values(CodebookName::Quantity, ["temperature", "pressure", "level"])
        .with_standard_values(CodebookName::Content, ["exhaust.gas", "fuel.oil", "cooling.water"])
        .with_standard_values(CodebookName::Calculation, ["average", "maximum"])
        .with_standard_values(CodebookName::State, ["opened", "running"])
        .with_standard_values(CodebookName::Command, ["start", "stop"])
        .with_standard_values(CodebookName::Type, ["alarm", "set.point"])
        .with_standard_values(CodebookName::Position, ["inlet", "outlet"])
}

pub fn tag(codebooks: &dyn Codebooks, name: CodebookName, value: &str) -> MetadataTag {
    MetadataTag::new(name, value, codebooks).expect("valid test tag")
}
