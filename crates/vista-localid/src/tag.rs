//! Metadata tags: a codebook name plus a standard or custom value

use std::fmt;

use crate::codebook::{CodebookName, Codebooks, TagValidity};
use crate::errors::LocalIdError;

/// Separator between prefix and a standard value.
pub const STANDARD_SEPARATOR: char = '-';
/// Separator between prefix and a custom value.
pub const CUSTOM_SEPARATOR: char = '~';

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetadataTag {
    name: CodebookName,
    value: String,
    is_custom: bool,
}

impl MetadataTag {
    /// Create a tag whose kind is decided by `codebooks`.
    pub fn new(
        name: CodebookName,
        value: impl Into<String>,
        codebooks: &dyn Codebooks,
    ) -> Result<Self, LocalIdError> {
        let value = value.into();
        match codebooks.validate(name, &value) {
            TagValidity::Standard => Ok(MetadataTag {
                name,
                value,
                is_custom: false,
            }),
            TagValidity::CustomAllowed => Ok(MetadataTag {
                name,
                value,
                is_custom: true,
            }),
            TagValidity::Invalid => Err(LocalIdError::new(
                name.parsing_state(),
                format!("Invalid {name} metadata tag value '{value}'"),
            )),
        }
    }

    pub fn name(&self) -> CodebookName {
        self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_custom(&self) -> bool {
        self.is_custom
    }

    pub fn prefix(&self) -> &'static str {
        self.name.prefix()
    }

    pub fn separator(&self) -> char {
        if self.is_custom {
            CUSTOM_SEPARATOR
        } else {
            STANDARD_SEPARATOR
        }
    }
}

impl fmt::Display for MetadataTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.prefix(), self.separator(), self.value)
    }
}
