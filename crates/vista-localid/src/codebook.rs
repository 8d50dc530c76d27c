//! Codebook names and the value validation collaborator

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ParsingState;

/// Metadata tag categories, declared in LocalId rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CodebookName {
    Quantity,
    Content,
    Calculation,
    State,
    Command,
    Type,
    Position,
    Detail,
}

impl CodebookName {
    pub const ALL: [CodebookName; 8] = [
        CodebookName::Quantity,
        CodebookName::Content,
        CodebookName::Calculation,
        CodebookName::State,
        CodebookName::Command,
        CodebookName::Type,
        CodebookName::Position,
        CodebookName::Detail,
    ];

    /// Prefix used in tag segments, e.g. `qty` in `qty-temperature`.
    pub fn prefix(self) -> &'static str {
        match self {
            CodebookName::Quantity => "qty",
            CodebookName::Content => "cnt",
            CodebookName::Calculation => "calc",
            CodebookName::State => "state",
            CodebookName::Command => "cmd",
            CodebookName::Type => "type",
            CodebookName::Position => "pos",
            CodebookName::Detail => "detail",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<CodebookName> {
        Self::ALL.into_iter().find(|name| name.prefix() == prefix)
    }

    /// Name used for the codebook in dataset files.
    pub fn dataset_name(self) -> &'static str {
        match self {
            CodebookName::Quantity => "quantities",
            CodebookName::Content => "contents",
            CodebookName::Calculation => "calculations",
            CodebookName::State => "states",
            CodebookName::Command => "commands",
            CodebookName::Type => "types",
            CodebookName::Position => "positions",
            CodebookName::Detail => "detail",
        }
    }

    pub fn from_dataset_name(name: &str) -> Option<CodebookName> {
        Self::ALL.into_iter().find(|n| n.dataset_name() == name)
    }

    /// Parser stage that reads tags of this codebook.
    pub fn parsing_state(self) -> ParsingState {
        match self {
            CodebookName::Quantity => ParsingState::MetaQuantity,
            CodebookName::Content => ParsingState::MetaContent,
            CodebookName::Calculation => ParsingState::MetaCalculation,
            CodebookName::State => ParsingState::MetaState,
            CodebookName::Command => ParsingState::MetaCommand,
            CodebookName::Type => ParsingState::MetaType,
            CodebookName::Position => ParsingState::MetaPosition,
            CodebookName::Detail => ParsingState::MetaDetail,
        }
    }
}

impl fmt::Display for CodebookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Outcome of checking a tag value against a codebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagValidity {
    /// Listed in the codebook; rendered with `-`.
    Standard,
    /// Not listed but acceptable as a custom value; rendered with `~`.
    CustomAllowed,
    Invalid,
}

/// Validates metadata tag values.
pub trait Codebooks {
    fn validate(&self, name: CodebookName, value: &str) -> TagValidity;
}

/// Serialized codebook: groups of standard values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodebookDto {
    pub name: String,
    #[serde(default)]
    pub values: HashMap<String, Vec<String>>,
}

/// Serialized codebook set for one VIS release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodebooksDto {
    pub vis_release: String,
    pub items: Vec<CodebookDto>,
}

/// In-memory codebooks keyed by [`CodebookName`].
///
/// Values must use the tag alphabet `[a-z0-9.]`; positions may also contain
/// `-`. Detail values are always custom. Any other acceptable value not in
/// the table is custom.
#[derive(Debug, Clone, Default)]
pub struct CodebookTable {
    standard: HashMap<CodebookName, HashSet<String>>,
}

impl CodebookTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add standard values to a codebook.
    pub fn with_standard_values<I, S>(mut self, name: CodebookName, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.standard
            .entry(name)
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Build from a dataset. Codebooks with unknown names are skipped.
    pub fn from_dto(dto: &CodebooksDto) -> Self {
        let mut table = Self::new();
        for item in &dto.items {
            let Some(name) = CodebookName::from_dataset_name(&item.name) else {
                tracing::debug!("Skipping unknown codebook '{}'", item.name);
                continue;
            };
            let values = item.values.values().flatten().cloned();
            table = table.with_standard_values(name, values);
        }
        table
    }

    pub fn is_standard(&self, name: CodebookName, value: &str) -> bool {
        self.standard
            .get(&name)
            .is_some_and(|values| values.contains(value))
    }

    pub fn standard_values(&self, name: CodebookName) -> impl Iterator<Item = &str> {
        self.standard
            .get(&name)
            .into_iter()
            .flat_map(|values| values.iter().map(String::as_str))
    }
}

fn is_tag_char(name: CodebookName, c: char) -> bool {
    c.is_ascii_lowercase()
        || c.is_ascii_digit()
        || c == '.'
        || (c == '-' && name == CodebookName::Position)
}

impl Codebooks for CodebookTable {
    fn validate(&self, name: CodebookName, value: &str) -> TagValidity {
        if value.is_empty() || !value.chars().all(|c| is_tag_char(name, c)) {
            return TagValidity::Invalid;
        }
        if name == CodebookName::Detail {
            return TagValidity::CustomAllowed;
        }
        if self.is_standard(name, value) {
            TagValidity::Standard
        } else {
            TagValidity::CustomAllowed
        }
    }
}
