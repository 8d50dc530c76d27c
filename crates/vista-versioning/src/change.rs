//! Per-code change records between two VIS releases

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use vista_core::{InvalidVersion, VisVersion};

/// What happened to one code between a source and a target release.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionChange {
    /// Code is unchanged.
    SameAs,
    /// Code was replaced by another code.
    RenamedTo(String),
    /// The segment and its adjacent `partner` segment collapse into `target`.
    MergedInto { target: String, partner: String },
    /// Code has no counterpart in the target release.
    NoMapping,
}

/// One entry of a change table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionChangeRecord {
    pub source: VisVersion,
    pub target: VisVersion,
    pub code: String,
    pub change: VersionChange,
}

impl VersionChangeRecord {
    pub fn new(source: VisVersion, target: VisVersion, code: impl Into<String>, change: VersionChange) -> Self {
        VersionChangeRecord {
            source,
            target,
            code: code.into(),
            change,
        }
    }
}

/// Source of code changes between releases.
pub trait ChangeTable {
    /// Change for `code` going from `source` to `target`. Codes without a
    /// record are [`VersionChange::SameAs`].
    fn lookup(&self, source: &VisVersion, target: &VisVersion, code: &str) -> VersionChange;
}

impl<T: ChangeTable + ?Sized> ChangeTable for &T {
    fn lookup(&self, source: &VisVersion, target: &VisVersion, code: &str) -> VersionChange {
        (**self).lookup(source, target, code)
    }
}

/// In-memory [`ChangeTable`].
#[derive(Debug, Clone, Default)]
pub struct VersionChangeTable {
    changes: HashMap<(VisVersion, VisVersion), HashMap<String, VersionChange>>,
}

impl VersionChangeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = VersionChangeRecord>) -> Self {
        let mut table = Self::new();
        for record in records {
            table.insert(record);
        }
        table
    }

    /// Add or replace a record.
    pub fn insert(&mut self, record: VersionChangeRecord) {
        self.changes
            .entry((record.source, record.target))
            .or_default()
            .insert(record.code, record.change);
    }

    /// Total number of records across all release pairs.
    pub fn len(&self) -> usize {
        self.changes.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build from the serialized form: source release → code → change.
    ///
    /// A `removed` entry maps to [`VersionChange::NoMapping`]. A `nextCode`
    /// with `mergedWith` is a merge, without it a rename. A `previousCode`
    /// records the reverse rename towards `previousVisVersion`. Entries that
    /// name no counterpart release are skipped.
    pub fn from_dto(dto: &VersionChangesDto) -> Result<Self, InvalidVersion> {
        let mut table = Self::new();
        for (source, codes) in &dto.items {
            let source = VisVersion::new(source.as_str())?;
            for (code, entry) in codes {
                let next = entry.next_vis_version.as_deref().map(VisVersion::new).transpose()?;
                let previous = entry
                    .previous_vis_version
                    .as_deref()
                    .map(VisVersion::new)
                    .transpose()?;

                if let Some(next) = next {
                    let change = if entry.removed {
                        Some(VersionChange::NoMapping)
                    } else {
                        match (&entry.next_code, &entry.merged_with) {
                            (Some(target), Some(partner)) => Some(VersionChange::MergedInto {
                                target: target.clone(),
                                partner: partner.clone(),
                            }),
                            (Some(target), None) => Some(VersionChange::RenamedTo(target.clone())),
                            (None, _) => None,
                        }
                    };
                    if let Some(change) = change {
                        table.insert(VersionChangeRecord::new(source.clone(), next, code.clone(), change));
                    }
                } else if entry.removed || entry.next_code.is_some() {
                    tracing::debug!("Skipping change for '{}' in {}: no next version", code, source);
                }

                if let (Some(previous), Some(previous_code)) = (previous, &entry.previous_code) {
                    table.insert(VersionChangeRecord::new(
                        source.clone(),
                        previous,
                        code.clone(),
                        VersionChange::RenamedTo(previous_code.clone()),
                    ));
                }
            }
        }
        tracing::debug!("Loaded {} version change records", table.len());
        Ok(table)
    }
}

impl ChangeTable for VersionChangeTable {
    fn lookup(&self, source: &VisVersion, target: &VisVersion, code: &str) -> VersionChange {
        self.changes
            .get(&(source.clone(), target.clone()))
            .and_then(|codes| codes.get(code))
            .cloned()
            .unwrap_or(VersionChange::SameAs)
    }
}

/// Serialized change entry for one code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeChangeDto {
    #[serde(default)]
    pub next_vis_version: Option<String>,
    #[serde(default)]
    pub next_code: Option<String>,
    #[serde(default)]
    pub merged_with: Option<String>,
    #[serde(default)]
    pub removed: bool,
    #[serde(default)]
    pub previous_vis_version: Option<String>,
    #[serde(default)]
    pub previous_code: Option<String>,
}

/// Serialized change table: `{ "<release>": { "<code>": { ... } } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionChangesDto {
    pub items: BTreeMap<String, BTreeMap<String, NodeChangeDto>>,
}

impl VersionChangesDto {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
