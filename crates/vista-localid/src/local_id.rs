//! LocalId values, their builder, and canonical rendering

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::hash::{Hash, Hasher};

use vista_core::{GmodPath, Location, VisVersion};

use crate::codebook::CodebookName;
use crate::errors::{LocalIdError, ParsingState};
use crate::tag::MetadataTag;

/// Naming rule token that opens every LocalId.
pub const NAMING_RULE: &str = "dnv-v2";
/// Segment separating the items from the metadata tags.
pub const META_MARKER: &str = "meta";
/// Segment introducing the secondary item.
pub const SECONDARY_ITEM_MARKER: &str = "sec";
/// Prefix of verbose description segments.
pub const VERBOSE_PREFIX: char = '~';

/// Incrementally assembles a [`LocalId`].
///
/// Every `with_*`/`without_*` method consumes and returns the builder.
#[derive(Debug, Clone, Default)]
pub struct LocalIdBuilder<'g> {
    version: Option<VisVersion>,
    primary: Option<GmodPath<'g>>,
    secondary: Option<GmodPath<'g>>,
    verbose: bool,
    tags: BTreeMap<CodebookName, MetadataTag>,
}

impl<'g> LocalIdBuilder<'g> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder preset with a VIS version.
    pub fn create(version: VisVersion) -> Self {
        Self::new().with_vis_version(version)
    }

    pub fn with_vis_version(mut self, version: VisVersion) -> Self {
        self.version = Some(version);
        self
    }

    pub fn without_vis_version(mut self) -> Self {
        self.version = None;
        self
    }

    pub fn with_primary_item(mut self, item: GmodPath<'g>) -> Self {
        self.primary = Some(item);
        self
    }

    pub fn without_primary_item(mut self) -> Self {
        self.primary = None;
        self
    }

    pub fn with_secondary_item(mut self, item: GmodPath<'g>) -> Self {
        self.secondary = Some(item);
        self
    }

    pub fn without_secondary_item(mut self) -> Self {
        self.secondary = None;
        self
    }

    pub fn with_verbose_mode(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set a tag, replacing any tag of the same codebook.
    pub fn with_metadata_tag(mut self, tag: MetadataTag) -> Self {
        self.tags.insert(tag.name(), tag);
        self
    }

    pub fn without_metadata_tag(mut self, name: CodebookName) -> Self {
        self.tags.remove(&name);
        self
    }

    pub fn vis_version(&self) -> Option<&VisVersion> {
        self.version.as_ref()
    }

    pub fn primary_item(&self) -> Option<&GmodPath<'g>> {
        self.primary.as_ref()
    }

    pub fn secondary_item(&self) -> Option<&GmodPath<'g>> {
        self.secondary.as_ref()
    }

    pub fn verbose_mode(&self) -> bool {
        self.verbose
    }

    pub fn metadata_tag(&self, name: CodebookName) -> Option<&MetadataTag> {
        self.tags.get(&name)
    }

    pub fn metadata_tags(&self) -> impl Iterator<Item = &MetadataTag> {
        self.tags.values()
    }

    pub fn has_custom_tag(&self) -> bool {
        self.tags.values().any(MetadataTag::is_custom)
    }

    /// Version, primary item and at least one tag are present.
    pub fn is_valid(&self) -> bool {
        self.version.is_some() && self.primary.is_some() && !self.tags.is_empty()
    }

    /// No items and no tags.
    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.secondary.is_none() && self.tags.is_empty()
    }

    pub fn is_empty_metadata(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn build(self) -> Result<LocalId<'g>, LocalIdError> {
        if self.is_empty() {
            return Err(LocalIdError::predefined(ParsingState::EmptyState));
        }
        let version = self
            .version
            .ok_or_else(|| LocalIdError::predefined(ParsingState::VisVersion))?;
        let primary = self
            .primary
            .ok_or_else(|| LocalIdError::predefined(ParsingState::PrimaryItem))?;
        check_item(&primary, &version, ParsingState::PrimaryItem)?;
        if let Some(secondary) = &self.secondary {
            check_item(secondary, &version, ParsingState::SecondaryItem)?;
        }
        if self.tags.is_empty() {
            return Err(LocalIdError::new(
                ParsingState::EmptyState,
                "A LocalId requires at least one metadata tag",
            ));
        }
        Ok(LocalId {
            version,
            primary,
            secondary: self.secondary,
            verbose: self.verbose,
            tags: self.tags,
        })
    }
}

fn check_item(item: &GmodPath<'_>, version: &VisVersion, state: ParsingState) -> Result<(), LocalIdError> {
    if item.version() != version {
        return Err(LocalIdError::new(
            state,
            format!(
                "Item '{}' belongs to {}, expected {}",
                item.to_short_string(),
                item.version().to_local_id_token(),
                version.to_local_id_token()
            ),
        ));
    }
    if item.secondary().is_some() {
        return Err(LocalIdError::new(
            state,
            format!("Item '{item}' carries its own secondary sequence"),
        ));
    }
    Ok(())
}

/// A complete data-channel identifier.
///
/// Equality compares version, items and tags; verbose mode only affects
/// rendering.
#[derive(Debug, Clone)]
pub struct LocalId<'g> {
    version: VisVersion,
    primary: GmodPath<'g>,
    secondary: Option<GmodPath<'g>>,
    verbose: bool,
    tags: BTreeMap<CodebookName, MetadataTag>,
}

impl<'g> LocalId<'g> {
    pub fn vis_version(&self) -> &VisVersion {
        &self.version
    }

    pub fn primary_item(&self) -> &GmodPath<'g> {
        &self.primary
    }

    pub fn secondary_item(&self) -> Option<&GmodPath<'g>> {
        self.secondary.as_ref()
    }

    pub fn verbose_mode(&self) -> bool {
        self.verbose
    }

    pub fn metadata_tag(&self, name: CodebookName) -> Option<&MetadataTag> {
        self.tags.get(&name)
    }

    /// Tags in rendering order.
    pub fn metadata_tags(&self) -> impl Iterator<Item = &MetadataTag> {
        self.tags.values()
    }

    pub fn has_custom_tag(&self) -> bool {
        self.tags.values().any(MetadataTag::is_custom)
    }

    /// Builder holding the same parts.
    pub fn to_builder(&self) -> LocalIdBuilder<'g> {
        LocalIdBuilder {
            version: Some(self.version.clone()),
            primary: Some(self.primary.clone()),
            secondary: self.secondary.clone(),
            verbose: self.verbose,
            tags: self.tags.clone(),
        }
    }
}

impl PartialEq for LocalId<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.primary == other.primary
            && self.secondary == other.secondary
            && self.tags == other.tags
    }
}

impl Eq for LocalId<'_> {}

impl Hash for LocalId<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.version.hash(state);
        self.primary.hash(state);
        self.secondary.hash(state);
        for tag in self.tags.values() {
            tag.hash(state);
        }
    }
}

impl fmt::Display for LocalId<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{NAMING_RULE}/{}/", self.version.to_local_id_token())?;
        write!(f, "{}/", self.primary.to_short_string())?;
        if let Some(secondary) = &self.secondary {
            write!(f, "{SECONDARY_ITEM_MARKER}/{}/", secondary.to_short_string())?;
        }
        if self.verbose {
            write_descriptions(f, &self.primary, "~")?;
            if let Some(secondary) = &self.secondary {
                write_descriptions(f, secondary, "~for.")?;
            }
        }
        f.write_str(META_MARKER)?;
        for tag in self.tags.values() {
            write!(f, "/{tag}")?;
        }
        Ok(())
    }
}

fn write_descriptions(f: &mut impl fmt::Write, path: &GmodPath<'_>, first_prefix: &str) -> fmt::Result {
    let mut prefix = first_prefix;
    for (depth, name) in path.common_names() {
        f.write_str(prefix)?;
        prefix = "~";
        let location = path.node_at(depth).and_then(|segment| segment.location());
        write_verbose_name(f, &name, location)?;
        f.write_char('/')?;
    }
    Ok(())
}

fn is_iso_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~')
}

/// Lowercase `name` with every run of spaces or non-ISO characters folded into one `.`.
fn write_verbose_name(f: &mut impl fmt::Write, name: &str, location: Option<&Location>) -> fmt::Result {
    let mut prev = None;
    for c in name.chars().filter(|&c| c != '/') {
        let current = if is_iso_char(c) && c != ' ' {
            c.to_ascii_lowercase()
        } else {
            '.'
        };
        if current == '.' && prev == Some('.') {
            continue;
        }
        f.write_char(current)?;
        prev = Some(current);
    }
    if let Some(location) = location {
        write!(f, ".{location}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verbose(name: &str) -> String {
        let mut out = String::new();
        write_verbose_name(&mut out, name, None).unwrap();
        out
    }

    #[test]
    fn test_verbose_name_cleaning() {
        assert_eq!(verbose("Propulsion engine"), "propulsion.engine");
        assert_eq!(verbose("Fuel  oil / transfer"), "fuel.oil.transfer");
        assert_eq!(verbose("Main (aft) unit"), "main.aft.unit");
        assert_eq!(verbose("Søkk"), "s.kk");
    }
}
