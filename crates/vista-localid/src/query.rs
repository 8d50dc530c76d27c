//! Matching paths and LocalIds against partial descriptions
//!
//! Queries compare node codes and locations within whichever release the
//! matched value belongs to. Convert values first to compare across releases.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use vista_core::{GmodPath, Location};

use crate::codebook::CodebookName;
use crate::local_id::LocalId;
use crate::tag::MetadataTag;

/// Locations a required node may carry.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LocationFilter {
    Any,
    Unlocated,
    OneOf(BTreeSet<Location>),
}

impl LocationFilter {
    fn from_locations(locations: impl IntoIterator<Item = Location>) -> Self {
        let locations: BTreeSet<Location> = locations.into_iter().collect();
        if locations.is_empty() {
            LocationFilter::Unlocated
        } else {
            LocationFilter::OneOf(locations)
        }
    }

    fn accepts(&self, found: &[&Location]) -> bool {
        match self {
            LocationFilter::Any => true,
            LocationFilter::Unlocated => found.is_empty(),
            LocationFilter::OneOf(wanted) => found.iter().any(|location| wanted.contains(*location)),
        }
    }
}

/// Nodes a path must pass through, each with the locations it may carry.
///
/// The empty query matches every path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GmodPathQuery {
    nodes: BTreeMap<String, LocationFilter>,
}

impl GmodPathQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the last node of every individualizable set of `path`, with
    /// the set's location or with none when the set has no location.
    pub fn from_path(path: &GmodPath<'_>) -> Self {
        let segments = path.segments();
        let nodes = path
            .individualizable_sets()
            .iter()
            .map(|set| {
                let segment = &segments[set.end()];
                let filter = LocationFilter::from_locations(segment.location().cloned());
                (segment.code().to_string(), filter)
            })
            .collect();
        GmodPathQuery { nodes }
    }

    /// Require `code`. With `any_location` the node may carry any location,
    /// otherwise it must carry none.
    pub fn with_node(mut self, code: &str, any_location: bool) -> Self {
        let filter = if any_location {
            LocationFilter::Any
        } else {
            LocationFilter::Unlocated
        };
        self.nodes.insert(code.to_string(), filter);
        self
    }

    /// Require `code` carrying one of `locations`; no locations means none.
    pub fn with_node_locations(mut self, code: &str, locations: impl IntoIterator<Item = Location>) -> Self {
        self.nodes
            .insert(code.to_string(), LocationFilter::from_locations(locations));
        self
    }

    /// Accept any location on every required node.
    pub fn without_locations(mut self) -> Self {
        for filter in self.nodes.values_mut() {
            *filter = LocationFilter::Any;
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Codes the query requires, in code order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Whether the primary sequence of `path` satisfies every requirement.
    pub fn matches(&self, path: &GmodPath<'_>) -> bool {
        let mut found: HashMap<&str, Vec<&Location>> = HashMap::new();
        for segment in path.segments() {
            found
                .entry(segment.code())
                .or_default()
                .extend(segment.location());
        }
        self.nodes.iter().all(|(code, filter)| {
            found
                .get(code.as_str())
                .is_some_and(|locations| filter.accepts(locations))
        })
    }
}

/// Tags a LocalId must carry.
///
/// By default other tags may be present too. An exact query also requires
/// the LocalId to carry no tag beyond those listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataTagsQuery {
    tags: BTreeMap<CodebookName, MetadataTag>,
    exact: bool,
}

impl MetadataTagsQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_local_id(local_id: &LocalId<'_>, allow_other_tags: bool) -> Self {
        local_id
            .metadata_tags()
            .cloned()
            .fold(Self::new(), Self::with_tag)
            .with_allow_other_tags(allow_other_tags)
    }

    /// Require `tag`, replacing any requirement on the same codebook.
    pub fn with_tag(mut self, tag: MetadataTag) -> Self {
        self.tags.insert(tag.name(), tag);
        self
    }

    pub fn with_allow_other_tags(mut self, allow: bool) -> Self {
        self.exact = !allow;
        self
    }

    pub fn matches(&self, local_id: &LocalId<'_>) -> bool {
        if self.tags.is_empty() {
            return !self.exact;
        }
        let present: BTreeMap<CodebookName, &MetadataTag> =
            local_id.metadata_tags().map(|tag| (tag.name(), tag)).collect();
        let required = self
            .tags
            .iter()
            .all(|(name, tag)| present.get(name).is_some_and(|found| *found == tag));
        required && (!self.exact || present.len() == self.tags.len())
    }
}

/// Combined requirements on a LocalId's items and tags.
///
/// Unset parts match anything. A secondary item requirement fails on a
/// LocalId without a secondary item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalIdQuery {
    primary: Option<GmodPathQuery>,
    secondary: Option<GmodPathQuery>,
    tags: Option<MetadataTagsQuery>,
}

impl LocalIdQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query matching `local_id` and any LocalId with the same sets and
    /// tags, extra tags allowed.
    pub fn from_local_id(local_id: &LocalId<'_>) -> Self {
        LocalIdQuery {
            primary: Some(GmodPathQuery::from_path(local_id.primary_item())),
            secondary: local_id.secondary_item().map(GmodPathQuery::from_path),
            tags: Some(MetadataTagsQuery::from_local_id(local_id, true)),
        }
    }

    pub fn with_primary_item(mut self, query: GmodPathQuery) -> Self {
        self.primary = Some(query);
        self
    }

    pub fn with_secondary_item(mut self, query: GmodPathQuery) -> Self {
        self.secondary = Some(query);
        self
    }

    pub fn with_tags(mut self, query: MetadataTagsQuery) -> Self {
        self.tags = Some(query);
        self
    }

    pub fn primary_item(&self) -> Option<&GmodPathQuery> {
        self.primary.as_ref()
    }

    pub fn secondary_item(&self) -> Option<&GmodPathQuery> {
        self.secondary.as_ref()
    }

    pub fn tags(&self) -> Option<&MetadataTagsQuery> {
        self.tags.as_ref()
    }

    pub fn matches(&self, local_id: &LocalId<'_>) -> bool {
        let primary = self
            .primary
            .as_ref()
            .is_none_or(|query| query.matches(local_id.primary_item()));
        let secondary = self.secondary.as_ref().is_none_or(|query| {
            local_id
                .secondary_item()
                .is_some_and(|item| query.matches(item))
        });
        let tags = self.tags.as_ref().is_none_or(|query| query.matches(local_id));
        primary && secondary && tags
    }
}
