//! Validated routes through the graph, with full and short text forms
//!
//! Full form lists every segment from the root: `VE/411/411i/411.1/C101.31-2`.
//! Short form keeps only the leaf parents and the target: `411.1/C101.31-2`.
//! Either form may carry a secondary sequence after a `/sec/` marker.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::RangeInclusive;

use crate::error::PathError;
use crate::graph::Gmod;
use crate::location::Location;
use crate::node::GmodNode;
use crate::traversal::{TraversalHandlerResult, may_recur};
use crate::version::VisVersion;

/// Segment delimiter.
pub const SEGMENT_SEPARATOR: char = '/';
/// Separates a code from its location within a segment.
pub const LOCATION_SEPARATOR: char = '-';
/// Marker introducing the secondary sequence.
pub const SECONDARY_MARKER: &str = "sec";

/// One segment of a path: a node and its optional location.
#[derive(Debug, Clone)]
pub struct PathNode<'g> {
    node: &'g GmodNode,
    location: Option<Location>,
}

impl<'g> PathNode<'g> {
    pub fn new(node: &'g GmodNode, location: Option<Location>) -> Self {
        PathNode { node, location }
    }

    pub fn node(&self) -> &'g GmodNode {
        self.node
    }

    pub fn code(&self) -> &'g str {
        self.node.code()
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }
}

impl PartialEq for PathNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.node.code() == other.node.code() && self.location == other.location
    }
}

impl Eq for PathNode<'_> {}

impl Hash for PathNode<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.code().hash(state);
        self.location.hash(state);
    }
}

impl fmt::Display for PathNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}{}{}", self.node.code(), LOCATION_SEPARATOR, location),
            None => f.write_str(self.node.code()),
        }
    }
}

/// Consecutive segments that share one location.
///
/// Every set holds a leaf or the target, so its location always shows in the
/// short form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndividualizableSet {
    start: usize,
    end: usize,
}

impl IndividualizableSet {
    fn single(depth: usize) -> Self {
        IndividualizableSet { start: depth, end: depth }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn depths(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    pub fn contains(&self, depth: usize) -> bool {
        self.depths().contains(&depth)
    }
}

/// Group segments into individualizable sets.
///
/// Potential parents (groups, selections and leaves) close a scope. The
/// individualizable nodes of a scope form one set, which must be contiguous
/// and must reach a leaf or the target.
fn find_sets(segments: &[PathNode<'_>]) -> Result<Vec<IndividualizableSet>, PathError> {
    let Some(last) = segments.len().checked_sub(1) else {
        return Ok(Vec::new());
    };
    let mut sets = Vec::new();
    let mut scope: Option<usize> = None;
    for (depth, segment) in segments.iter().enumerate() {
        let node = segment.node;
        let is_target = depth == last;
        let is_parent = node.is_potential_parent();

        let Some(scope_start) = scope else {
            if is_parent {
                scope = Some(depth);
            }
            if node.is_individualizable(is_target, false) {
                sets.push(IndividualizableSet::single(depth));
            }
            continue;
        };

        if is_parent || is_target {
            let found = if scope_start + 1 == depth {
                node.is_individualizable(is_target, false)
                    .then(|| IndividualizableSet::single(depth))
            } else {
                scope_set(segments, scope_start + 1, depth)?
            };
            scope = Some(depth);
            let shown = |d: usize| d == last || segments[d].node.is_leaf_node();
            if let Some(set) = found.filter(|set| set.depths().any(shown)) {
                sets.push(set);
                continue;
            }
        }

        if is_target && node.is_individualizable(true, false) {
            sets.push(IndividualizableSet::single(depth));
        }
    }
    Ok(sets)
}

/// The set formed by `segments[from..=to]`, if any.
fn scope_set(segments: &[PathNode<'_>], from: usize, to: usize) -> Result<Option<IndividualizableSet>, PathError> {
    let last = segments.len() - 1;
    let mut set: Option<IndividualizableSet> = None;
    let mut location: Option<&Location> = None;
    let mut skipped = false;
    let mut has_composition = false;
    for depth in from..=to {
        let segment = &segments[depth];
        if !segment.node.is_individualizable(depth == last, true) {
            skipped |= set.is_some();
            continue;
        }
        if skipped {
            return Err(PathError::SplitIndividualizableSet(segment.code().to_string()));
        }
        if let (Some(first), Some(second)) = (location, segment.location.as_ref()) {
            if first != second {
                return Err(PathError::MixedSetLocations {
                    first: first.to_string(),
                    second: second.to_string(),
                });
            }
        }
        location = location.or(segment.location.as_ref());
        has_composition |= segment.node.is_function_composition();
        set = Some(match set {
            Some(set) => IndividualizableSet { start: set.start, end: depth },
            None => IndividualizableSet::single(depth),
        });
    }
    // A lone composition inside a scope cannot carry a location.
    Ok(set.filter(|set| set.start != set.end || !has_composition))
}

/// Give every member of a set the location carried by any of them.
fn spread_locations(segments: &mut [PathNode<'_>], sets: &[IndividualizableSet]) {
    for set in sets {
        let location = segments[set.depths()].iter().find_map(|s| s.location.clone());
        for segment in &mut segments[set.depths()] {
            segment.location = location.clone();
        }
    }
}

/// A validated route from the root to a target node.
///
/// Borrows its graph; immutable once built. Equality compares the version,
/// the codes and the locations of every segment.
#[derive(Clone)]
pub struct GmodPath<'g> {
    gmod: &'g Gmod,
    segments: Vec<PathNode<'g>>,
    secondary: Option<Vec<PathNode<'g>>>,
}

impl fmt::Debug for GmodPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GmodPath").field(&self.to_string()).finish()
    }
}

impl PartialEq for GmodPath<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.gmod.version() == other.gmod.version()
            && self.segments == other.segments
            && self.secondary == other.secondary
    }
}

impl Eq for GmodPath<'_> {}

impl Hash for GmodPath<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.gmod.version().hash(state);
        self.segments.hash(state);
        self.secondary.hash(state);
    }
}

impl fmt::Display for GmodPath<'_> {
    /// Canonical full form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_segments(f, self.segments.iter())?;
        if let Some(secondary) = &self.secondary {
            write!(f, "{SEGMENT_SEPARATOR}{SECONDARY_MARKER}{SEGMENT_SEPARATOR}")?;
            write_segments(f, secondary.iter())?;
        }
        Ok(())
    }
}

fn write_segments<'a, 'g: 'a>(
    f: &mut impl fmt::Write,
    segments: impl Iterator<Item = &'a PathNode<'g>>,
) -> fmt::Result {
    for (i, segment) in segments.enumerate() {
        if i > 0 {
            f.write_char(SEGMENT_SEPARATOR)?;
        }
        write!(f, "{segment}")?;
    }
    Ok(())
}

/// Raw `code[-location]` token before resolution.
struct Token<'t> {
    code: &'t str,
    location: Option<&'t str>,
    position: usize,
}

fn tokenize(text: &str) -> Result<Vec<Token<'_>>, PathError> {
    if text.is_empty() {
        return Err(PathError::Empty);
    }
    text.split(SEGMENT_SEPARATOR)
        .enumerate()
        .map(|(position, segment)| {
            let malformed = || PathError::MalformedSegment {
                segment: segment.to_string(),
                position,
            };
            let (code, location) = match segment.split_once(LOCATION_SEPARATOR) {
                Some((code, location)) => (code, Some(location)),
                None => (segment, None),
            };
            if code.is_empty() || location.is_some_and(str::is_empty) {
                return Err(malformed());
            }
            Ok(Token {
                code,
                location,
                position,
            })
        })
        .collect()
}

fn split_secondary(text: &str) -> (&str, Option<&str>) {
    let marker = format!("{SEGMENT_SEPARATOR}{SECONDARY_MARKER}{SEGMENT_SEPARATOR}");
    match text.split_once(marker.as_str()) {
        Some((primary, secondary)) => (primary, Some(secondary)),
        None => (text, None),
    }
}

fn resolve<'g>(gmod: &'g Gmod, token: &Token<'_>) -> Result<PathNode<'g>, PathError> {
    let node = gmod.get(token.code).ok_or_else(|| PathError::UnknownCode {
        code: token.code.to_string(),
        position: token.position,
    })?;
    let location = token
        .location
        .map(|text| {
            gmod.locations()
                .parse(text)
                .map_err(|source| PathError::InvalidLocation {
                    code: token.code.to_string(),
                    source,
                })
        })
        .transpose()?;
    Ok(PathNode::new(node, location))
}

/// Validate a root-anchored segment sequence against `gmod` and return its
/// individualizable sets.
fn validate(gmod: &Gmod, segments: &[PathNode<'_>]) -> Result<Vec<IndividualizableSet>, PathError> {
    let Some(first) = segments.first() else {
        return Err(PathError::Empty);
    };
    if first.code() != gmod.root().code() {
        return Err(PathError::NotRooted(first.code().to_string()));
    }

    for pair in segments.windows(2) {
        let (parent, child) = (pair[0].node, pair[1].node);
        if !gmod.is_child_node(parent, child) {
            return Err(PathError::InvalidStep {
                parent: parent.code().to_string(),
                child: child.code().to_string(),
            });
        }
    }

    let sets = find_sets(segments)?;
    for (depth, segment) in segments.iter().enumerate() {
        if let Some(location) = &segment.location {
            if !sets.iter().any(|set| set.contains(depth)) {
                return Err(PathError::LocationNotAllowed {
                    code: segment.code().to_string(),
                    location: location.to_string(),
                });
            }
        }
    }

    let limit = gmod.traversal_options().max_traversal_occurrence.max(1);
    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    for (depth, segment) in segments.iter().enumerate() {
        let count = occurrences.entry(segment.code()).or_insert(0);
        let allowed = depth == 0 || may_recur(segments[depth - 1].node, segment.node, *count, limit);
        if !allowed {
            return Err(PathError::Recursion {
                code: segment.code().to_string(),
                count: *count + 1,
                limit,
            });
        }
        *count += 1;
    }

    Ok(sets)
}

fn validate_divergence(primary: &[PathNode<'_>], secondary: &[PathNode<'_>]) -> Result<(), PathError> {
    let shared = primary
        .iter()
        .zip(secondary)
        .take_while(|(a, b)| a == b)
        .count();
    if shared == 0 || shared >= primary.len() || shared >= secondary.len() {
        return Err(PathError::SecondaryDoesNotDiverge);
    }
    Ok(())
}

impl<'g> GmodPath<'g> {
    /// Build and validate a path from root-anchored segments.
    ///
    /// A location on any member of an individualizable set is copied to the
    /// whole set.
    pub fn from_segments(gmod: &'g Gmod, mut segments: Vec<PathNode<'g>>) -> Result<Self, PathError> {
        let sets = validate(gmod, &segments)?;
        spread_locations(&mut segments, &sets);
        Ok(GmodPath {
            gmod,
            segments,
            secondary: None,
        })
    }

    /// Build from an ancestor chain produced by traversal. Such chains are
    /// valid by construction.
    pub(crate) fn from_chain(gmod: &'g Gmod, parents: &[&'g GmodNode], node: &'g GmodNode) -> Self {
        let segments = parents
            .iter()
            .chain(std::iter::once(&node))
            .map(|&n| PathNode::new(n, None))
            .collect();
        GmodPath {
            gmod,
            segments,
            secondary: None,
        }
    }

    /// Attach a secondary sequence; it must share a prefix with this path and branch off it.
    pub fn with_secondary(mut self, mut secondary: Vec<PathNode<'g>>) -> Result<Self, PathError> {
        let sets = validate(self.gmod, &secondary)?;
        spread_locations(&mut secondary, &sets);
        validate_divergence(&self.segments, &secondary)?;
        self.secondary = Some(secondary);
        Ok(self)
    }

    /// Parse the full form.
    ///
    /// The leading root may be omitted when the first segment is a child of
    /// the root. Every step must be a parent/child relation.
    pub fn parse(text: &str, gmod: &'g Gmod) -> Result<Self, PathError> {
        let (primary_text, secondary_text) = split_secondary(text);
        let primary = Self::parse_sequence(primary_text, gmod)?;
        let path = Self::from_segments(gmod, primary)?;
        match secondary_text {
            Some(secondary_text) => {
                let secondary = Self::parse_sequence(secondary_text, gmod)?;
                path.with_secondary(secondary)
            }
            None => Ok(path),
        }
    }

    fn parse_sequence(text: &str, gmod: &'g Gmod) -> Result<Vec<PathNode<'g>>, PathError> {
        let tokens = tokenize(text)?;
        let mut segments = tokens
            .iter()
            .map(|token| resolve(gmod, token))
            .collect::<Result<Vec<_>, _>>()?;

        let root = gmod.root();
        let first = segments[0].node;
        if first.code() != root.code() {
            if !gmod.is_child_node(root, first) {
                return Err(PathError::NotRooted(first.code().to_string()));
            }
            segments.insert(0, PathNode::new(root, None));
        }
        Ok(segments)
    }

    /// Parse the short form by discovering the full route through traversal.
    pub fn parse_short(text: &str, gmod: &'g Gmod) -> Result<Self, PathError> {
        let (primary_text, secondary_text) = split_secondary(text);
        let primary = Self::discover(primary_text, gmod)?;
        let path = Self::from_segments(gmod, primary)?;
        match secondary_text {
            Some(secondary_text) => {
                let secondary = Self::discover(secondary_text, gmod)?;
                path.with_secondary(secondary)
            }
            None => Ok(path),
        }
    }

    fn discover(text: &str, gmod: &'g Gmod) -> Result<Vec<PathNode<'g>>, PathError> {
        let tokens = tokenize(text)?;
        let wanted = tokens
            .iter()
            .map(|token| resolve(gmod, token))
            .collect::<Result<Vec<_>, _>>()?;
        let (target, leaves) = match wanted.split_last() {
            Some(split) => split,
            None => return Err(PathError::Empty),
        };

        let mut found: Option<Vec<&'g GmodNode>> = None;
        gmod.traverse(|parents, node| {
            let seen_leaves = parents.iter().filter(|p| p.is_leaf_node()).count();
            if node.code() == target.code() && seen_leaves == leaves.len() {
                let matches = parents
                    .iter()
                    .filter(|p| p.is_leaf_node())
                    .zip(leaves)
                    .all(|(p, want)| p.code() == want.code());
                if matches {
                    let mut chain = parents.to_vec();
                    chain.push(node);
                    found = Some(chain);
                    return TraversalHandlerResult::Stop;
                }
            }
            if node.is_leaf_node() {
                let expected = leaves.get(seen_leaves);
                if expected.is_none_or(|want| want.code() != node.code()) {
                    return TraversalHandlerResult::SkipSubtree;
                }
            }
            TraversalHandlerResult::Continue
        });

        let chain = found.ok_or_else(|| PathError::NoMatch(text.to_string()))?;

        // Shown segments (leaf parents and the target) line up one-to-one with
        // the tokens. Their locations reach the rest of each set on validation.
        let mut wanted = wanted.into_iter();
        let last = chain.len() - 1;
        let segments = chain
            .into_iter()
            .enumerate()
            .map(|(depth, node)| {
                let location = if depth == last || node.is_leaf_node() {
                    wanted.next().and_then(|w| w.location)
                } else {
                    None
                };
                PathNode::new(node, location)
            })
            .collect();
        Ok(segments)
    }

    // ── Accessors ───────────────────────────────────────────

    pub fn gmod(&self) -> &'g Gmod {
        self.gmod
    }

    pub fn version(&self) -> &'g VisVersion {
        self.gmod.version()
    }

    /// Number of segments, root and target included.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathNode<'g>] {
        &self.segments
    }

    /// Segments before the target.
    pub fn parents(&self) -> &[PathNode<'g>] {
        &self.segments[..self.segments.len() - 1]
    }

    pub fn target(&self) -> &PathNode<'g> {
        &self.segments[self.segments.len() - 1]
    }

    pub fn node_at(&self, depth: usize) -> Option<&PathNode<'g>> {
        self.segments.get(depth)
    }

    pub fn secondary(&self) -> Option<&[PathNode<'g>]> {
        self.secondary.as_deref()
    }

    /// Segments paired with their depth, root first.
    pub fn full_path(&self) -> impl Iterator<Item = (usize, &PathNode<'g>)> {
        self.segments.iter().enumerate()
    }

    pub fn is_mappable(&self) -> bool {
        self.gmod.is_mappable(self.target().node)
    }

    /// Runs of segments that each take one location.
    pub fn individualizable_sets(&self) -> Vec<IndividualizableSet> {
        // Sets were checked when the path was built.
        find_sets(&self.segments).unwrap_or_default()
    }

    /// Depths at which a location may be attached.
    pub fn individualizable_depths(&self) -> Vec<usize> {
        self.individualizable_sets()
            .iter()
            .flat_map(IndividualizableSet::depths)
            .collect()
    }

    pub fn is_individualizable(&self) -> bool {
        !self.individualizable_sets().is_empty()
    }

    // ── Derived names ───────────────────────────────────────

    /// Assignment name the node at `depth` gives to a deeper segment of this path.
    pub fn normal_assignment_name(&self, depth: usize) -> Option<&'g str> {
        let names = &self.segments.get(depth)?.node.metadata().normal_assignment_names;
        if names.is_empty() {
            return None;
        }
        self.segments
            .iter()
            .rev()
            .find_map(|segment| names.get(segment.code()).map(String::as_str))
    }

    /// Human-readable names for the function leaves and the target.
    pub fn common_names(&self) -> Vec<(usize, String)> {
        let last = self.segments.len() - 1;
        let target_code = self.target().code();
        let mut names = Vec::new();
        for (depth, segment) in self.full_path() {
            let node = segment.node;
            if !(node.is_leaf_node() || depth == last) || !node.is_function_node() {
                continue;
            }
            let mut name = node.display_name();
            let assignments = &node.metadata().normal_assignment_names;
            if !assignments.is_empty() {
                if let Some(assignment) = assignments.get(target_code) {
                    name = assignment.as_str();
                }
                for parent in self.segments[depth..last].iter().rev() {
                    if let Some(assignment) = assignments.get(parent.code()) {
                        name = assignment.as_str();
                    }
                }
            }
            names.push((depth, name.to_string()));
        }
        names
    }

    // ── Rendering and derivation ────────────────────────────

    /// Leaf parents and the target, with their locations.
    pub fn to_short_string(&self) -> String {
        let mut text = String::new();
        push_short(&mut text, &self.segments);
        if let Some(secondary) = &self.secondary {
            text.push(SEGMENT_SEPARATOR);
            text.push_str(SECONDARY_MARKER);
            text.push(SEGMENT_SEPARATOR);
            push_short(&mut text, secondary);
        }
        text
    }

    /// Copy with the location at `depth` replaced, along with the rest of
    /// its individualizable set.
    pub fn with_location(&self, depth: usize, location: Option<Location>) -> Result<Self, PathError> {
        if depth >= self.segments.len() {
            return Err(PathError::DepthOutOfRange {
                depth,
                len: self.segments.len(),
            });
        }
        let depths = self
            .individualizable_sets()
            .into_iter()
            .find(|set| set.contains(depth))
            .map_or(depth..=depth, |set| set.depths());
        let mut segments = self.segments.clone();
        for segment in &mut segments[depths] {
            segment.location = location.clone();
        }
        let path = Self::from_segments(self.gmod, segments)?;
        match &self.secondary {
            Some(secondary) => path.with_secondary(secondary.clone()),
            None => Ok(path),
        }
    }

    /// Copy with every location removed.
    ///
    /// A secondary sequence that only differed from the primary by location
    /// is dropped.
    pub fn without_locations(&self) -> Self {
        let strip = |segments: &[PathNode<'g>]| -> Vec<PathNode<'g>> {
            segments.iter().map(|s| PathNode::new(s.node, None)).collect()
        };
        let segments = strip(&self.segments);
        let secondary = self
            .secondary
            .as_deref()
            .map(strip)
            .filter(|secondary| validate_divergence(&segments, secondary).is_ok());
        if self.secondary.is_some() && secondary.is_none() {
            tracing::debug!("Dropped secondary of {} that no longer diverges", self);
        }
        GmodPath {
            gmod: self.gmod,
            segments,
            secondary,
        }
    }
}

fn push_short(text: &mut String, segments: &[PathNode<'_>]) {
    let last = segments.len() - 1;
    let shown = segments
        .iter()
        .enumerate()
        .filter(|(depth, segment)| *depth == last || segment.node.is_leaf_node());
    for (i, (_, segment)) in shown.enumerate() {
        if i > 0 {
            text.push(SEGMENT_SEPARATOR);
        }
        text.push_str(&segment.to_string());
    }
}
