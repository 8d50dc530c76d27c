//! Converts nodes, paths and LocalIds from one release's graph to another's
//!
//! Paths are converted segment by segment through a [`ChangeTable`], resolved
//! against the target graph, and validated there with the ordinary path rules.

use vista_core::{Gmod, GmodNode, GmodPath, Location, PathError, PathNode, VersioningConfig, VisVersion};
use vista_localid::{LocalId, LocalIdBuilder};

use crate::change::{ChangeTable, VersionChange};
use crate::error::ConversionError;

/// Segment after code changes, before resolution in the target graph.
#[derive(Debug)]
struct Rewritten<'s> {
    source_code: &'s str,
    code: String,
    location: Option<Location>,
}

pub struct VersionConverter<T> {
    table: T,
    config: VersioningConfig,
}

impl<T: ChangeTable> VersionConverter<T> {
    pub fn new(table: T) -> Self {
        Self::with_config(table, VersioningConfig::default())
    }

    pub fn with_config(table: T, config: VersioningConfig) -> Self {
        VersionConverter { table, config }
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    pub fn config(&self) -> &VersioningConfig {
        &self.config
    }

    /// Counterpart of `node` (from release `source`) in `target`.
    pub fn convert_node<'t>(
        &self,
        source: &VisVersion,
        node: &GmodNode,
        target: &'t Gmod,
    ) -> Result<&'t GmodNode, ConversionError> {
        let code = match self.table.lookup(source, target.version(), node.code()) {
            VersionChange::SameAs => node.code().to_string(),
            VersionChange::RenamedTo(code) => code,
            VersionChange::MergedInto { target: code, .. } => code,
            VersionChange::NoMapping => {
                return Err(ConversionError::NoMapping {
                    code: node.code().to_string(),
                    from_version: source.clone(),
                    to_version: target.version().clone(),
                });
            }
        };
        target.get(&code).ok_or_else(|| ConversionError::UnknownTargetCode {
            code,
            version: target.version().clone(),
        })
    }

    /// Convert `path` into `target`, secondary sequence included.
    pub fn convert_path<'t>(
        &self,
        path: &GmodPath<'_>,
        target: &'t Gmod,
    ) -> Result<GmodPath<'t>, ConversionError> {
        let source = path.version();
        let primary = self.convert_segments(source, path.segments(), target)?;
        let mut converted = self.validated(primary, target)?;
        if let Some(secondary) = path.secondary() {
            let secondary = self.convert_segments(source, secondary, target)?;
            let secondary = self.repaired(secondary, target)?;
            converted = converted
                .with_secondary(secondary)
                .map_err(|error| invalid_target(error, path.to_string(), target))?;
        }
        tracing::debug!(
            "Converted '{}' ({}) to '{}' ({})",
            path,
            source,
            converted,
            target.version()
        );
        Ok(converted)
    }

    /// Convert through each graph of `chain` in turn; the result belongs to the last one.
    pub fn convert_path_through<'t>(
        &self,
        path: &GmodPath<'_>,
        chain: &[&'t Gmod],
    ) -> Result<GmodPath<'t>, ConversionError> {
        let (first, rest) = chain.split_first().ok_or(ConversionError::EmptyChain)?;
        let mut current = self.convert_path(path, first)?;
        for &next in rest {
            current = self.convert_path(&current, next)?;
        }
        Ok(current)
    }

    /// Convert both items of `local_id` into `target`; tags and verbose mode carry over.
    pub fn convert_local_id<'t>(
        &self,
        local_id: &LocalId<'_>,
        target: &'t Gmod,
    ) -> Result<LocalId<'t>, ConversionError> {
        let mut builder = LocalIdBuilder::create(target.version().clone())
            .with_primary_item(self.convert_path(local_id.primary_item(), target)?)
            .with_verbose_mode(local_id.verbose_mode());
        if let Some(secondary) = local_id.secondary_item() {
            builder = builder.with_secondary_item(self.convert_path(secondary, target)?);
        }
        let builder = local_id
            .metadata_tags()
            .cloned()
            .fold(builder, LocalIdBuilder::with_metadata_tag);
        Ok(builder.build()?)
    }

    fn convert_segments<'t>(
        &self,
        source: &VisVersion,
        segments: &[PathNode<'_>],
        target: &'t Gmod,
    ) -> Result<Vec<PathNode<'t>>, ConversionError> {
        let rewritten = self.rewrite(source, segments, target.version())?;
        resolve(rewritten, target)
    }

    fn rewrite<'s>(
        &self,
        source: &VisVersion,
        segments: &'s [PathNode<'_>],
        target: &VisVersion,
    ) -> Result<Vec<Rewritten<'s>>, ConversionError> {
        let mut out: Vec<Rewritten<'s>> = Vec::with_capacity(segments.len());
        let mut i = 0;
        while i < segments.len() {
            let segment = &segments[i];
            let source_code = segment.code();
            let location = segment.location().cloned();
            let change = self.table.lookup(source, target, source_code);
            if change != VersionChange::SameAs {
                tracing::trace!("{} -> {}: '{}' {:?}", source, target, source_code, change);
            }

            match change {
                VersionChange::SameAs => push(&mut out, source_code, source_code.to_string(), location),
                VersionChange::RenamedTo(code) => push(&mut out, source_code, code, location),
                VersionChange::MergedInto {
                    target: code,
                    partner,
                } => {
                    if let Some(next) = segments.get(i + 1).filter(|next| next.code() == partner) {
                        let location = next.location().cloned().or(location);
                        push(&mut out, source_code, code, location);
                        i += 1;
                    } else if let Some(previous) = out.last_mut().filter(|prev| prev.source_code == partner) {
                        previous.code = code;
                        if location.is_some() {
                            previous.location = location;
                        }
                    } else {
                        push(&mut out, source_code, code, location);
                    }
                }
                VersionChange::NoMapping => {
                    return Err(ConversionError::NoMapping {
                        code: source_code.to_string(),
                        from_version: source.clone(),
                        to_version: target.clone(),
                    });
                }
            }
            i += 1;
        }
        Ok(out)
    }

    fn validated<'t>(
        &self,
        segments: Vec<PathNode<'t>>,
        target: &'t Gmod,
    ) -> Result<GmodPath<'t>, ConversionError> {
        let segments = self.repaired(segments, target)?;
        GmodPath::from_segments(target, segments.clone())
            .map_err(|error| invalid_target(error, render(&segments), target))
    }

    /// Splice in intermediate routes where a step is not a direct relation.
    /// A no-op unless link repair is enabled.
    fn repaired<'t>(
        &self,
        segments: Vec<PathNode<'t>>,
        target: &'t Gmod,
    ) -> Result<Vec<PathNode<'t>>, ConversionError> {
        if !self.config.repair_missing_links {
            return Ok(segments);
        }
        let mut repaired: Vec<PathNode<'t>> = Vec::with_capacity(segments.len());
        for segment in segments {
            if let Some(previous) = repaired.last() {
                if !target.is_child_node(previous.node(), segment.node()) {
                    let chain: Vec<&'t GmodNode> = repaired.iter().map(PathNode::node).collect();
                    let Some(route) = target.path_exists_between(&chain, segment.node()) else {
                        return Err(ConversionError::Unrepairable {
                            parent: previous.code().to_string(),
                            child: segment.code().to_string(),
                            version: target.version().clone(),
                        });
                    };
                    tracing::warn!(
                        "Repaired missing link '{}' -> '{}' in {} via {} node(s)",
                        previous.code(),
                        segment.code(),
                        target.version(),
                        route.len()
                    );
                    repaired.extend(route.into_iter().map(|node| PathNode::new(node, None)));
                }
            }
            repaired.push(segment);
        }
        Ok(repaired)
    }
}

/// Append, folding into the previous segment when both end up with the same code.
fn push<'s>(out: &mut Vec<Rewritten<'s>>, source_code: &'s str, code: String, location: Option<Location>) {
    if let Some(previous) = out.last_mut() {
        if previous.code == code {
            if location.is_some() {
                previous.location = location;
            }
            return;
        }
    }
    out.push(Rewritten {
        source_code,
        code,
        location,
    });
}

/// Locations are checked once the whole path is known, since they depend on
/// the individualizable sets of the target.
fn resolve<'t>(rewritten: Vec<Rewritten<'_>>, target: &'t Gmod) -> Result<Vec<PathNode<'t>>, ConversionError> {
    rewritten
        .into_iter()
        .map(|segment| {
            let node = target
                .get(&segment.code)
                .ok_or_else(|| ConversionError::UnknownTargetCode {
                    code: segment.code.clone(),
                    version: target.version().clone(),
                })?;
            Ok(PathNode::new(node, segment.location))
        })
        .collect()
}

fn render(segments: &[PathNode<'_>]) -> String {
    segments
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/")
}

fn invalid_target(error: PathError, path: String, target: &Gmod) -> ConversionError {
    let version = target.version().clone();
    match error {
        PathError::LocationNotAllowed { code, location } => ConversionError::LocationNotAllowed {
            code,
            location,
            version,
        },
        error => ConversionError::InvalidTargetPath { path, version, error },
    }
}
