//! LocalId text parser
//!
//! Walks the grammar stage by stage:
//!
//! ```text
//! /dnv-v2/vis-<version>/<primary>[/sec/<secondary>][/~<description>…]/meta[/<tag>…]
//! ```
//!
//! Naming rule and version problems end the parse. Item, description and tag
//! problems are recorded and parsing carries on, so one call reports every
//! error it can find.

use vista_core::path::LOCATION_SEPARATOR;
use vista_core::{Gmod, GmodPath, VisVersion};

use crate::codebook::{CodebookName, Codebooks};
use crate::errors::{LocalIdError, LocalIdErrorCollector, ParsingErrors, ParsingState};
use crate::local_id::{
    LocalId, LocalIdBuilder, META_MARKER, NAMING_RULE, SECONDARY_ITEM_MARKER, VERBOSE_PREFIX,
};
use crate::tag::{CUSTOM_SEPARATOR, MetadataTag, STANDARD_SEPARATOR};
use crate::universal_id::{ImoNumber, NAMING_ENTITY, UniversalId};

/// Parses LocalIds against one graph and one set of codebooks.
pub struct LocalIdParser<'a> {
    gmod: &'a Gmod,
    codebooks: &'a dyn Codebooks,
}

/// Item segments split out of the text, before resolution.
#[derive(Default)]
struct ItemSegments<'t> {
    primary: Vec<&'t str>,
    secondary: Option<Vec<&'t str>>,
    verbose: bool,
    has_meta: bool,
}

impl<'a> LocalIdParser<'a> {
    pub fn new(gmod: &'a Gmod, codebooks: &'a dyn Codebooks) -> Self {
        LocalIdParser { gmod, codebooks }
    }

    /// Parse, reporting only the first error's stage.
    pub fn parse(&self, text: &str) -> Result<LocalId<'a>, LocalIdError> {
        self.try_parse(text).map_err(LocalIdError::from)
    }

    /// Parse, reporting every error found.
    pub fn try_parse(&self, text: &str) -> Result<LocalId<'a>, ParsingErrors> {
        let mut errors = LocalIdErrorCollector::new();
        let builder = self.parse_into(text, &mut errors);

        let result = match builder {
            Some(builder) if !errors.has_errors() => builder.build().map_err(|e| errors.push(e)),
            _ => Err(()),
        };
        match result {
            Ok(local_id) => Ok(local_id),
            Err(()) => {
                if !errors.has_errors() {
                    errors.add(ParsingState::Formatting);
                }
                let errors = errors.build();
                tracing::debug!("Failed to parse LocalId '{}': {} error(s)", text, errors.len());
                Err(errors)
            }
        }
    }

    /// Parse a UniversalId, reporting only the first error's stage.
    pub fn parse_universal_id(&self, text: &str) -> Result<UniversalId<'a>, LocalIdError> {
        self.try_parse_universal_id(text).map_err(LocalIdError::from)
    }

    /// Parse a UniversalId: naming entity, IMO number, then a LocalId.
    pub fn try_parse_universal_id(&self, text: &str) -> Result<UniversalId<'a>, ParsingErrors> {
        let mut errors = LocalIdErrorCollector::new();
        let marker = format!("/{NAMING_RULE}/");
        let Some(start) = text.find(marker.as_str()) else {
            errors.add_with_message(ParsingState::NamingRule, "Failed to find LocalId start segment");
            return Err(errors.build());
        };
        let (vessel, local_id) = text.split_at(start);

        let mut segments = vessel.split('/');
        match segments.next() {
            Some(NAMING_ENTITY) => {}
            other => errors.add_with_message(
                ParsingState::NamingEntity,
                format!("Naming entity segment didn't match. Found: {}", other.unwrap_or_default()),
            ),
        }
        let imo_number = match segments.next().map(str::parse::<ImoNumber>) {
            Some(Ok(imo_number)) => Some(imo_number),
            Some(Err(err)) => {
                errors.add_with_message(ParsingState::ImoNumber, err.to_string());
                None
            }
            None => {
                errors.add(ParsingState::ImoNumber);
                None
            }
        };
        if segments.next().is_some() {
            errors.add_with_message(
                ParsingState::Formatting,
                format!("Unexpected segments before LocalId in '{vessel}'"),
            );
        }

        let local_id = match self.try_parse(local_id) {
            Ok(local_id) => Some(local_id),
            Err(local_errors) => {
                local_errors.into_iter().for_each(|e| errors.push(e));
                None
            }
        };
        match (imo_number, local_id) {
            (Some(imo_number), Some(local_id)) if !errors.has_errors() => {
                Ok(UniversalId::new(imo_number, local_id))
            }
            _ => {
                let errors = errors.build();
                tracing::debug!("Failed to parse UniversalId '{}': {} error(s)", text, errors.len());
                Err(errors)
            }
        }
    }

    fn parse_into(&self, text: &str, errors: &mut LocalIdErrorCollector) -> Option<LocalIdBuilder<'a>> {
        if text.is_empty() {
            errors.add(ParsingState::EmptyState);
            return None;
        }
        let Some(body) = text.strip_prefix('/') else {
            errors.add_with_message(
                ParsingState::Formatting,
                "Invalid format: missing '/' as first character",
            );
            return None;
        };
        let mut segments = body.split('/');

        match segments.next() {
            Some(NAMING_RULE) => {}
            Some("") | None => {
                errors.add(ParsingState::NamingRule);
                return None;
            }
            Some(other) => {
                errors.add_with_message(
                    ParsingState::NamingRule,
                    format!("Invalid naming rule '{other}', expected '{NAMING_RULE}'"),
                );
                return None;
            }
        }

        let version = self.parse_version(segments.next(), errors)?;

        let items = split_items(&mut segments);
        let primary = self.parse_item(&items.primary, ParsingState::PrimaryItem, errors);
        let secondary = items
            .secondary
            .as_deref()
            .and_then(|segments| self.parse_item(segments, ParsingState::SecondaryItem, errors));
        if !items.has_meta {
            errors.add(ParsingState::ItemDescription);
            return None;
        }

        let tags = self.parse_tags(segments, errors);
        if tags.is_empty() && !errors.has_errors() {
            errors.add(ParsingState::EmptyState);
        }

        tracing::trace!(
            "LocalId stages: primary={:?} secondary={:?} verbose={} tags={}",
            primary.as_ref().map(GmodPath::to_short_string),
            secondary.as_ref().map(GmodPath::to_short_string),
            items.verbose,
            tags.len()
        );

        let mut builder = LocalIdBuilder::create(version).with_verbose_mode(items.verbose);
        if let Some(primary) = primary {
            builder = builder.with_primary_item(primary);
        }
        if let Some(secondary) = secondary {
            builder = builder.with_secondary_item(secondary);
        }
        Some(
            tags.into_iter()
                .fold(builder, |builder, tag| builder.with_metadata_tag(tag)),
        )
    }

    fn parse_version(&self, token: Option<&str>, errors: &mut LocalIdErrorCollector) -> Option<VisVersion> {
        let token = match token {
            Some(token) if !token.is_empty() => token,
            _ => {
                errors.add(ParsingState::VisVersion);
                return None;
            }
        };
        let Ok(version) = VisVersion::from_local_id_token(token) else {
            errors.add_with_message(
                ParsingState::VisVersion,
                format!("Invalid vis version '{token}'"),
            );
            return None;
        };
        if &version != self.gmod.version() {
            errors.add_with_message(
                ParsingState::VisVersion,
                format!(
                    "Version {token} does not match the graph version {}",
                    self.gmod.version().to_local_id_token()
                ),
            );
            return None;
        }
        Some(version)
    }

    fn parse_item(
        &self,
        segments: &[&str],
        state: ParsingState,
        errors: &mut LocalIdErrorCollector,
    ) -> Option<GmodPath<'a>> {
        let label = if state == ParsingState::SecondaryItem {
            "Secondary"
        } else {
            "Primary"
        };
        if segments.is_empty() {
            errors.add(state);
            return None;
        }

        // Unknown codes are reported one by one before the path as a whole.
        let mut all_known = true;
        for segment in segments {
            let code = segment
                .split_once(LOCATION_SEPARATOR)
                .map_or(*segment, |(code, _)| code);
            if self.gmod.get(code).is_none() {
                errors.add_with_message(state, format!("Invalid GmodNode in {label} item: {code}"));
                all_known = false;
            }
        }
        if !all_known {
            return None;
        }

        let text = segments.join("/");
        match GmodPath::parse_short(&text, self.gmod) {
            Ok(path) => Some(path),
            Err(err) => {
                errors.add_with_message(
                    state,
                    format!("Invalid GmodPath in {label} item: {text}: {err}"),
                );
                None
            }
        }
    }

    fn parse_tags<'t>(
        &self,
        segments: impl Iterator<Item = &'t str>,
        errors: &mut LocalIdErrorCollector,
    ) -> Vec<MetadataTag> {
        let mut tags: Vec<MetadataTag> = Vec::new();
        for segment in segments.filter(|s| !s.is_empty()) {
            let Some(split) = segment.find([STANDARD_SEPARATOR, CUSTOM_SEPARATOR]) else {
                errors.add_with_message(
                    ParsingState::Formatting,
                    format!("Invalid metadata tag '{segment}': missing '-' or '~' after the prefix"),
                );
                continue;
            };
            let (prefix, value) = (&segment[..split], &segment[split + 1..]);
            let Some(name) = CodebookName::from_prefix(prefix) else {
                errors.add_with_message(
                    ParsingState::Formatting,
                    format!("Invalid metadata tag: unknown prefix {prefix}"),
                );
                continue;
            };
            let state = name.parsing_state();

            if let Some(previous) = tags.last().map(MetadataTag::name) {
                if name == previous {
                    errors.add_with_message(state, format!("Duplicate {name} metadata tag"));
                    continue;
                }
                if name < previous {
                    errors.add_with_message(
                        state,
                        format!("Metadata tag {segment} must come before {}", previous.prefix()),
                    );
                    continue;
                }
            }
            if value.is_empty() {
                errors.add_with_message(state, format!("Invalid {name} metadata tag: missing value"));
                continue;
            }

            match MetadataTag::new(name, value, self.codebooks) {
                Ok(tag) => tags.push(tag),
                Err(err) => errors.push(err),
            }
        }
        tags
    }
}

/// Consume item, secondary and description segments up to and including `meta`.
fn split_items<'t>(segments: &mut impl Iterator<Item = &'t str>) -> ItemSegments<'t> {
    let mut items = ItemSegments::default();
    let mut stage = ParsingState::PrimaryItem;
    for segment in segments {
        if segment == META_MARKER {
            items.has_meta = true;
            break;
        }
        if stage == ParsingState::ItemDescription {
            continue;
        }
        if segment.starts_with(VERBOSE_PREFIX) {
            items.verbose = true;
            stage = ParsingState::ItemDescription;
            continue;
        }
        if segment == SECONDARY_ITEM_MARKER && stage == ParsingState::PrimaryItem {
            stage = ParsingState::SecondaryItem;
            items.secondary = Some(Vec::new());
            continue;
        }
        match (&stage, items.secondary.as_mut()) {
            (ParsingState::SecondaryItem, Some(secondary)) => secondary.push(segment),
            _ => items.primary.push(segment),
        }
    }
    items
}
