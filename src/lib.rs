//! DNV Vessel Information Structure toolkit
//!
//! Re-exports the member crates and bundles one release's graph and
//! codebooks, loaded from their JSON datasets.

use std::fs;
use std::path::Path;

use anyhow::Context;

pub use vista_core::{
    ChdDictionary, Gmod, GmodDto, GmodNode, GmodPath, HashFunction, IndividualizableSet, Location, Locations,
    LocationsDto, PathError, PathNode, TraversalHandlerResult, VisVersion, VistaConfig,
};
pub use vista_localid::{
    CodebookName, CodebookTable, Codebooks, CodebooksDto, GmodPathQuery, ImoNumber, LocalId, LocalIdBuilder,
    LocalIdError, LocalIdParser, LocalIdQuery, MetadataTag, MetadataTagsQuery, ParsingErrors, UniversalId,
    UniversalIdBuilder,
};
pub use vista_versioning::{ChangeTable, ConversionError, VersionChange, VersionChangeTable, VersionChangesDto, VersionConverter};
pub use vista_core;
pub use vista_localid;
pub use vista_versioning;

/// A release's graph together with the codebooks its LocalIds are checked against.
pub struct VisRelease {
    gmod: Gmod,
    codebooks: CodebookTable,
}

impl VisRelease {
    pub fn new(gmod: Gmod, codebooks: CodebookTable) -> Self {
        VisRelease { gmod, codebooks }
    }

    /// Load the graph from a GMOD dataset file. Codebooks start empty.
    pub fn load(gmod_path: &Path, config: &VistaConfig) -> anyhow::Result<Self> {
        let dto: GmodDto = read_json(gmod_path)?;
        let version = VisVersion::new(dto.vis_release.as_str())
            .with_context(|| format!("Dataset {} names an invalid release", gmod_path.display()))?;
        let gmod = Gmod::with_config(version, &dto, config)
            .with_context(|| format!("Failed to build graph from {}", gmod_path.display()))?;
        tracing::debug!("Loaded {} with {} nodes from {}", gmod.version(), gmod.len(), gmod_path.display());
        Ok(Self::new(gmod, CodebookTable::new()))
    }

    pub fn with_codebooks(mut self, codebooks: CodebookTable) -> Self {
        self.codebooks = codebooks;
        self
    }

    /// Replace the codebooks with those of a codebooks dataset file.
    pub fn with_codebooks_file(self, path: &Path) -> anyhow::Result<Self> {
        let dto: CodebooksDto = read_json(path)?;
        self.check_release(&dto.vis_release, path)?;
        Ok(self.with_codebooks(CodebookTable::from_dto(&dto)))
    }

    /// Replace the location rules with those of a locations dataset file.
    pub fn with_locations_file(mut self, path: &Path) -> anyhow::Result<Self> {
        let dto: LocationsDto = read_json(path)?;
        self.check_release(&dto.vis_release, path)?;
        self.gmod = self.gmod.with_locations(Locations::from_dto(&dto));
        Ok(self)
    }

    pub fn gmod(&self) -> &Gmod {
        &self.gmod
    }

    pub fn codebooks(&self) -> &CodebookTable {
        &self.codebooks
    }

    pub fn version(&self) -> &VisVersion {
        self.gmod.version()
    }

    /// Parse a path in full form, falling back to the short form.
    pub fn parse_path(&self, text: &str) -> Result<GmodPath<'_>, PathError> {
        GmodPath::parse(text, &self.gmod).or_else(|_| GmodPath::parse_short(text, &self.gmod))
    }

    pub fn local_id_parser(&self) -> LocalIdParser<'_> {
        LocalIdParser::new(&self.gmod, &self.codebooks)
    }

    pub fn parse_local_id(&self, text: &str) -> Result<LocalId<'_>, LocalIdError> {
        self.local_id_parser().parse(text)
    }

    pub fn parse_universal_id(&self, text: &str) -> Result<UniversalId<'_>, LocalIdError> {
        self.local_id_parser().parse_universal_id(text)
    }

    fn check_release(&self, release: &str, path: &Path) -> anyhow::Result<()> {
        if release != self.version().as_str() {
            anyhow::bail!(
                "{} is for release {}, expected {}",
                path.display(),
                release,
                self.version()
            );
        }
        Ok(())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}
