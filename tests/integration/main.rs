//! Integration tests for Vista
//!
//! These tests drive the member crates together: datasets loaded from disk,
//! LocalIds parsed against them, and paths carried across releases.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

use vista::vista_core::test_utils::{minimal_gmod, sample_gmod_dto};
use vista::vista_localid::test_utils::{sample_codebooks, tag};
use vista::vista_versioning::test_utils::{sample_changes, successor_gmod, third_gmod};
use vista::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn write_json(dir: &Path, name: &str, value: &impl serde::Serialize) -> anyhow::Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(value)?)?;
    Ok(path)
}

fn codebooks_json(release: &str) -> serde_json::Value {
    serde_json::json!({
        "visRelease": release,
        "items": [
            { "name": "quantities", "values": { "temperature": ["temperature"], "pressure": ["pressure"] } },
            { "name": "positions", "values": { "flow": ["inlet", "outlet"] } },
            { "name": "unknown", "values": { "x": ["y"] } }
        ]
    })
}

/// A release loaded from its dataset files parses paths and LocalIds
#[test]
fn test_release_from_files() -> anyhow::Result<()> {
    init_tracing();
    let dir = TempDir::new()?;
    let gmod_path = write_json(dir.path(), "gmod-vis-3-4a.json", &sample_gmod_dto())?;
    let codebooks_path = write_json(dir.path(), "codebooks-vis-3-4a.json", &codebooks_json("3-4a"))?;

    let release = VisRelease::load(&gmod_path, &VistaConfig::default())?.with_codebooks_file(&codebooks_path)?;
    assert_eq!(release.version().as_str(), "3-4a");
    assert_eq!(release.gmod().len(), 15);

    let full = release.parse_path("VE/400a/410/411/411i/411.1/C101/C101.3/C101.31-2")?;
    let short = release.parse_path("411.1/C101.31-2")?;
    assert_eq!(full, short);

    let local_id = release.parse_local_id("/dnv-v2/vis-3-4a/411.1/C101.31-2/meta/qty-temperature/pos-centre")?;
    assert!(local_id.has_custom_tag());
    assert_eq!(
        local_id.to_string(),
        "/dnv-v2/vis-3-4a/411.1/C101.31-2/meta/qty-temperature/pos~centre"
    );
    Ok(())
}

/// Companion files for another release are refused
#[test]
fn test_release_mismatch_is_reported() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let gmod_path = write_json(dir.path(), "gmod.json", &sample_gmod_dto())?;
    let codebooks_path = write_json(dir.path(), "codebooks.json", &codebooks_json("3-5a"))?;

    let err = VisRelease::load(&gmod_path, &VistaConfig::default())?
        .with_codebooks_file(&codebooks_path)
        .err()
        .map(|e| e.to_string())
        .unwrap_or_default();
    assert!(err.contains("is for release 3-5a, expected 3-4a"), "{err}");

    let missing = VisRelease::load(&dir.path().join("absent.json"), &VistaConfig::default());
    assert!(missing.is_err());
    Ok(())
}

/// A locations file narrows which location codes paths may carry
#[test]
fn test_locations_file_restricts_paths() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let gmod_path = write_json(dir.path(), "gmod.json", &sample_gmod_dto())?;
    let locations_path = write_json(
        dir.path(),
        "locations.json",
        &serde_json::json!({
            "visRelease": "3-4a",
            "items": [{ "code": "P", "name": "Port" }, { "code": "S", "name": "Starboard" }]
        }),
    )?;

    let release = VisRelease::load(&gmod_path, &VistaConfig::default())?;
    assert!(release.parse_path("411.1-U/C101.31").is_ok());

    let release = release.with_locations_file(&locations_path)?;
    assert!(release.parse_path("411.1-1P/C101.31").is_ok());
    assert!(release.parse_path("411.1-U/C101.31").is_err());
    Ok(())
}

/// The minimal LocalId renders canonically and parses back to an equal value
#[test]
fn test_minimal_local_id_round_trip() -> anyhow::Result<()> {
    init_tracing();
    let release = VisRelease::new(minimal_gmod(), sample_codebooks());
    let primary = GmodPath::parse("VE/400/400a", release.gmod())?;

    let local_id = LocalIdBuilder::create(release.version().clone())
        .with_primary_item(primary)
        .with_metadata_tag(tag(release.codebooks(), CodebookName::Quantity, "temperature"))
        .build()?;
    let text = local_id.to_string();
    assert_eq!(text, "/dnv-v2/vis-v1/400a/meta/qty-temperature");
    assert_eq!(release.parse_local_id(&text)?, local_id);
    Ok(())
}

/// LocalIds of one vessel are selected by a query built from an example
#[test]
fn test_universal_ids_filtered_by_query() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let gmod_path = write_json(dir.path(), "gmod.json", &sample_gmod_dto())?;
    let release = VisRelease::load(&gmod_path, &VistaConfig::default())?.with_codebooks(sample_codebooks());

    let texts = [
        "data.dnv.com/IMO9074729/dnv-v2/vis-3-4a/411.1-1/C101.31/meta/qty-temperature",
        "data.dnv.com/IMO9074729/dnv-v2/vis-3-4a/411.1-2/C101.31/meta/qty-temperature",
        "data.dnv.com/IMO9074729/dnv-v2/vis-3-4a/511.1/C101.31/meta/qty-pressure",
    ];
    let ids = texts
        .iter()
        .map(|text| release.parse_universal_id(text))
        .collect::<Result<Vec<_>, _>>()?;
    let imo: ImoNumber = "IMO9074729".parse()?;
    assert!(ids.iter().all(|id| id.imo_number() == imo));

    let query = LocalIdQuery::from_local_id(ids[0].local_id());
    let matched: Vec<String> = ids
        .iter()
        .filter(|id| query.matches(id.local_id()))
        .map(ToString::to_string)
        .collect();
    assert_eq!(matched, vec![texts[0].to_string()]);

    let any_engine = LocalIdQuery::new().with_primary_item(GmodPathQuery::new().with_node("411.1", true));
    assert_eq!(ids.iter().filter(|id| any_engine.matches(id.local_id())).count(), 2);
    Ok(())
}

/// A config file changes the hash function and the recurrence policy
#[test]
fn test_config_file_drives_graph_build() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config_path = dir.path().join("vista.toml");
    fs::write(
        &config_path,
        "[chd]\nhash_function = \"crc32c\"\n\n[traversal]\nmax_traversal_occurrence = 2\n",
    )?;
    let config = VistaConfig::from_path(&config_path)?;
    assert_eq!(config.chd.hash_function, HashFunction::Crc32c);

    let gmod_path = write_json(dir.path(), "gmod.json", &sample_gmod_dto())?;
    let release = VisRelease::load(&gmod_path, &config)?;
    assert_eq!(release.gmod().traversal_options().max_traversal_occurrence, 2);
    assert!(release.gmod().get("C101.63").is_some());
    Ok(())
}

/// Paths and LocalIds carried from 3-4a through 3-5a to 3-6a
#[test]
fn test_conversion_across_releases() -> anyhow::Result<()> {
    init_tracing();
    let dir = TempDir::new()?;
    let gmod_path = write_json(dir.path(), "gmod.json", &sample_gmod_dto())?;
    let source = VisRelease::load(&gmod_path, &VistaConfig::default())?;
    let middle = successor_gmod();
    let last = third_gmod();
    let converter = VersionConverter::new(sample_changes());

    let path = source.parse_path("411.1/C101.31-2")?;
    let converted = converter.convert_path_through(&path, &[&middle, &last])?;
    assert_eq!(converted.version().as_str(), "3-6a");
    assert_eq!(converted.to_short_string(), "411.2/C101.35-2");
    // Re-parsing in the last release gives the same path.
    assert_eq!(GmodPath::parse(&converted.to_string(), &last)?, converted);

    let source = source.with_codebooks(sample_codebooks());
    let local_id = source.parse_local_id("/dnv-v2/vis-3-4a/411.1/C101.31/meta/qty-temperature")?;
    let converted = converter.convert_local_id(&local_id, &middle)?;
    assert_eq!(converted.to_string(), "/dnv-v2/vis-3-5a/411.2/C101.31/meta/qty-temperature");
    Ok(())
}

/// Change records loaded from JSON drive the same conversion
#[test]
fn test_conversion_from_change_dataset() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let changes_path = write_json(
        dir.path(),
        "changes.json",
        &serde_json::json!({
            "3-4a": {
                "411.1": { "nextVisVersion": "3-5a", "nextCode": "411.2" },
                "C101.6": { "nextVisVersion": "3-5a", "removed": true }
            }
        }),
    )?;
    let dto = VersionChangesDto::from_json(&fs::read_to_string(&changes_path)?)?;
    let table = VersionChangeTable::from_dto(&dto)?;

    let gmod_path = write_json(dir.path(), "gmod.json", &sample_gmod_dto())?;
    let source = VisRelease::load(&gmod_path, &VistaConfig::default())?;
    let target = successor_gmod();
    let converter = VersionConverter::new(&table);

    let path = source.parse_path("411.1/C101.31")?;
    assert_eq!(
        converter.convert_path(&path, &target)?.to_string(),
        "VE/400a/410/411/411i/411.2/C101/C101.3/C101.31"
    );

    let removed = source.parse_path("511.1/C101.63")?;
    let err = converter.convert_path(&removed, &target).unwrap_err();
    assert!(matches!(err, ConversionError::NoMapping { .. }));
    Ok(())
}
