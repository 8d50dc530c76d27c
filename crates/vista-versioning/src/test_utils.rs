//! Successor releases of the sample taxonomy and the changes between them

use std::collections::HashMap;

use vista_core::test_utils::{node, relation, version};
use vista_core::{Gmod, GmodDto};

use crate::change::{VersionChange, VersionChangeRecord, VersionChangeTable};

/// The sample taxonomy as of release 3-5a.
///
/// ```text
/// VE
/// ├── 400a ── 410 ── 411 ── 411i (group) ── 411.2 (leaf) ─┐
/// └── 500a ── 502 ── 511.1 (leaf) ────────────────────────┤
///                                                         C101
///                                                         └── C101.3 ── C101.31 (leaf)
/// ```
///
/// `411.1` became `411.2`, `511` was folded into `511.1` under a new `502`
/// group, and the cooling branch below `C101` is gone.
pub fn successor_gmod_dto() -> GmodDto {
    successor_dto("3-5a", "C101.31")
}

pub fn successor_gmod() -> Gmod {
    Gmod::new(version("3-5a"), &successor_gmod_dto()).expect("successor dataset is consistent")
}

/// Release 3-6a: as 3-5a with `C101.31` renamed to `C101.35`.
pub fn third_gmod() -> Gmod {
    Gmod::new(version("3-6a"), &successor_dto("3-6a", "C101.35")).expect("third dataset is consistent")
}

fn successor_dto(release: &str, fuel_code: &str) -> GmodDto {
    let mut generator = node("511.1", "ASSET FUNCTION", "LEAF", "Generator driver");
    generator.normal_assignment_names = Some(HashMap::from([(
        "C101".to_string(),
        "Generator engine".to_string(),
    )]));

    GmodDto {
        vis_release: release.to_string(),
        items: vec![
            node("VE", "ASSET FUNCTION", "GROUP", "Vessel"),
            node("400a", "ASSET FUNCTION", "GROUP", "Propulsion and steering"),
            node("410", "ASSET FUNCTION", "GROUP", "Propulsion"),
            node("411", "ASSET FUNCTION", "COMPOSITION", "Propulsion driver arrangements"),
            node("411i", "ASSET FUNCTION", "GROUP", "Propulsion driver arrangement"),
            node("411.2", "ASSET FUNCTION", "LEAF", "Propulsion engine"),
            node("500a", "ASSET FUNCTION", "GROUP", "Power generation"),
            node("502", "ASSET FUNCTION", "GROUP", "Generating sets"),
            generator,
            node("C101", "PRODUCT", "TYPE", "Reciprocating internal combustion engine"),
            node("C101.3", "PRODUCT FUNCTION", "GROUP", "Engine auxiliary systems"),
            node(fuel_code, "PRODUCT FUNCTION", "LEAF", "Fuel system"),
        ],
        relations: vec![
            relation("VE", "400a"),
            relation("400a", "410"),
            relation("410", "411"),
            relation("411", "411i"),
            relation("411i", "411.2"),
            relation("411.2", "C101"),
            relation("VE", "500a"),
            relation("500a", "502"),
            relation("502", "511.1"),
            relation("511.1", "C101"),
            relation("C101", "C101.3"),
            relation("C101.3", fuel_code),
        ],
    }
}

/// Changes from the sample release (3-4a) to 3-5a, and from 3-5a to 3-6a.
pub fn sample_changes() -> VersionChangeTable {
    let (v34, v35, v36) = (version("3-4a"), version("3-5a"), version("3-6a"));
    let renamed = |code: &str| VersionChange::RenamedTo(code.to_string());
    VersionChangeTable::from_records([
        VersionChangeRecord::new(v34.clone(), v35.clone(), "411.1", renamed("411.2")),
        VersionChangeRecord::new(
            v34.clone(),
            v35.clone(),
            "511",
            VersionChange::MergedInto {
                target: "511.1".to_string(),
                partner: "511.1".to_string(),
            },
        ),
        VersionChangeRecord::new(v34.clone(), v35.clone(), "C101.6", VersionChange::NoMapping),
        VersionChangeRecord::new(v34.clone(), v35.clone(), "C101.63", VersionChange::NoMapping),
        VersionChangeRecord::new(v34, v35.clone(), "S206", VersionChange::NoMapping),
        VersionChangeRecord::new(v35, v36, "C101.31", renamed("C101.35")),
    ])
}
