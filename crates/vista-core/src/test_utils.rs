//! Sample datasets for tests

use std::collections::HashMap;

use crate::graph::Gmod;
use crate::node::{GmodDto, GmodNodeDto};
use crate::version::VisVersion;

/// Build a node record.
pub fn node(code: &str, category: &str, node_type: &str, name: &str) -> GmodNodeDto {
    GmodNodeDto::new(code, category, node_type, name)
}

/// Build a `[parent, child]` relation.
pub fn relation(parent: &str, child: &str) -> Vec<String> {
    vec![parent.to_string(), child.to_string()]
}

pub fn version(value: &str) -> VisVersion {
    VisVersion::new(value).expect("valid test version")
}

/// A slice of the real taxonomy around the propulsion engine.
///
/// ```text
/// VE
/// ├── 400a ── 410 ── 411 ── 411i ── 411.1 (leaf) ─┐
/// └── 500a ── 511 ── 511.1 (leaf) ────────────────┤
///                                                 C101 (product type)
///                                                 ├── C101.3 ── C101.31 (leaf)
///                                                 └── C101.6 ── C101.63 (leaf) ── S206
/// ```
///
/// `C101` is shared by both engine leaves, so everything below it is
/// reachable through two ancestor chains.
pub fn sample_gmod_dto() -> GmodDto {
    let mut generator = node("511.1", "ASSET FUNCTION", "LEAF", "Generator driver");
    generator.normal_assignment_names = Some(HashMap::from([(
        "C101".to_string(),
        "Generator engine".to_string(),
    )]));

    let mut fuel = node("C101.31", "PRODUCT FUNCTION", "LEAF", "Fuel system");
    fuel.common_name = Some("Fuel".to_string());

    GmodDto {
        vis_release: "3-4a".to_string(),
        items: vec![
            node("VE", "ASSET FUNCTION", "GROUP", "Vessel"),
            node("400a", "ASSET FUNCTION", "GROUP", "Propulsion and steering"),
            node("410", "ASSET FUNCTION", "GROUP", "Propulsion"),
            node("411", "ASSET FUNCTION", "COMPOSITION", "Propulsion driver arrangements"),
            node("411i", "ASSET FUNCTION", "COMPOSITION", "Propulsion driver arrangement"),
            node("411.1", "ASSET FUNCTION", "LEAF", "Propulsion engine"),
            node("500a", "ASSET FUNCTION", "GROUP", "Power generation"),
            node("511", "ASSET FUNCTION", "COMPOSITION", "Electric power generation"),
            generator,
            node("C101", "PRODUCT", "TYPE", "Reciprocating internal combustion engine"),
            node("C101.3", "PRODUCT FUNCTION", "GROUP", "Engine auxiliary systems"),
            fuel,
            node("C101.6", "PRODUCT FUNCTION", "GROUP", "Engine cooling"),
            node("C101.63", "PRODUCT FUNCTION", "LEAF", "Cooling system"),
            node("S206", "PRODUCT", "SELECTION", "Cooling water system"),
        ],
        relations: vec![
            relation("VE", "400a"),
            relation("400a", "410"),
            relation("410", "411"),
            relation("411", "411i"),
            relation("411i", "411.1"),
            relation("411.1", "C101"),
            relation("VE", "500a"),
            relation("500a", "511"),
            relation("511", "511.1"),
            relation("511.1", "C101"),
            relation("C101", "C101.3"),
            relation("C101.3", "C101.31"),
            relation("C101", "C101.6"),
            relation("C101.6", "C101.63"),
            relation("C101.63", "S206"),
        ],
    }
}

pub fn sample_gmod() -> Gmod {
    Gmod::new(version("3-4a"), &sample_gmod_dto()).expect("sample dataset is consistent")
}

/// Root `VE`, child `400`, grandchild `400a`.
pub fn minimal_gmod_dto() -> GmodDto {
    GmodDto {
        vis_release: "v1".to_string(),
        items: vec![
            node("VE", "ASSET FUNCTION", "GROUP", "Vessel"),
            node("400", "ASSET FUNCTION", "GROUP", "Propulsion"),
            node("400a", "ASSET FUNCTION", "LEAF", "Propulsion unit"),
        ],
        relations: vec![relation("VE", "400"), relation("400", "400a")],
    }
}

pub fn minimal_gmod() -> Gmod {
    Gmod::new(version("v1"), &minimal_gmod_dto()).expect("minimal dataset is consistent")
}
