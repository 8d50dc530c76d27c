//! Taxonomy nodes, their metadata, and the dataset shapes they are built from

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ── Category and type tokens ────────────────────────────────

pub const CATEGORY_ASSET: &str = "ASSET";
pub const CATEGORY_FUNCTION: &str = "FUNCTION";
pub const CATEGORY_PRODUCT: &str = "PRODUCT";
pub const CATEGORY_ASSET_FUNCTION: &str = "ASSET FUNCTION";
pub const CATEGORY_PRODUCT_FUNCTION: &str = "PRODUCT FUNCTION";

pub const TYPE_SELECTION: &str = "SELECTION";
pub const TYPE_GROUP: &str = "GROUP";
pub const TYPE_LEAF: &str = "LEAF";
pub const TYPE_TYPE: &str = "TYPE";
pub const TYPE_COMPOSITION: &str = "COMPOSITION";

/// Index of a node in its graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Descriptive attributes of a node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GmodNodeMetadata {
    pub category: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub name: String,
    pub common_name: Option<String>,
    pub definition: Option<String>,
    pub common_definition: Option<String>,
    pub install_substructure: Option<bool>,
    /// Child code → assignment name used in place of the child's own name.
    pub normal_assignment_names: HashMap<String, String>,
}

impl GmodNodeMetadata {
    /// `"<category> <type>"`, e.g. `ASSET FUNCTION LEAF`.
    pub fn full_type(&self) -> String {
        format!("{} {}", self.category, self.node_type)
    }
}

/// A node of the taxonomy graph.
///
/// Nodes are owned by their [`Gmod`](crate::Gmod) and never hold links to
/// other nodes; relations live in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GmodNode {
    id: NodeId,
    code: String,
    metadata: GmodNodeMetadata,
}

impl GmodNode {
    pub(crate) fn new(id: NodeId, code: String, metadata: GmodNodeMetadata) -> Self {
        GmodNode { id, code, metadata }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn metadata(&self) -> &GmodNodeMetadata {
        &self.metadata
    }

    pub fn category(&self) -> &str {
        &self.metadata.category
    }

    pub fn node_type(&self) -> &str {
        &self.metadata.node_type
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Common name if present, otherwise the name.
    pub fn display_name(&self) -> &str {
        self.metadata
            .common_name
            .as_deref()
            .unwrap_or(&self.metadata.name)
    }

    // ── Classification ──────────────────────────────────────

    pub fn is_leaf_node(&self) -> bool {
        let full_type = self.metadata.full_type();
        full_type == "ASSET FUNCTION LEAF" || full_type == "PRODUCT FUNCTION LEAF"
    }

    pub fn is_function_node(&self) -> bool {
        let category = self.category();
        category != CATEGORY_PRODUCT && category != CATEGORY_ASSET
    }

    pub fn is_product_selection(&self) -> bool {
        self.category() == CATEGORY_PRODUCT && self.node_type() == TYPE_SELECTION
    }

    pub fn is_product_type(&self) -> bool {
        self.category() == CATEGORY_PRODUCT && self.node_type() == TYPE_TYPE
    }

    pub fn is_asset(&self) -> bool {
        self.category() == CATEGORY_ASSET
    }

    pub fn is_asset_function_node(&self) -> bool {
        self.category() == CATEGORY_ASSET_FUNCTION
    }

    pub fn is_function_composition(&self) -> bool {
        let category = self.category();
        (category == CATEGORY_ASSET_FUNCTION || category == CATEGORY_PRODUCT_FUNCTION)
            && self.node_type() == TYPE_COMPOSITION
    }

    /// Whether a location may be attached to this node.
    ///
    /// `is_target` marks the last node of a path; `in_set` marks membership
    /// of a multi-node individualizable set.
    pub fn is_individualizable(&self, is_target: bool, in_set: bool) -> bool {
        let node_type = self.node_type();
        if node_type == TYPE_GROUP || node_type == TYPE_SELECTION {
            return false;
        }
        if self.is_product_type() {
            return false;
        }
        if self.category() == CATEGORY_ASSET && node_type == TYPE_TYPE {
            return false;
        }
        if self.is_function_composition() {
            return self.code.ends_with('i') || in_set || is_target;
        }
        true
    }

    /// Node types that open a new scope for individualizable sets.
    pub fn is_potential_parent(&self) -> bool {
        matches!(self.node_type(), TYPE_SELECTION | TYPE_GROUP | TYPE_LEAF)
    }

    /// Whether `child` is a product selection hung under a function node.
    /// Such edges are exempt from the recurrence limit.
    pub fn is_product_selection_assignment(parent: &GmodNode, child: &GmodNode) -> bool {
        parent.category().contains(CATEGORY_FUNCTION)
            && child.category().contains(CATEGORY_PRODUCT)
            && child.node_type() == TYPE_SELECTION
    }
}

// ── Dataset input ───────────────────────────────────────────

/// One node record of a GMOD dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmodNodeDto {
    pub category: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub common_definition: Option<String>,
    #[serde(default)]
    pub install_substructure: Option<bool>,
    #[serde(default)]
    pub normal_assignment_names: Option<HashMap<String, String>>,
}

impl GmodNodeDto {
    pub fn new(code: &str, category: &str, node_type: &str, name: &str) -> Self {
        GmodNodeDto {
            category: category.to_string(),
            node_type: node_type.to_string(),
            code: code.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub(crate) fn to_metadata(&self) -> GmodNodeMetadata {
        GmodNodeMetadata {
            category: self.category.clone(),
            node_type: self.node_type.clone(),
            name: self.name.clone(),
            common_name: self.common_name.clone(),
            definition: self.definition.clone(),
            common_definition: self.common_definition.clone(),
            install_substructure: self.install_substructure,
            normal_assignment_names: self.normal_assignment_names.clone().unwrap_or_default(),
        }
    }
}

/// A complete GMOD dataset: nodes plus `[parent, child]` relation pairs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmodDto {
    pub vis_release: String,
    pub items: Vec<GmodNodeDto>,
    pub relations: Vec<Vec<String>>,
}

impl GmodDto {
    /// Parse a dataset from its JSON form.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
