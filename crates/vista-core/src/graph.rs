//! The GMOD taxonomy graph: node arena, code index and relation set

use std::collections::HashSet;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::chd::ChdDictionary;
use crate::config::{TraversalOptions, VistaConfig};
use crate::error::{ChdBuildError, StructuralError};
use crate::location::Locations;
use crate::node::{
    CATEGORY_FUNCTION, CATEGORY_PRODUCT, GmodDto, GmodNode, NodeId, TYPE_SELECTION, TYPE_TYPE,
};
use crate::version::VisVersion;

/// Code of the conventional root node.
pub const ROOT_CODE: &str = "VE";

/// A versioned taxonomy graph.
///
/// Nodes live in an arena indexed by [`NodeId`]; the relation set is a petgraph
/// `DiGraph` whose node indices mirror the arena. Codes resolve through a
/// perfect-hash index. Immutable once built and safe to share across threads.
pub struct Gmod {
    version: VisVersion,
    nodes: Vec<GmodNode>,
    index: ChdDictionary<NodeId>,
    relations: DiGraph<(), ()>,
    root: NodeId,
    locations: Locations,
    traversal: TraversalOptions,
}

impl std::fmt::Debug for Gmod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gmod")
            .field("version", &self.version)
            .field("node_count", &self.nodes.len())
            .field("relation_count", &self.relations.edge_count())
            .field("root", &self.root().code())
            .finish()
    }
}

#[inline]
fn ix(id: NodeId) -> NodeIndex {
    NodeIndex::new(id.index())
}

impl Gmod {
    /// Build a graph with the default configuration.
    pub fn new(version: VisVersion, dto: &GmodDto) -> Result<Self, StructuralError> {
        Self::with_config(version, dto, &VistaConfig::default())
    }

    /// Build a graph, taking the hash function and recurrence policy from `config`.
    pub fn with_config(
        version: VisVersion,
        dto: &GmodDto,
        config: &VistaConfig,
    ) -> Result<Self, StructuralError> {
        if dto.items.is_empty() {
            return Err(StructuralError::Empty);
        }

        let mut nodes = Vec::with_capacity(dto.items.len());
        let mut relations = DiGraph::with_capacity(dto.items.len(), dto.relations.len());
        for (i, item) in dto.items.iter().enumerate() {
            let id = NodeId(i as u32);
            nodes.push(GmodNode::new(id, item.code.clone(), item.to_metadata()));
            relations.add_node(());
        }

        let index = ChdDictionary::build_with(
            nodes.iter().map(|n: &GmodNode| (n.code().to_string(), n.id())),
            &config.chd,
        )
        .map_err(|e| match e {
            ChdBuildError::DuplicateKey(code) => StructuralError::DuplicateCode(code),
            other => StructuralError::Index(other),
        })?;

        let mut seen = HashSet::with_capacity(dto.relations.len());
        let mut pairs = Vec::with_capacity(dto.relations.len());
        for relation in &dto.relations {
            let [parent, child] = relation.as_slice() else {
                return Err(StructuralError::MalformedRelation(relation.clone()));
            };
            let resolve = |code: &String| {
                index
                    .get(code)
                    .copied()
                    .ok_or_else(|| StructuralError::DanglingRelation {
                        parent: parent.clone(),
                        child: child.clone(),
                        code: code.clone(),
                    })
            };
            let pair = (resolve(parent)?, resolve(child)?);
            if seen.insert(pair) {
                pairs.push(pair);
            }
        }

        // petgraph lists neighbors newest-first; insert in reverse so that
        // children and parents come back in dataset order.
        for &(parent, child) in pairs.iter().rev() {
            relations.add_edge(ix(parent), ix(child), ());
        }

        let roots: Vec<NodeId> = nodes
            .iter()
            .map(GmodNode::id)
            .filter(|&id| {
                relations
                    .neighbors_directed(ix(id), Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect();
        let root = match roots.as_slice() {
            [] => return Err(StructuralError::NoRoot),
            [root] => *root,
            many => {
                let mut codes: Vec<String> = many
                    .iter()
                    .map(|id| nodes[id.index()].code().to_string())
                    .collect();
                codes.sort();
                return Err(StructuralError::MultipleRoots(codes));
            }
        };
        if let Some(ve) = index.get(ROOT_CODE) {
            if *ve != root {
                return Err(StructuralError::RootNotVessel(nodes[root.index()].code().to_string()));
            }
        }

        tracing::debug!(
            "Built GMOD {}: {} nodes, {} relations, root '{}'",
            version,
            nodes.len(),
            relations.edge_count(),
            nodes[root.index()].code()
        );

        Ok(Gmod {
            version,
            nodes,
            index,
            relations,
            root,
            locations: Locations::default(),
            traversal: config.traversal,
        })
    }

    /// Replace the location rule set used when validating path locations.
    pub fn with_locations(mut self, locations: Locations) -> Self {
        self.locations = locations;
        self
    }

    /// Replace the recurrence policy used by traversal and path validation.
    pub fn with_traversal_options(mut self, options: TraversalOptions) -> Self {
        self.traversal = options;
        self
    }

    pub fn version(&self) -> &VisVersion {
        &self.version
    }

    pub fn locations(&self) -> &Locations {
        &self.locations
    }

    pub fn traversal_options(&self) -> TraversalOptions {
        self.traversal
    }

    pub fn root(&self) -> &GmodNode {
        &self.nodes[self.root.index()]
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total number of distinct parent/child relations.
    pub fn relation_count(&self) -> usize {
        self.relations.edge_count()
    }

    /// Iterate over all nodes in dataset order.
    pub fn iter(&self) -> impl Iterator<Item = &GmodNode> {
        self.nodes.iter()
    }

    /// Resolve a code.
    pub fn get(&self, code: &str) -> Option<&GmodNode> {
        self.index.get(code).map(|&id| &self.nodes[id.index()])
    }

    /// Node by arena id. `id` must come from this graph.
    pub fn node(&self, id: NodeId) -> &GmodNode {
        &self.nodes[id.index()]
    }

    /// Children of `code`, in dataset order. Empty for unknown codes.
    pub fn children<'a>(&'a self, code: &str) -> impl Iterator<Item = &'a GmodNode> + use<'a> {
        self.index
            .get(code)
            .into_iter()
            .flat_map(move |&id| self.neighbors(id, Direction::Outgoing))
    }

    /// Parents of `code`, in dataset order. Empty for unknown codes.
    pub fn parents<'a>(&'a self, code: &str) -> impl Iterator<Item = &'a GmodNode> + use<'a> {
        self.index
            .get(code)
            .into_iter()
            .flat_map(move |&id| self.neighbors(id, Direction::Incoming))
    }

    /// Whether `child_code` is a direct child of `parent_code`.
    pub fn is_child(&self, parent_code: &str, child_code: &str) -> bool {
        match (self.get(parent_code), self.get(child_code)) {
            (Some(parent), Some(child)) => self.is_child_node(parent, child),
            _ => false,
        }
    }

    pub fn children_of<'a>(&'a self, node: &GmodNode) -> impl Iterator<Item = &'a GmodNode> + use<'a> {
        self.neighbors(node.id(), Direction::Outgoing)
    }

    pub fn parents_of<'a>(&'a self, node: &GmodNode) -> impl Iterator<Item = &'a GmodNode> + use<'a> {
        self.neighbors(node.id(), Direction::Incoming)
    }

    pub fn child_count(&self, node: &GmodNode) -> usize {
        self.neighbors(node.id(), Direction::Outgoing).count()
    }

    pub fn is_child_node(&self, parent: &GmodNode, child: &GmodNode) -> bool {
        self.relations
            .find_edge(ix(parent.id()), ix(child.id()))
            .is_some()
    }

    fn neighbors(&self, id: NodeId, direction: Direction) -> impl Iterator<Item = &GmodNode> {
        self.relations
            .neighbors_directed(ix(id), direction)
            .map(move |idx| &self.nodes[idx.index()])
    }

    // ── Derived classification ──────────────────────────────

    fn single_child(&self, node: &GmodNode) -> Option<&GmodNode> {
        if !node.category().contains(CATEGORY_FUNCTION) {
            return None;
        }
        let mut children = self.children_of(node);
        match (children.next(), children.next()) {
            (Some(child), None) => Some(child),
            _ => None,
        }
    }

    /// The product type a function node is realised by, if it has exactly one child of that kind.
    pub fn product_type(&self, node: &GmodNode) -> Option<&GmodNode> {
        self.single_child(node)
            .filter(|child| child.category() == CATEGORY_PRODUCT && child.node_type() == TYPE_TYPE)
    }

    /// The product selection a function node is realised by, if it has exactly one child of that kind.
    pub fn product_selection(&self, node: &GmodNode) -> Option<&GmodNode> {
        self.single_child(node).filter(|child| {
            child.category().contains(CATEGORY_PRODUCT) && child.node_type() == TYPE_SELECTION
        })
    }

    /// Whether paths ending at `node` can be mapped to data channels.
    pub fn is_mappable(&self, node: &GmodNode) -> bool {
        if self.product_type(node).is_some() || self.product_selection(node).is_some() {
            return false;
        }
        if node.is_product_selection() || node.is_asset() {
            return false;
        }
        !matches!(node.code().chars().last(), Some('a') | Some('s'))
    }
}
