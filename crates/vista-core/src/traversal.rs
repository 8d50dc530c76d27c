//! Depth-first traversal with an occurrence-tracked ancestor stack
//!
//! The graph is a DAG with shared subtrees, so a plain visited set would hide
//! legitimate second routes to a node. Instead the walker tracks how often each
//! code occurs on the *active* ancestor chain and refuses edges that would push
//! a code past the configured limit. A node listed as its own descendant is
//! therefore never followed, and every distinct chain is reported exactly once.

use std::collections::HashMap;

use crate::config::TraversalOptions;
use crate::graph::Gmod;
use crate::node::GmodNode;
use crate::path::GmodPath;

/// Decision returned by a traversal handler for the node it was shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalHandlerResult {
    /// Descend into the node's children.
    Continue,
    /// Do not descend; continue with siblings.
    SkipSubtree,
    /// Abort the whole traversal.
    Stop,
}

/// The active ancestor chain plus an occurrence count per code.
#[derive(Debug, Default)]
pub struct Parents<'g> {
    chain: Vec<&'g GmodNode>,
    occurrences: HashMap<&'g str, usize>,
}

impl<'g> Parents<'g> {
    fn with_prefix(prefix: &[&'g GmodNode]) -> Self {
        let mut parents = Parents {
            chain: Vec::with_capacity(prefix.len() + 16),
            occurrences: HashMap::new(),
        };
        for &node in prefix {
            parents.push(node);
        }
        parents
    }

    fn push(&mut self, node: &'g GmodNode) {
        self.chain.push(node);
        *self.occurrences.entry(node.code()).or_insert(0) += 1;
    }

    fn pop(&mut self) {
        let Some(node) = self.chain.pop() else {
            return;
        };
        if let Some(count) = self.occurrences.get_mut(node.code()) {
            *count -= 1;
            if *count == 0 {
                self.occurrences.remove(node.code());
            }
        }
    }

    /// How many times `code` occurs on the chain.
    pub fn occurrences(&self, code: &str) -> usize {
        self.occurrences.get(code).copied().unwrap_or(0)
    }

    pub fn as_slice(&self) -> &[&'g GmodNode] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

struct Walker<'g, F> {
    gmod: &'g Gmod,
    parents: Parents<'g>,
    limit: usize,
    handler: F,
}

impl<'g, F> Walker<'g, F>
where
    F: FnMut(&[&'g GmodNode], &'g GmodNode) -> TraversalHandlerResult,
{
    fn visit(&mut self, node: &'g GmodNode) -> TraversalHandlerResult {
        if node.metadata().install_substructure == Some(false) {
            return TraversalHandlerResult::Continue;
        }

        let result = (self.handler)(self.parents.as_slice(), node);
        if result != TraversalHandlerResult::Continue {
            return result;
        }

        let gmod = self.gmod;
        self.parents.push(node);
        for child in gmod.children_of(node) {
            if !self.may_enter(node, child) {
                tracing::trace!("Skipping recurrent edge {} -> {}", node.code(), child.code());
                continue;
            }
            if self.visit(child) == TraversalHandlerResult::Stop {
                self.parents.pop();
                return TraversalHandlerResult::Stop;
            }
        }
        self.parents.pop();

        TraversalHandlerResult::Continue
    }

    fn may_enter(&self, parent: &GmodNode, child: &GmodNode) -> bool {
        may_recur(parent, child, self.parents.occurrences(child.code()), self.limit)
    }
}

/// Whether `child` may be entered from `parent` when its code already occurs
/// `seen` times on the chain.
///
/// A product-selection assignment may exceed `limit` by one occurrence, never
/// more, and never through an edge from a node to itself.
pub(crate) fn may_recur(parent: &GmodNode, child: &GmodNode, seen: usize, limit: usize) -> bool {
    if seen < limit {
        return true;
    }
    seen == limit && parent.code() != child.code() && GmodNode::is_product_selection_assignment(parent, child)
}

fn walk<'g, F>(
    gmod: &'g Gmod,
    prefix: &[&'g GmodNode],
    start: &'g GmodNode,
    options: TraversalOptions,
    handler: F,
) -> bool
where
    F: FnMut(&[&'g GmodNode], &'g GmodNode) -> TraversalHandlerResult,
{
    let mut walker = Walker {
        gmod,
        parents: Parents::with_prefix(prefix),
        limit: options.max_traversal_occurrence.max(1),
        handler,
    };
    let completed = walker.visit(start) != TraversalHandlerResult::Stop;
    tracing::trace!(
        "Traversal from '{}' {}",
        start.code(),
        if completed { "completed" } else { "stopped" }
    );
    completed
}

impl Gmod {
    /// Walk every reachable chain from the root.
    ///
    /// The handler sees the ancestor chain (root first, not including the
    /// current node) and the current node. Returns `false` if the handler
    /// stopped the traversal.
    pub fn traverse<'g, F>(&'g self, handler: F) -> bool
    where
        F: FnMut(&[&'g GmodNode], &'g GmodNode) -> TraversalHandlerResult,
    {
        walk(self, &[], self.root(), self.traversal_options(), handler)
    }

    /// Walk from `start`, which is reported with an empty ancestor chain.
    pub fn traverse_from<'g, F>(&'g self, start: &'g GmodNode, handler: F) -> bool
    where
        F: FnMut(&[&'g GmodNode], &'g GmodNode) -> TraversalHandlerResult,
    {
        walk(self, &[], start, self.traversal_options(), handler)
    }

    /// Walk from the root with an explicit recurrence policy.
    pub fn traverse_with_options<'g, F>(&'g self, options: TraversalOptions, handler: F) -> bool
    where
        F: FnMut(&[&'g GmodNode], &'g GmodNode) -> TraversalHandlerResult,
    {
        walk(self, &[], self.root(), options, handler)
    }

    /// Walk from the root, threading caller state through the handler.
    pub fn traverse_with_state<'g, S, F>(&'g self, state: &mut S, mut handler: F) -> bool
    where
        F: FnMut(&mut S, &[&'g GmodNode], &'g GmodNode) -> TraversalHandlerResult,
    {
        walk(
            self,
            &[],
            self.root(),
            self.traversal_options(),
            |parents, node| handler(state, parents, node),
        )
    }

    /// Full path to every node for which `predicate` returns `true`.
    pub fn find_paths<'g, P>(&'g self, mut predicate: P) -> Vec<GmodPath<'g>>
    where
        P: FnMut(&[&'g GmodNode], &'g GmodNode) -> bool,
    {
        let mut found = Vec::new();
        self.traverse(|parents, node| {
            if predicate(parents, node) {
                found.push(GmodPath::from_chain(self, parents, node));
            }
            TraversalHandlerResult::Continue
        });
        found
    }

    /// Whether `to` is reachable as a descendant continuing `from_path`.
    ///
    /// The search starts at the last asset function node of `from_path` (or the
    /// root) and looks for a chain whose prefix is `from_path`. On success the
    /// nodes between the end of `from_path` and `to` are returned.
    pub fn path_exists_between<'g>(
        &'g self,
        from_path: &[&'g GmodNode],
        to: &'g GmodNode,
    ) -> Option<Vec<&'g GmodNode>> {
        let start_at = from_path
            .iter()
            .rposition(|n| n.is_asset_function_node())
            .unwrap_or(0);
        let (prefix, start) = match from_path.get(start_at) {
            Some(&start) => (&from_path[..start_at], start),
            None => (&from_path[..0], self.root()),
        };

        let mut remaining = None;
        walk(self, prefix, start, self.traversal_options(), |parents, node| {
            if node.code() != to.code() || parents.len() < from_path.len() {
                return TraversalHandlerResult::Continue;
            }
            let matches = from_path
                .iter()
                .zip(parents)
                .all(|(expected, actual)| expected.code() == actual.code());
            if !matches {
                return TraversalHandlerResult::Continue;
            }
            remaining = Some(parents[from_path.len()..].to_vec());
            TraversalHandlerResult::Stop
        });
        remaining
    }
}
