//! Raw module dependency graph.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

/// Directed graph of IDE modules where an edge `a -> b` means "a depends
/// on b".
///
/// Modules are stored in an arena: the node index of a module is its
/// insertion position, which callers use as a stable module id. Parallel
/// edges are kept because the number of dependency edges decides how a
/// collapsed cycle is named.
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module, returning its id. Adding a name twice returns the
    /// existing id.
    pub fn add_module(&mut self, name: &str) -> usize {
        if let Some(&node) = self.index.get(name) {
            return node.index();
        }
        let node = self.graph.add_node(name.to_string());
        self.index.insert(name.to_string(), node);
        node.index()
    }

    /// Records that module `from` depends on module `to`.
    pub fn add_dependency(&mut self, from: usize, to: usize) {
        self.graph
            .add_edge(NodeIndex::new(from), NodeIndex::new(to), ());
    }

    /// Looks up a module id by name.
    pub fn module(&self, name: &str) -> Option<usize> {
        self.index.get(name).map(|node| node.index())
    }

    /// Returns the name of a module.
    pub fn name(&self, module: usize) -> &str {
        &self.graph[NodeIndex::new(module)]
    }

    pub fn module_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of outgoing dependency edges of a module, parallel edges
    /// included.
    pub fn dependency_count(&self, module: usize) -> usize {
        self.graph
            .edges_directed(NodeIndex::new(module), Direction::Outgoing)
            .count()
    }

    /// Returns the ids of the modules `module` depends on, in insertion
    /// order, including duplicates.
    pub fn dependencies(&self, module: usize) -> Vec<usize> {
        // petgraph walks adjacency lists newest-first.
        let mut deps: Vec<usize> = self
            .graph
            .neighbors_directed(NodeIndex::new(module), Direction::Outgoing)
            .map(NodeIndex::index)
            .collect();
        deps.reverse();
        deps
    }

    pub(crate) fn graph(&self) -> &DiGraph<String, ()> {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_module_is_idempotent() {
        let mut graph = ModuleGraph::new();
        let a = graph.add_module("a");
        let b = graph.add_module("b");
        assert_eq!(graph.add_module("a"), a);
        assert_ne!(a, b);
        assert_eq!(graph.module_count(), 2);
        assert_eq!(graph.module("b"), Some(b));
        assert_eq!(graph.name(b), "b");
        assert!(graph.module("c").is_none());
    }

    #[test]
    fn parallel_edges_are_counted() {
        let mut graph = ModuleGraph::new();
        let a = graph.add_module("a");
        let b = graph.add_module("b");
        let c = graph.add_module("c");
        graph.add_dependency(a, b);
        graph.add_dependency(a, b);
        graph.add_dependency(a, c);
        assert_eq!(graph.dependency_count(a), 3);
        assert_eq!(graph.dependency_count(b), 0);
        assert_eq!(graph.dependencies(a), vec![b, b, c]);
    }
}
