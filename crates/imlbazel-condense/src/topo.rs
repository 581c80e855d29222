//! Topological ordering with cycle reporting.
//!
//! The order puts dependencies before dependents so that a single pass over
//! it sees every dependency before the modules that use it. Cycles are not
//! thrown: each one is recorded in [`Diagnostics`] at the caller's severity,
//! and the members of a cycle are emitted next to each other so the order is
//! still total. The caller looks at the tally to decide whether to abort.

use std::fmt;

use imlbazel_schemas::{Diagnostics, Severity};
use itertools::Itertools;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug_span;

use crate::graph::ModuleGraph;

/// Orders the nodes of `graph` dependencies-first.
///
/// Every strongly connected component with more than one node is recorded
/// as a cycle at `severity`. Use [`Severity::Warning`] for diagnostics over
/// a raw project graph and [`Severity::Error`] for graphs that are supposed
/// to be acyclic already.
pub fn topological_order<N: fmt::Display, E>(
    graph: &DiGraph<N, E>,
    severity: Severity,
    diagnostics: &Diagnostics,
) -> Vec<NodeIndex> {
    let _span = debug_span!("topological_order", nodes = graph.node_count()).entered();

    let mut order = Vec::with_capacity(graph.node_count());
    for mut scc in tarjan_scc(graph) {
        if scc.len() > 1 {
            let mut names: Vec<String> =
                scc.iter().map(|&node| graph[node].to_string()).collect();
            names.sort_unstable();
            diagnostics.record(
                severity,
                format!(
                    "Dependency cycle between {} modules: {}",
                    names.len(),
                    names.iter().join(", ")
                ),
            );
            scc.sort_unstable();
        }
        order.extend(scc);
    }
    order
}

/// Reports every dependency cycle of the raw module graph as a warning.
///
/// Returns the number of cycles found. The graph is left untouched; cycles
/// are broken by [`crate::collapse`].
pub fn report_cycles(modules: &ModuleGraph, diagnostics: &Diagnostics) -> usize {
    let before = diagnostics.warning_count();
    topological_order(modules.graph(), Severity::Warning, diagnostics);
    diagnostics.warning_count() - before
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(nodes: &[&str], edges: &[(usize, usize)]) -> DiGraph<String, ()> {
        let mut graph = DiGraph::new();
        for node in nodes {
            graph.add_node((*node).to_string());
        }
        for &(from, to) in edges {
            graph.add_edge(NodeIndex::new(from), NodeIndex::new(to), ());
        }
        graph
    }

    #[test]
    fn test_dependencies_come_first() {
        // app -> lib -> base, app -> base
        let g = graph(&["app", "lib", "base"], &[(0, 1), (1, 2), (0, 2)]);
        let diagnostics = Diagnostics::new();
        let order = topological_order(&g, Severity::Error, &diagnostics);

        let position = |n: usize| order.iter().position(|&x| x.index() == n).unwrap();
        assert!(position(2) < position(1));
        assert!(position(1) < position(0));
        assert_eq!(diagnostics.error_count(), 0);
    }

    #[test]
    fn test_every_cycle_is_reported() {
        // Two independent cycles: a <-> b and c <-> d.
        let g = graph(&["a", "b", "c", "d"], &[(0, 1), (1, 0), (2, 3), (3, 2)]);
        let diagnostics = Diagnostics::new();
        let order = topological_order(&g, Severity::Error, &diagnostics);

        assert_eq!(order.len(), 4);
        assert_eq!(diagnostics.error_count(), 2);
        let messages = diagnostics.messages();
        assert!(messages[0].1.contains("a, b") || messages[0].1.contains("c, d"));
    }

    #[test]
    fn test_raw_cycles_are_warnings() {
        let mut modules = ModuleGraph::new();
        let a = modules.add_module("a");
        let b = modules.add_module("b");
        let c = modules.add_module("c");
        modules.add_dependency(a, b);
        modules.add_dependency(b, a);
        modules.add_dependency(c, a);

        let diagnostics = Diagnostics::new();
        assert_eq!(report_cycles(&modules, &diagnostics), 1);
        assert_eq!(diagnostics.warning_count(), 1);
        assert_eq!(diagnostics.error_count(), 0);
    }

    #[test]
    fn test_collapsed_graph_orders_without_errors() {
        let mut modules = ModuleGraph::new();
        let a = modules.add_module("a");
        let b = modules.add_module("b");
        let c = modules.add_module("c");
        modules.add_dependency(a, b);
        modules.add_dependency(b, a);
        modules.add_dependency(c, a);

        let condensation = crate::collapse(&modules);
        let diagnostics = Diagnostics::new();
        let order = topological_order(&condensation.to_graph(), Severity::Error, &diagnostics);

        assert_eq!(order.len(), 2);
        assert_eq!(diagnostics.error_count(), 0);
    }
}
