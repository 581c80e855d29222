//! Cycle collapsing: SCC decomposition of the module graph.
//!
//! The target build system forbids dependency cycles, but IDE projects
//! routinely contain them. Instead of failing, every strongly connected
//! component is treated as one opaque compilation unit:
//! 1. Run Tarjan's algorithm over the raw module graph
//! 2. Name each component after its "heaviest" member
//! 3. Project the raw edges onto components, dropping self-loops
//!
//! Components come out in Tarjan's emission order, which is reverse
//! topological: a component is emitted after everything it depends on.

use std::collections::{BTreeSet, HashSet};

use itertools::Itertools;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::{debug, debug_span};

use crate::graph::ModuleGraph;

/// Suffix appended to the name of a component with more than one member.
pub const MERGED_SUFFIX: &str = "_and_others";

/// A strongly connected component of the module graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Unique name of the merged unit.
    pub name: String,
    /// Module ids of the members, sorted by module name.
    pub members: Vec<usize>,
}

impl Component {
    /// Returns true if this component is a genuine dependency cycle.
    pub fn is_cycle(&self) -> bool {
        self.members.len() > 1
    }
}

/// Partition of a module graph into components.
#[derive(Debug, Clone)]
pub struct Condensation {
    /// Components, dependencies before dependents.
    components: Vec<Component>,
    /// Owning component of each module, indexed by module id.
    component_of: Vec<usize>,
    /// Deduplicated edges between distinct components.
    edges: BTreeSet<(usize, usize)>,
}

impl Condensation {
    /// Components in emission order (dependencies first).
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Returns the component owning `module`.
    pub fn component_of(&self, module: usize) -> usize {
        self.component_of[module]
    }

    /// Components that `component` depends on, in id order.
    pub fn dependencies(&self, component: usize) -> impl Iterator<Item = usize> + '_ {
        self.edges
            .range((component, 0)..=(component, usize::MAX))
            .map(|&(_, to)| to)
    }

    /// Builds the component graph: one node per component (weighted by its
    /// name, node index == component id), one edge per dependency.
    pub fn to_graph(&self) -> DiGraph<String, ()> {
        let mut graph = DiGraph::with_capacity(self.components.len(), self.edges.len());
        for component in &self.components {
            graph.add_node(component.name.clone());
        }
        for &(from, to) in &self.edges {
            graph.add_edge(NodeIndex::new(from), NodeIndex::new(to), ());
        }
        graph
    }
}

/// Collapses every strongly connected component of `modules` into a single
/// unit.
///
/// A component's name is the name of the member with the most dependency
/// edges (ties go to the lexicographically smallest name); components with
/// more than one member get [`MERGED_SUFFIX`] appended. If that name is
/// already taken, `_2`, `_3`, ... is appended until it is unique.
///
/// Edges are projected onto components. Edges that start and end inside the
/// same component are dropped, so the result never contains a self-loop.
pub fn collapse(modules: &ModuleGraph) -> Condensation {
    let _span = debug_span!("collapse", modules = modules.module_count()).entered();
    let graph = modules.graph();

    let sccs = tarjan_scc(graph);

    // Singletons keep the module's own name, so reserve all of them first.
    let mut used: HashSet<String> = sccs
        .iter()
        .filter(|scc| scc.len() == 1)
        .map(|scc| graph[scc[0]].clone())
        .collect();

    let mut components = Vec::with_capacity(sccs.len());
    let mut component_of = vec![0; modules.module_count()];
    for (id, scc) in sccs.iter().enumerate() {
        let mut members: Vec<usize> = scc.iter().map(|node| node.index()).collect();
        members.sort_by(|&a, &b| modules.name(a).cmp(modules.name(b)));
        for &member in &members {
            component_of[member] = id;
        }

        let name = if members.len() == 1 {
            modules.name(members[0]).to_string()
        } else {
            let representative = members
                .iter()
                .copied()
                .max_by(|&a, &b| {
                    modules
                        .dependency_count(a)
                        .cmp(&modules.dependency_count(b))
                        // Reverse name order so the smallest name wins ties.
                        .then_with(|| modules.name(b).cmp(modules.name(a)))
                })
                .unwrap_or(members[0]);
            let base = format!("{}{MERGED_SUFFIX}", modules.name(representative));
            let name = unique_name(&base, &used);
            debug!(
                component = %name,
                members = %members.iter().map(|&m| modules.name(m)).join(", "),
                "collapsed dependency cycle"
            );
            name
        };
        used.insert(name.clone());
        components.push(Component { name, members });
    }

    let edges: BTreeSet<(usize, usize)> = graph
        .edge_references()
        .map(|edge| {
            (
                component_of[edge.source().index()],
                component_of[edge.target().index()],
            )
        })
        .filter(|(from, to)| from != to)
        .collect();

    debug!(
        components = components.len(),
        edges = edges.len(),
        "collapsed module graph"
    );

    Condensation {
        components,
        component_of,
        edges,
    }
}

fn unique_name(base: &str, used: &HashSet<String>) -> String {
    let mut candidate = base.to_string();
    let mut counter = 2;
    while used.contains(&candidate) {
        candidate = format!("{base}_{counter}");
        counter += 1;
    }
    candidate
}
