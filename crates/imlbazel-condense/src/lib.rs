//! Cycle collapsing and ordering of IDE module graphs.
//!
//! IDE projects allow modules to depend on each other in cycles; the target
//! build system does not. This crate turns the raw module graph into an
//! acyclic graph of compilation units and orders it so that every unit comes
//! after the units it depends on.
//!
//! ## Algorithm
//!
//! 1. Build a [`ModuleGraph`] with modules as nodes and dependencies as edges
//! 2. Report the raw cycles as warnings ([`report_cycles`])
//! 3. Collapse each strongly connected component into one unit ([`collapse`])
//! 4. Order the component graph dependencies-first ([`topological_order`])
//!
//! ## Usage
//!
//! ```
//! use imlbazel_condense::{ModuleGraph, collapse};
//!
//! let mut graph = ModuleGraph::new();
//! let a = graph.add_module("a");
//! let b = graph.add_module("b");
//! graph.add_dependency(a, b);
//! graph.add_dependency(b, a);
//!
//! let condensation = collapse(&graph);
//! assert_eq!(condensation.components()[0].name, "a_and_others");
//! ```

mod graph;
mod scc;
mod topo;

#[doc(inline)]
pub use crate::graph::ModuleGraph;
#[doc(inline)]
pub use crate::scc::{Component, Condensation, MERGED_SUFFIX, collapse};
#[doc(inline)]
pub use crate::topo::{report_cycles, topological_order};
