//! Schema definitions shared by every imlbazel phase.
//!
//! This crate contains the data structures that cross phase boundaries:
//! - [`ProjectModel`]: the module graph handed over by the IDE project loader
//! - [`RuleGraph`]: the placed, resolved rules handed to the BUILD emitter
//! - [`Configuration`]: project conventions (output areas, naming, suppression)
//! - [`Diagnostics`]: the run-wide warning/error tally
//!
//! The serialized types are designed to be:
//! - **Self-describing**: JSON Schema is generated from the Rust types
//! - **Deterministic**: ordered collections everywhere output is diffed
//! - **Shared**: used by the condense, IR, rules and viz crates alike

mod config;
mod diagnostics;
mod label;
mod project_model;
mod rule_graph;
mod scope;
#[cfg(test)]
mod testutil;

#[doc(inline)]
pub use config::*;
#[doc(inline)]
pub use diagnostics::*;
#[doc(inline)]
pub use label::*;
#[doc(inline)]
pub use project_model::*;
#[doc(inline)]
pub use rule_graph::*;
#[doc(inline)]
pub use scope::*;
