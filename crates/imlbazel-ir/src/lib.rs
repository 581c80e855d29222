//! Intermediate representation of an IDE project.
//!
//! This crate turns a [`ProjectModel`] into an [`IrProject`]: a cycle-free
//! graph of compilation units and libraries whose dependency edges carry a
//! [`Scope`] and an export flag. Every cycle of IDE modules becomes one unit.
//!
//! ## Usage
//!
//! ```
//! use imlbazel_ir::build;
//! use imlbazel_schemas::{Configuration, Diagnostics, ProjectModel};
//!
//! let model: ProjectModel = serde_json::from_str(r#"{
//!     "base_dir": "/ws",
//!     "modules": [{ "name": "app", "base_dir": "/ws/app", "module_file": "/ws/app/app.iml" }]
//! }"#).unwrap();
//! let diagnostics = Diagnostics::new();
//! let ir = build(&model, &Configuration::default(), &diagnostics).unwrap();
//! assert_eq!(ir.modules[0].name, "app");
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the schema types the IR refers to.

mod builder;
mod error;
mod ir;

#[doc(inline)]
pub use imlbazel_schemas::{ProjectModel, Scope};

#[doc(inline)]
pub use crate::builder::{ANONYMOUS_LIBRARY, build, normalize_library_name};
#[doc(inline)]
pub use crate::error::IrError;
#[doc(inline)]
pub use crate::ir::{
    Dependency, Exclude, IrLibrary, IrModule, IrNodeRef, IrProject, LibraryId, ModuleId,
};
