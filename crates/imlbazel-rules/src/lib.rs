//! Rule resolution for IDE projects.
//!
//! This crate maps an [`IrProject`] onto the packages of a workspace:
//! - [`Workspace`]: the registry of packages (directories with a BUILD file)
//! - [`JarResolver`]: turns jar files into import or unmanaged rules
//! - [`assemble`]: places units and libraries and resolves their edges
//! - [`generate`]: writes each package's rules when they changed
//!
//! [`run`] chains the whole pipeline, from project model to written files.
//!
//! ## Usage
//!
//! ```no_run
//! use imlbazel_rules::run;
//! use imlbazel_schemas::{Configuration, Diagnostics, ProjectModel};
//!
//! let model: ProjectModel = serde_json::from_str(
//!     &std::fs::read_to_string("project-model.json").unwrap(),
//! )
//! .unwrap();
//! let diagnostics = Diagnostics::new();
//! let outcome = run(&model, &Configuration::default(), true, &diagnostics).unwrap();
//! println!("{} package(s) out of date", outcome.updated_packages);
//! ```

mod assemble;
mod emit;
mod error;
mod jars;
mod naming;
mod workspace;

use std::collections::HashSet;

use camino::Utf8PathBuf;
use imlbazel_ir::IrProject;
use imlbazel_schemas::{Configuration, Diagnostics, ProjectModel, RuleGraph};
use rayon::prelude::*;
use tracing::{debug, info_span};

#[doc(inline)]
pub use crate::assemble::{AssembleContext, assemble};
#[doc(inline)]
pub use crate::emit::{CountingListener, GenerationListener, generate};
#[doc(inline)]
pub use crate::error::RulesError;
#[doc(inline)]
pub use crate::jars::{JarResolver, maven_target_name};
#[doc(inline)]
pub use crate::naming::{ConfiguredNaming, NamingPolicy, with_project_id};
#[doc(inline)]
pub use crate::workspace::{Workspace, package_relative};

/// Result of a full run.
#[derive(Debug)]
pub struct Outcome {
    pub ir: IrProject,
    pub graph: RuleGraph,
    /// Packages whose generated file changed (or would change, in a dry
    /// run).
    pub updated_packages: usize,
}

/// Runs the pipeline over `model` and updates the generated files.
///
/// Packages are discovered below the model's `base_dir`. With `dry_run`
/// nothing is written, but out-of-date packages are still counted.
///
/// # Errors
///
/// Returns [`RulesError`] for the fatal problems of IR construction
/// ([`RulesError::is_ir`]) and rule assembly, and for I/O failures.
/// Recoverable problems are recorded in `diagnostics`.
pub fn run(
    model: &ProjectModel,
    config: &Configuration,
    dry_run: bool,
    diagnostics: &Diagnostics,
) -> Result<Outcome, RulesError> {
    let _span = info_span!("run", base_dir = %model.base_dir, dry_run).entered();

    let workspace = Workspace::discover(&model.base_dir)?;
    let ir = imlbazel_ir::build(model, config, diagnostics)?;
    let existing = existing_files(&ir);

    let naming = ConfiguredNaming::new(config);
    let context = AssembleContext {
        workspace: &workspace,
        config,
        naming: &naming,
        existing: &existing,
        diagnostics,
    };
    let graph = assemble(&ir, &context)?;

    let mut listener = CountingListener::new(diagnostics, dry_run);
    generate(&graph, workspace.root(), &config.output_file, &mut listener)?;
    let updated_packages = listener.updated();
    diagnostics.info(format_args!("{updated_packages} package(s) updated"));

    Ok(Outcome {
        ir,
        graph,
        updated_packages,
    })
}

/// Checks which library files exist, in parallel.
fn existing_files(ir: &IrProject) -> HashSet<Utf8PathBuf> {
    let files: Vec<_> = ir.library_files().collect();
    let existing: HashSet<Utf8PathBuf> = files
        .par_iter()
        .filter(|file| file.is_file())
        .map(|file| file.to_path_buf())
        .collect();
    debug!(checked = files.len(), existing = existing.len(), "checked library files");
    existing
}
