//! Per-package emission of the rule graph.
//!
//! Each generated package gets one file holding its rules as pretty JSON.
//! A file is rewritten only when its content changed, so a second run over
//! the same project touches nothing.

use std::fs;
use std::io;

use camino::Utf8Path;
use imlbazel_schemas::{Diagnostics, Package, RuleGraph, RuleKind};
use tracing::{debug, debug_span};

use crate::error::RulesError;

/// Observes the packages whose generated file is out of date.
pub trait GenerationListener {
    /// Called for each out-of-date file (`<package>/<file>`). Returns true
    /// if the file should be written.
    fn package_updated(&mut self, path: &str) -> bool;

    /// Called when a package cannot be emitted.
    fn error(&mut self, message: &str);
}

/// Listener that counts updates and reports them through [`Diagnostics`].
///
/// In dry-run mode nothing is written, but the count still reflects what
/// would have changed.
pub struct CountingListener<'a> {
    diagnostics: &'a Diagnostics,
    dry_run: bool,
    updated: usize,
}

impl<'a> CountingListener<'a> {
    pub fn new(diagnostics: &'a Diagnostics, dry_run: bool) -> Self {
        Self {
            diagnostics,
            dry_run,
            updated: 0,
        }
    }

    pub fn updated(&self) -> usize {
        self.updated
    }
}

impl GenerationListener for CountingListener<'_> {
    fn package_updated(&mut self, path: &str) -> bool {
        self.updated += 1;
        if self.dry_run {
            self.diagnostics.info(format_args!("{path} out of date."));
            false
        } else {
            self.diagnostics.info(format_args!("Updated {path}"));
            true
        }
    }

    fn error(&mut self, message: &str) {
        self.diagnostics.error(message);
    }
}

/// Writes `output_file` into every generated package below `root`.
///
/// Suppressed and unmanaged rules are left out; packages made only of
/// those are skipped.
///
/// # Errors
///
/// Returns [`RulesError`] if serialization fails or a file cannot be
/// written. A file that exists but cannot be read is reported to the
/// listener and skipped.
pub fn generate(
    graph: &RuleGraph,
    root: &Utf8Path,
    output_file: &str,
    listener: &mut dyn GenerationListener,
) -> Result<(), RulesError> {
    let _span = debug_span!("generate", packages = graph.packages.len()).entered();

    for (name, package) in &graph.packages {
        if package.is_external() {
            continue;
        }
        let generated = Package {
            rules: package
                .rules
                .iter()
                .filter(|rule| !rule.suppressed && rule.kind != RuleKind::Unmanaged)
                .cloned()
                .collect(),
        };
        let mut content = serde_json::to_string_pretty(&generated)?;
        content.push('\n');

        let path = root.join(name).join(output_file);
        match fs::read_to_string(&path) {
            Ok(current) if current == content => {
                debug!(%path, "up to date");
                continue;
            }
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                listener.error(&format!("Cannot read {path}: {err}"));
                continue;
            }
        }

        let display = if name.is_empty() {
            output_file.to_string()
        } else {
            format!("{name}/{output_file}")
        };
        if listener.package_updated(&display) {
            fs::write(&path, content)?;
        }
    }
    Ok(())
}
