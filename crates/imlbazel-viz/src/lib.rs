//! Graphviz rendering of the unit graph.
//!
//! One node per compilation unit, one edge per unit-to-unit dependency.
//! Edge colors follow the dependency scope:
//!
//! | Scope        | Color        |
//! |--------------|--------------|
//! | compile      | `black`      |
//! | test         | `green`      |
//! | runtime      | `blue`       |
//! | test runtime | `green:blue` |
//! | provided     | `red`        |
//!
//! Exported edges are bold. Test friend edges are dotted.
//!
//! ## Usage
//!
//! ```
//! use imlbazel_schemas::{Configuration, Diagnostics, ProjectModel};
//!
//! let model: ProjectModel = serde_json::from_str(r#"{
//!     "base_dir": "/ws",
//!     "modules": [
//!         { "name": "a", "base_dir": "/ws/a", "module_file": "/ws/a/a.iml",
//!           "dependencies": [{ "kind": "module", "name": "b", "test": true }] },
//!         { "name": "b", "base_dir": "/ws/b", "module_file": "/ws/b/b.iml" }
//!     ]
//! }"#).unwrap();
//! let ir = imlbazel_ir::build(&model, &Configuration::default(), &Diagnostics::new()).unwrap();
//!
//! let dot = imlbazel_viz::render_dot(&ir, "project");
//! assert!(dot.contains(r#""a" -> "b" [color="green" style="solid"]"#));
//! ```

mod error;

use std::fmt::Write as _;
use std::fs;

use camino::Utf8Path;
use imlbazel_ir::{IrNodeRef, IrProject};
use imlbazel_schemas::Scope;
use itertools::Itertools;
use tracing::debug;

#[doc(inline)]
pub use crate::error::VizError;

/// Renders the unit graph of `ir` as a DOT digraph called `name`.
///
/// Edges are sorted, so the output only changes when the graph does.
pub fn render_dot(ir: &IrProject, name: &str) -> String {
    let mut edges = Vec::new();
    for (_, unit) in ir.modules() {
        for dependency in &unit.dependencies {
            let IrNodeRef::Module(target) = dependency.target else {
                continue;
            };
            let style = if dependency.exported { "bold" } else { "solid" };
            edges.push(edge(
                &unit.name,
                &ir.module(target).name,
                color(dependency.scope),
                style,
            ));
        }
        for friend in &unit.test_friends {
            edges.push(edge(&unit.name, &ir.module(*friend).name, "gray", "dotted"));
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "digraph {} {{", quote(name));
    for line in edges.into_iter().sorted().dedup() {
        let _ = writeln!(out, "  {line}");
    }
    out.push_str("}\n");
    out
}

/// Writes a rendered graph to `path`.
pub fn write_dot(path: &Utf8Path, dot: &str) -> Result<(), VizError> {
    fs::write(path, dot).map_err(|err| VizError::write(path, err))?;
    debug!(%path, "wrote dependency graph");
    Ok(())
}

fn edge(from: &str, to: &str, color: &str, style: &str) -> String {
    format!(
        "{} -> {} [color=\"{color}\" style=\"{style}\"]",
        quote(from),
        quote(to)
    )
}

fn color(scope: Scope) -> &'static str {
    match scope {
        Scope::Compile => "black",
        Scope::Test => "green",
        Scope::Runtime => "blue",
        Scope::TestRuntime => "green:blue",
        Scope::Provided => "red",
    }
}

fn quote(id: &str) -> String {
    format!("\"{}\"", id.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use imlbazel_schemas::{Configuration, Diagnostics, ProjectModel};

    use super::*;

    fn ir(json: &str) -> IrProject {
        let model: ProjectModel = serde_json::from_str(json).unwrap();
        imlbazel_ir::build(&model, &Configuration::default(), &Diagnostics::new()).unwrap()
    }

    #[test]
    fn test_scope_colors_and_styles() {
        let ir = ir(r#"{
            "base_dir": "/ws",
            "modules": [
                { "name": "app", "base_dir": "/ws/app", "module_file": "/ws/app/app.iml",
                  "dependencies": [
                      { "kind": "module", "name": "core", "exported": true },
                      { "kind": "module", "name": "rt", "runtime": true, "test": true },
                      { "kind": "module", "name": "api", "provided": true },
                      { "kind": "library", "level": "module", "files": ["/ws/x.jar"] }
                  ] },
                { "name": "app.tests", "base_dir": "/ws/app/tests",
                  "module_file": "/ws/app/tests/app.tests.iml", "production_module": "app" },
                { "name": "core", "base_dir": "/ws/core", "module_file": "/ws/core/core.iml" },
                { "name": "rt", "base_dir": "/ws/rt", "module_file": "/ws/rt/rt.iml" },
                { "name": "api", "base_dir": "/ws/api", "module_file": "/ws/api/api.iml" }
            ]
        }"#);

        let dot = render_dot(&ir, "studio");
        assert_eq!(
            dot,
            "digraph \"studio\" {\n\
             \x20 \"app\" -> \"api\" [color=\"red\" style=\"solid\"]\n\
             \x20 \"app\" -> \"core\" [color=\"black\" style=\"bold\"]\n\
             \x20 \"app\" -> \"rt\" [color=\"green:blue\" style=\"solid\"]\n\
             \x20 \"app.tests\" -> \"app\" [color=\"gray\" style=\"dotted\"]\n\
             }\n"
        );
    }

    #[test]
    fn test_quotes_names() {
        assert_eq!(quote(r#"a"b"#), r#""a\"b""#);
    }

    #[test]
    fn test_write_dot() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap().join("graph.dot");
        write_dot(&path, "digraph \"x\" {\n}\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "digraph \"x\" {\n}\n");

        let missing = Utf8Path::from_path(dir.path()).unwrap().join("no/such/graph.dot");
        assert!(write_dot(&missing, "").unwrap_err().is_io());
    }
}
