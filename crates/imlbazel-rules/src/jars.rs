//! Maps jar files onto build rules.
//!
//! Where a jar lives decides what provides it:
//! - generated output areas: an unmanaged rule named after the file
//! - binary output areas: an unmanaged rule named after the file, without
//!   a `lib` prefix
//! - anywhere else: an import rule in the nearest enclosing package
//!
//! Resolution is cached by workspace-relative path, so every reference to
//! one physical jar yields the same rule.

use std::collections::{HashMap, HashSet};

use camino::{Utf8Path, Utf8PathBuf};
use imlbazel_schemas::{Configuration, Diagnostics, Label, Rule, RuleKind};
use tracing::trace;

use crate::assemble::{Rules, unmanaged_rule};
use crate::error::RulesError;
use crate::naming::with_project_id;
use crate::workspace::{Workspace, package_relative};

const SOURCES_JAR_SUFFIX: &str = "-sources.jar";

/// Resolves jar files to rule labels, creating the rules on first use.
pub struct JarResolver<'a> {
    workspace: &'a Workspace,
    config: &'a Configuration,
    project_id: &'a str,
    /// Absolute paths of the jars that exist on disk.
    existing: &'a HashSet<Utf8PathBuf>,
    /// Workspace-relative jar path -> providing rule.
    cache: HashMap<Utf8PathBuf, Label>,
}

impl<'a> JarResolver<'a> {
    pub fn new(
        workspace: &'a Workspace,
        config: &'a Configuration,
        project_id: &'a str,
        existing: &'a HashSet<Utf8PathBuf>,
    ) -> Self {
        Self {
            workspace,
            config,
            project_id,
            existing,
            cache: HashMap::new(),
        }
    }

    /// Returns the rule providing `file`, referenced from unit `module`.
    ///
    /// Returns `Ok(None)` when the file is skipped: source jars, ignored
    /// prefixes, and files that are missing or outside every package (the
    /// latter two are reported as warnings).
    pub fn resolve(
        &mut self,
        rules: &mut Rules,
        file: &Utf8Path,
        module: &str,
        diagnostics: &Diagnostics,
    ) -> Result<Option<Label>, RulesError> {
        if file.as_str().ends_with(SOURCES_JAR_SUFFIX) {
            return Ok(None);
        }
        let Some(relative) = self.workspace.relativize(file) else {
            diagnostics.warning(format_args!(
                "Module {module}: {file} is outside the workspace"
            ));
            return Ok(None);
        };
        if has_prefix(&relative, &self.config.ignored_jar_prefixes) {
            trace!(jar = %relative, "ignored jar");
            return Ok(None);
        }
        if let Some(label) = self.cache.get(&relative) {
            return Ok(Some(label.clone()));
        }

        let label = if let Some(rest) = strip_prefix(&relative, &self.config.generated_prefixes) {
            self.unmanaged(rules, &relative, rest, file_stem(rest), diagnostics)
        } else if let Some(rest) = strip_prefix(&relative, &self.config.binary_prefixes) {
            let stem = file_stem(rest);
            let name = stem.strip_prefix("lib").unwrap_or(stem);
            self.unmanaged(rules, &relative, rest, name, diagnostics)
        } else {
            if !self.existing.contains(file) {
                diagnostics.warning(format_args!(
                    "Module {module}: file {relative} does not exist"
                ));
                return Ok(None);
            }
            self.import(rules, file, &relative, diagnostics)?
        };

        if let Some(label) = &label {
            self.cache.insert(relative, label.clone());
        }
        Ok(label)
    }

    /// An externally built rule in the package mirroring `rest`.
    fn unmanaged(
        &self,
        rules: &mut Rules,
        relative: &Utf8Path,
        rest: &Utf8Path,
        name: &str,
        diagnostics: &Diagnostics,
    ) -> Option<Label> {
        let Some(package) = self.workspace.find_package(rest) else {
            diagnostics.warning(format_args!("Cannot find package for {relative}"));
            return None;
        };
        let label = Label::new(package, name);
        unmanaged_rule(rules, &label, relative.as_str(), diagnostics).then_some(label)
    }

    /// A prebuilt jar in the source tree.
    fn import(
        &self,
        rules: &mut Rules,
        file: &Utf8Path,
        relative: &Utf8Path,
        diagnostics: &Diagnostics,
    ) -> Result<Option<Label>, RulesError> {
        let Some(package) = self.workspace.find_package(relative) else {
            diagnostics.warning(format_args!("Cannot find package for {relative}"));
            return Ok(None);
        };
        let jar = package_relative(package, relative);

        let name = if has_prefix(relative, &self.config.maven_prefixes) {
            maven_target_name(file).unwrap_or_else(|| {
                diagnostics.warning(format_args!(
                    "'{relative}' is not a valid maven artifact file name"
                ));
                file_stem(relative).to_string()
            })
        } else {
            let target = jar.strip_suffix(".jar").unwrap_or(&jar);
            match target.rsplit_once('/') {
                Some((dir, base)) => format!("{dir}/{}", with_project_id(self.project_id, base)),
                None => with_project_id(self.project_id, target),
            }
        };

        let label = Label::new(package, &name);
        match rules.get(&label) {
            Some(existing) if existing.jars != [jar.as_str()] => {
                return Err(RulesError::conflicting_jar(&label, relative.as_str()));
            }
            Some(_) => {}
            None => {
                let mut rule = Rule::new(name, RuleKind::Import);
                rule.jars.push(jar);
                rules.insert(label.clone(), rule);
            }
        }
        Ok(Some(label))
    }
}

/// Computes the import target name of a jar inside a Maven repository.
///
/// The name is the file extension, preceded by the classifier if there is
/// one: `junit-4.12.jar` is `jar`, `guice-4.2.1-no_aop.jar` is
/// `no_aop.jar`. The version is taken from the parent directory name.
/// Returns `None` if the file does not follow the Maven layout.
pub fn maven_target_name(file: &Utf8Path) -> Option<String> {
    let file_name = file.file_name()?;
    let version = file.parent()?.file_name()?;
    let version_at = file_name.rfind(version).filter(|&index| index > 0)?;
    let extension_at = file_name.rfind('.').filter(|&index| index > 0)?;
    let extension = &file_name[extension_at + 1..];

    let classifier_at = version_at + version.len();
    match file_name.as_bytes().get(classifier_at)? {
        b'-' => {
            let classifier = file_name.get(classifier_at + 1..extension_at)?;
            Some(format!("{classifier}.{extension}"))
        }
        _ => Some(extension.to_string()),
    }
}

fn has_prefix(path: &Utf8Path, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| path.starts_with(prefix))
}

fn strip_prefix<'p>(path: &'p Utf8Path, prefixes: &[String]) -> Option<&'p Utf8Path> {
    prefixes
        .iter()
        .find_map(|prefix| path.strip_prefix(prefix).ok())
}

fn file_stem(path: &Utf8Path) -> &str {
    path.file_stem().unwrap_or_else(|| path.as_str())
}
