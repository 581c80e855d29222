//! Registry of the buildable packages of a workspace.
//!
//! A package is a directory holding a `BUILD` or `BUILD.bazel` file. Every
//! rule is placed into the nearest enclosing package of the directory or
//! file it describes.

use std::collections::BTreeSet;

use camino::{Utf8Path, Utf8PathBuf};
use path_clean::PathClean;
use tracing::{debug, debug_span};
use walkdir::{DirEntry, WalkDir};

use crate::error::RulesError;

/// File names that turn a directory into a package.
const BUILD_FILES: &[&str] = &["BUILD", "BUILD.bazel"];

/// The workspace root and its registered packages.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: Utf8PathBuf,
    /// Workspace-relative package paths; `""` is the root package.
    packages: BTreeSet<String>,
}

impl Workspace {
    /// Walks `root` and registers every directory holding a BUILD file.
    ///
    /// Hidden directories and `bazel-*` output trees are skipped.
    pub fn discover(root: &Utf8Path) -> Result<Self, RulesError> {
        let _span = debug_span!("discover_packages", %root).entered();
        let root = clean(root);

        let mut packages = BTreeSet::new();
        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry));
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file()
                || !BUILD_FILES.iter().any(|name| entry.file_name() == *name)
            {
                continue;
            }
            let Some(dir) = entry.path().parent().and_then(Utf8Path::from_path) else {
                debug!(path = %entry.path().display(), "skipping non UTF-8 path");
                continue;
            };
            if let Ok(package) = dir.strip_prefix(&root) {
                packages.insert(package.as_str().to_string());
            }
        }

        debug!(packages = packages.len(), "discovered packages");
        Ok(Self { root, packages })
    }

    /// Creates a workspace with a known set of packages.
    pub fn with_packages<I, S>(root: &Utf8Path, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            root: clean(root),
            packages: packages.into_iter().map(Into::into).collect(),
        }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Registered packages in path order.
    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.packages.iter().map(String::as_str)
    }

    /// Makes an absolute path workspace-relative, normalizing `.` and `..`.
    ///
    /// Returns `None` if the path is outside the workspace.
    pub fn relativize(&self, path: &Utf8Path) -> Option<Utf8PathBuf> {
        clean(path)
            .strip_prefix(&self.root)
            .ok()
            .map(Utf8Path::to_path_buf)
    }

    /// Finds the nearest package enclosing a workspace-relative path. The
    /// path itself counts if it is a package.
    pub fn find_package(&self, relative: &Utf8Path) -> Option<&str> {
        let mut candidate = relative;
        loop {
            if let Some(package) = self.packages.get(candidate.as_str()) {
                return Some(package.as_str());
            }
            candidate = candidate.parent()?;
        }
    }
}

/// Expresses a workspace-relative path relative to a package directory.
///
/// Paths outside the package climb out with `..` segments.
pub fn package_relative(package: &str, path: &Utf8Path) -> String {
    let package = Utf8Path::new(package);
    if let Ok(rest) = path.strip_prefix(package) {
        return rest.as_str().to_string();
    }
    let shared = package
        .components()
        .zip(path.components())
        .take_while(|(a, b)| a == b)
        .count();
    let mut relative = Utf8PathBuf::new();
    for _ in shared..package.components().count() {
        relative.push("..");
    }
    for component in path.components().skip(shared) {
        relative.push(component);
    }
    relative.into_string()
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    entry.file_type().is_dir() && (name.starts_with('.') || name.starts_with("bazel-"))
}

fn clean(path: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path.as_std_path().clean())
        .unwrap_or_else(|_| path.to_path_buf())
}
