//! Intermediate representation types.
//!
//! The IR is an arena: modules and libraries live in vectors and refer to
//! each other through [`ModuleId`] and [`LibraryId`]. Modules are stored in
//! topological order (dependencies first), so a module's id is also its
//! position in that order.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use imlbazel_schemas::Scope;

/// Index of a module in [`IrProject::modules`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId(pub(crate) usize);

impl ModuleId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of a library in [`IrProject::libraries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LibraryId(pub(crate) usize);

impl LibraryId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The cycle-free, scope-annotated project graph.
#[derive(Debug, Clone, Default)]
pub struct IrProject {
    /// Workspace root.
    pub base_dir: Utf8PathBuf,
    /// Directory holding `.idea`, relative to `base_dir`.
    pub project_path: Utf8PathBuf,
    /// Project id used to prefix rule names; empty for none.
    pub id: String,
    /// Modules, dependencies before dependents.
    pub modules: Vec<IrModule>,
    /// Libraries in creation order.
    pub libraries: Vec<IrLibrary>,
}

impl IrProject {
    pub fn module(&self, id: ModuleId) -> &IrModule {
        &self.modules[id.0]
    }

    pub fn library(&self, id: LibraryId) -> &IrLibrary {
        &self.libraries[id.0]
    }

    /// Iterates over the modules with their ids.
    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &IrModule)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(index, module)| (ModuleId(index), module))
    }

    /// Looks up a module by its unit name.
    pub fn find_module(&self, name: &str) -> Option<ModuleId> {
        self.modules
            .iter()
            .position(|module| module.name == name)
            .map(ModuleId)
    }

    /// Every file referenced by any library.
    pub fn library_files(&self) -> impl Iterator<Item = &Utf8Path> {
        self.libraries
            .iter()
            .flat_map(|library| library.files.iter().map(Utf8PathBuf::as_path))
    }
}

/// One compilable unit: a single IDE module or a collapsed cycle of them.
#[derive(Debug, Clone, Default)]
pub struct IrModule {
    /// Unique unit name.
    pub name: String,
    /// Names of the IDE modules merged into this unit, sorted.
    pub members: Vec<String>,
    /// Nearest common ancestor of the members' directories.
    pub base_dir: Utf8PathBuf,
    /// Module definition files of the members.
    pub module_files: Vec<Utf8PathBuf>,
    pub sources: Vec<Utf8PathBuf>,
    pub test_sources: Vec<Utf8PathBuf>,
    pub resources: Vec<Utf8PathBuf>,
    pub test_resources: Vec<Utf8PathBuf>,
    /// Package prefix per source root.
    pub prefixes: BTreeMap<Utf8PathBuf, String>,
    /// Excluded paths, sorted.
    pub excludes: Vec<Exclude>,
    pub compiler_options: Option<String>,
    /// Production units whose package-private members this unit's tests
    /// may access.
    pub test_friends: Vec<ModuleId>,
    /// Dependencies in declaration order, exact duplicates removed.
    pub dependencies: Vec<Dependency>,
}

/// An excluded file or directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Exclude {
    pub path: Utf8PathBuf,
    pub is_dir: bool,
}

/// A set of binary artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrLibrary {
    /// Normalized name, or `#` for an anonymous module library.
    pub name: String,
    /// The module a module-level library belongs to; `None` when shared.
    pub owner: Option<ModuleId>,
    /// Jar files, sorted.
    pub files: Vec<Utf8PathBuf>,
}

impl IrLibrary {
    pub fn is_shared(&self) -> bool {
        self.owner.is_none()
    }
}

/// Target of a [`Dependency`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrNodeRef {
    Module(ModuleId),
    Library(LibraryId),
}

/// A dependency edge of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub target: IrNodeRef,
    pub scope: Scope,
    /// Never set for runtime scopes.
    pub exported: bool,
}
