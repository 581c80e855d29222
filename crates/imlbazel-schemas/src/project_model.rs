//! Project model schema handed over by the IDE project loader.
//!
//! The loader (which reads `.iml` files and the `.idea` directory) is not
//! part of this workspace. It serializes what it found into a
//! [`ProjectModel`], which is the only input the pipeline needs. The model
//! may contain dependency cycles between modules; breaking them is the job
//! of the condense phase.
//!
//! All paths are absolute. They are made workspace-relative later, when
//! rules are placed into packages.

use std::collections::{BTreeMap, BTreeSet};

use camino::Utf8PathBuf;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Scope;

/// Root structure describing an IDE project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProjectModel {
    /// Workspace root. Every generated package lives below it.
    #[schemars(with = "String")]
    pub base_dir: Utf8PathBuf,

    /// Directory holding `.idea`, relative to `base_dir`.
    #[serde(default)]
    #[schemars(with = "String")]
    pub project_path: Utf8PathBuf,

    /// Project id. When non-empty, generated rule names become `"<id>.<name>"`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// All modules of the project.
    pub modules: Vec<ModuleModel>,

    /// Project-level libraries, keyed by library name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub libraries: BTreeMap<String, LibraryModel>,

    /// Files excluded from compilation project-wide.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    #[schemars(with = "BTreeSet<String>")]
    pub excluded_files: BTreeSet<Utf8PathBuf>,

    /// Directories excluded from compilation project-wide.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    #[schemars(with = "BTreeSet<String>")]
    pub excluded_directories: BTreeSet<Utf8PathBuf>,
}

/// One IDE module (one `.iml` file).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModuleModel {
    /// Module name, unique across the project.
    pub name: String,

    /// Module content root.
    #[schemars(with = "String")]
    pub base_dir: Utf8PathBuf,

    /// The module definition file, if the loader knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub module_file: Option<Utf8PathBuf>,

    /// Source, test-source, resource and test-resource roots.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_roots: Vec<SourceRoot>,

    /// Files excluded from this module.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    #[schemars(with = "BTreeSet<String>")]
    pub excluded_files: BTreeSet<Utf8PathBuf>,

    /// Directories excluded from this module.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    #[schemars(with = "BTreeSet<String>")]
    pub excluded_directories: BTreeSet<Utf8PathBuf>,

    /// Extra compiler options for this module.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler_options: Option<String>,

    /// Set when this module holds the tests of another (production) module
    /// and may access its package-private members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_module: Option<String>,

    /// Ordered dependency elements.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencyModel>,
}

/// A typed source root of a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SourceRoot {
    /// Root directory.
    #[schemars(with = "String")]
    pub path: Utf8PathBuf,

    /// What the root contains.
    pub kind: RootKind,

    /// Package prefix override for sources under this root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_prefix: Option<String>,
}

/// Kind of a [`SourceRoot`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum RootKind {
    Source,
    TestSource,
    Resource,
    TestResource,
}

/// A dependency element of a module.
///
/// The target is a closed union (module, library, SDK); the flags carry the
/// IDE extension metadata from which the [`Scope`] is derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DependencyModel {
    /// What the module depends on.
    #[serde(flatten)]
    pub target: DependencyTarget,

    /// Whether dependents of the module see this dependency too.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exported: bool,

    /// Test-only flag.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub test: bool,

    /// Runtime-only flag.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub runtime: bool,

    /// Provided (compile-only, not bundled) flag.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub provided: bool,
}

impl DependencyModel {
    /// Creates a non-exported COMPILE dependency on `target`.
    pub fn new(target: DependencyTarget) -> Self {
        Self {
            target,
            exported: false,
            test: false,
            runtime: false,
            provided: false,
        }
    }

    /// Resolves the scope from the extension flags.
    pub fn scope(&self) -> Scope {
        Scope::from_flags(self.test, self.runtime, self.provided)
    }
}

/// Target of a [`DependencyModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DependencyTarget {
    /// Another module of the project, by name.
    Module { name: String },
    /// A library. Project-level libraries are looked up by name in
    /// [`ProjectModel::libraries`]; module-level libraries carry their files
    /// inline and may be anonymous.
    Library {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default)]
        level: LibraryLevel,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        #[schemars(with = "Vec<String>")]
        files: Vec<Utf8PathBuf>,
    },
    /// An SDK entry, by name.
    Sdk { name: String },
}

/// Where a library is defined.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum LibraryLevel {
    /// Shared by the whole project.
    #[default]
    Project,
    /// Private to the module that declares it.
    Module,
}

/// A project-level library.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LibraryModel {
    /// Binary artifacts (jars) of the library.
    #[serde(default)]
    #[schemars(with = "Vec<String>")]
    pub files: Vec<Utf8PathBuf>,
}

#[cfg(test)]
mod tests {
    use proptest::collection::{btree_map, vec};
    use proptest::prelude::*;

    use super::*;
    use crate::testutil::{arb_name, arb_path};

    fn arb_target() -> impl Strategy<Value = DependencyTarget> {
        prop_oneof![
            arb_name().prop_map(|name| DependencyTarget::Module { name }),
            (
                proptest::option::of(arb_name()),
                prop_oneof![Just(LibraryLevel::Project), Just(LibraryLevel::Module)],
                vec(arb_path(), 0..3),
            )
                .prop_map(|(name, level, files)| DependencyTarget::Library {
                    name,
                    level,
                    files,
                }),
            arb_name().prop_map(|name| DependencyTarget::Sdk { name }),
        ]
    }

    fn arb_dependency() -> impl Strategy<Value = DependencyModel> {
        (arb_target(), any::<[bool; 4]>()).prop_map(|(target, flags)| {
            DependencyModel {
                target,
                exported: flags[0],
                test: flags[1],
                runtime: flags[2],
                provided: flags[3],
            }
        })
    }

    fn arb_module() -> impl Strategy<Value = ModuleModel> {
        (arb_name(), arb_path(), vec(arb_dependency(), 0..4)).prop_map(
            |(name, base_dir, dependencies)| ModuleModel {
                name,
                base_dir,
                dependencies,
                ..Default::default()
            },
        )
    }

    prop_compose! {
        fn arb_project()
            (
                modules in vec(arb_module(), 0..5),
                libraries in btree_map(
                    arb_name(),
                    vec(arb_path(), 0..3).prop_map(|files| LibraryModel { files }),
                    0..3,
                ),
            )
        -> ProjectModel {
            ProjectModel {
                base_dir: Utf8PathBuf::from("/ws"),
                modules,
                libraries,
                ..Default::default()
            }
        }
    }

    proptest! {
        /// The tagged/flattened dependency encoding must survive JSON.
        #[test]
        fn test_project_model_roundtrip(project in arb_project()) {
            let json = serde_json::to_string(&project).expect("serialize");
            let parsed: ProjectModel =
                serde_json::from_str(&json).expect("deserialize");
            prop_assert_eq!(parsed, project);
        }
    }

    #[test]
    fn dependency_defaults_to_compile() {
        let dep: DependencyModel =
            serde_json::from_str(r#"{ "kind": "module", "name": "core" }"#)
                .unwrap();
        assert_eq!(dep.scope(), Scope::Compile);
        assert!(!dep.exported);
        assert_eq!(
            dep.target,
            DependencyTarget::Module {
                name: "core".to_string()
            }
        );
    }

    #[test]
    fn library_dependency_parses_inline_files() {
        let dep: DependencyModel = serde_json::from_str(
            r#"{
                "kind": "library",
                "level": "module",
                "files": ["/ws/lib/a.jar"],
                "test": true,
                "runtime": true
            }"#,
        )
        .unwrap();
        assert_eq!(dep.scope(), Scope::TestRuntime);
        match dep.target {
            DependencyTarget::Library { name, level, files } => {
                assert!(name.is_none());
                assert_eq!(level, LibraryLevel::Module);
                assert_eq!(files, vec![Utf8PathBuf::from("/ws/lib/a.jar")]);
            }
            other => panic!("expected library, got {other:?}"),
        }
    }
}
