//! Project model to IR conversion.

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use imlbazel_condense::{
    Component, Condensation, ModuleGraph, collapse, report_cycles, topological_order,
};
use imlbazel_schemas::{
    Configuration, DependencyTarget, Diagnostics, LibraryLevel, ModuleModel, ProjectModel,
    RootKind, Scope, Severity,
};
use indexmap::IndexSet;
use itertools::Itertools;
use tracing::{debug, debug_span};

use crate::error::IrError;
use crate::ir::{
    Dependency, Exclude, IrLibrary, IrModule, IrNodeRef, IrProject, LibraryId, ModuleId,
};

/// Library name used for anonymous module libraries.
pub const ANONYMOUS_LIBRARY: &str = "#";

/// Builds the IR for a project model.
///
/// Modules are sorted by name, cycles are reported and collapsed, and one
/// [`IrModule`] is created per collapsed unit, dependencies first.
///
/// # Errors
///
/// Returns [`IrError`] if:
/// - Two modules share a name ([`IrError::is_duplicate_module`])
/// - A module has no module file ([`IrError::is_missing_module_file`])
/// - Merged modules disagree on compiler options
///   ([`IrError::is_conflicting_compiler_options`])
pub fn build(
    model: &ProjectModel,
    config: &Configuration,
    diagnostics: &Diagnostics,
) -> Result<IrProject, IrError> {
    let _span = debug_span!("build_ir", modules = model.modules.len()).entered();

    let mut models: Vec<&ModuleModel> = model.modules.iter().collect();
    models.sort_by(|a, b| a.name.cmp(&b.name));
    if let Some((duplicate, _)) = models
        .iter()
        .tuple_windows()
        .find(|(a, b)| a.name == b.name)
    {
        return Err(IrError::duplicate_module(&duplicate.name));
    }
    if let Some(module) = models.iter().find(|m| m.module_file.is_none()) {
        return Err(IrError::missing_module_file(&module.name));
    }

    let graph = module_graph(&models, config, diagnostics);
    let cycles = report_cycles(&graph, diagnostics);
    let condensation = collapse(&graph);
    let order = topological_order(&condensation.to_graph(), Severity::Error, diagnostics);

    let mut unit_of_component = vec![ModuleId(0); condensation.components().len()];
    for (position, node) in order.iter().enumerate() {
        unit_of_component[node.index()] = ModuleId(position);
    }

    let mut builder = Builder {
        model,
        config,
        diagnostics,
        models: &models,
        graph: &graph,
        condensation: &condensation,
        unit_of_component,
        libraries: Vec::new(),
        shared: HashMap::new(),
        owned: HashMap::new(),
    };
    let mut modules = Vec::with_capacity(order.len());
    for node in &order {
        let id = ModuleId(modules.len());
        modules.push(builder.unit(id, &condensation.components()[node.index()])?);
    }

    debug!(
        units = modules.len(),
        libraries = builder.libraries.len(),
        cycles,
        "built IR"
    );

    Ok(IrProject {
        base_dir: model.base_dir.clone(),
        project_path: model.project_path.clone(),
        id: model.id.clone(),
        modules,
        libraries: builder.libraries,
    })
}

/// Builds the raw module graph. Module ids are positions in `models`.
fn module_graph(
    models: &[&ModuleModel],
    config: &Configuration,
    diagnostics: &Diagnostics,
) -> ModuleGraph {
    let mut graph = ModuleGraph::new();
    for module in models {
        graph.add_module(&module.name);
    }
    for (from, module) in models.iter().enumerate() {
        for dependency in &module.dependencies {
            let DependencyTarget::Module { name } = &dependency.target else {
                continue;
            };
            match graph.module(name) {
                Some(to) => graph.add_dependency(from, to),
                None if config.is_ignored_module(&module.name) => {}
                None => diagnostics.warning(format_args!(
                    "Module {}: invalid module reference {name}",
                    module.name
                )),
            }
        }
    }
    graph
}

/// Lowercases a library name and replaces characters that are not valid in
/// rule names.
pub fn normalize_library_name(name: &str) -> String {
    name.to_lowercase().replace(':', "_")
}

struct Builder<'a> {
    model: &'a ProjectModel,
    config: &'a Configuration,
    diagnostics: &'a Diagnostics,
    models: &'a [&'a ModuleModel],
    graph: &'a ModuleGraph,
    condensation: &'a Condensation,
    unit_of_component: Vec<ModuleId>,
    libraries: Vec<IrLibrary>,
    /// Normalized name -> shared library.
    shared: HashMap<String, LibraryId>,
    /// (owner, normalized name) -> named module library.
    owned: HashMap<(ModuleId, String), LibraryId>,
}

impl Builder<'_> {
    fn unit(&mut self, id: ModuleId, component: &Component) -> Result<IrModule, IrError> {
        let members: Vec<&ModuleModel> = component
            .members
            .iter()
            .map(|&member| self.models[member])
            .collect();

        let mut unit = IrModule {
            name: component.name.clone(),
            members: members.iter().map(|m| m.name.clone()).collect(),
            base_dir: common_ancestor(members.iter().map(|m| m.base_dir.as_path())),
            ..IrModule::default()
        };

        for member in &members {
            unit.module_files.extend(member.module_file.iter().cloned());
            for root in &member.source_roots {
                let roots = match root.kind {
                    RootKind::Source => &mut unit.sources,
                    RootKind::TestSource => &mut unit.test_sources,
                    RootKind::Resource => &mut unit.resources,
                    RootKind::TestResource => &mut unit.test_resources,
                };
                roots.push(root.path.clone());
                if let Some(prefix) = &root.package_prefix {
                    unit.prefixes.insert(root.path.clone(), prefix.clone());
                }
            }
            add_excludes(
                &mut unit.excludes,
                &member.excluded_files,
                &member.excluded_directories,
            );
            if let Some(options) = member.compiler_options.as_deref().filter(|o| !o.is_empty()) {
                match &unit.compiler_options {
                    Some(existing) if existing != options => {
                        return Err(IrError::conflicting_compiler_options(
                            &unit.name, existing, options,
                        ));
                    }
                    Some(_) => {}
                    None => unit.compiler_options = Some(options.to_string()),
                }
            }
        }

        // Project-wide exclusions only matter where they hit this unit's roots.
        let model = self.model;
        let under_roots = |path: &&Utf8PathBuf| {
            unit.sources
                .iter()
                .chain(&unit.test_sources)
                .chain(&unit.resources)
                .chain(&unit.test_resources)
                .any(|root| path.starts_with(root))
        };
        let files: Vec<&Utf8PathBuf> = model.excluded_files.iter().filter(under_roots).collect();
        let dirs: Vec<&Utf8PathBuf> =
            model.excluded_directories.iter().filter(under_roots).collect();
        add_excludes(&mut unit.excludes, files, dirs);
        unit.excludes.sort();
        unit.excludes.dedup();

        unit.dependencies = self.dependencies(id, &members);
        unit.test_friends = self.test_friends(id, &members);
        Ok(unit)
    }

    fn dependencies(&mut self, id: ModuleId, members: &[&ModuleModel]) -> Vec<Dependency> {
        let model = self.model;
        let mut edges = IndexSet::new();
        for member in members {
            for dependency in &member.dependencies {
                let scope = dependency.scope();
                let exported = dependency.exported && !scope.is_runtime();
                let target = match &dependency.target {
                    DependencyTarget::Module { name } => {
                        // Dangling references were reported with the graph.
                        let Some(target) = self.unit_of(name) else {
                            continue;
                        };
                        if target == id {
                            debug!(unit = %member.name, dependency = %name, "pruned self-dependency");
                            continue;
                        }
                        IrNodeRef::Module(target)
                    }
                    DependencyTarget::Library {
                        name,
                        level: LibraryLevel::Project,
                        ..
                    } => {
                        let Some(name) = name else {
                            self.diagnostics.warning(format_args!(
                                "Module {}: project library reference without a name",
                                member.name
                            ));
                            continue;
                        };
                        let Some(library) = model.libraries.get(name) else {
                            self.diagnostics.warning(format_args!(
                                "Module {}: unknown library {name}",
                                member.name
                            ));
                            continue;
                        };
                        IrNodeRef::Library(self.shared_library(name, &library.files))
                    }
                    DependencyTarget::Library {
                        name,
                        level: LibraryLevel::Module,
                        files,
                    } => IrNodeRef::Library(self.module_library(id, name.as_deref(), files)),
                    DependencyTarget::Sdk { name } => {
                        if *name != self.config.sdk_name {
                            debug!(unit = %member.name, sdk = %name, "ignored SDK dependency");
                            continue;
                        }
                        let config = self.config;
                        let sdk = self.shared_library(&config.sdk_library, &[]);
                        edges.insert(Dependency {
                            target: IrNodeRef::Library(sdk),
                            scope: Scope::Compile,
                            exported: false,
                        });
                        continue;
                    }
                };
                edges.insert(Dependency {
                    target,
                    scope,
                    exported,
                });
            }
        }
        edges.into_iter().collect()
    }

    fn test_friends(&self, id: ModuleId, members: &[&ModuleModel]) -> Vec<ModuleId> {
        let mut friends = IndexSet::new();
        for member in members {
            let Some(production) = &member.production_module else {
                continue;
            };
            match self.unit_of(production) {
                Some(friend) if friend != id => {
                    friends.insert(friend);
                }
                Some(_) => {}
                None if self.config.is_ignored_module(&member.name) => {}
                None => self.diagnostics.warning(format_args!(
                    "Module {}: unknown production module {production}",
                    member.name
                )),
            }
        }
        friends.into_iter().collect()
    }

    fn unit_of(&self, module: &str) -> Option<ModuleId> {
        let module = self.graph.module(module)?;
        Some(self.unit_of_component[self.condensation.component_of(module)])
    }

    fn shared_library(&mut self, name: &str, files: &[Utf8PathBuf]) -> LibraryId {
        let name = normalize_library_name(name);
        let id = match self.shared.get(&name) {
            Some(&id) => id,
            None => {
                let id = self.push_library(name.clone(), None);
                self.shared.insert(name, id);
                id
            }
        };
        self.add_files(id, files);
        id
    }

    fn module_library(
        &mut self,
        owner: ModuleId,
        name: Option<&str>,
        files: &[Utf8PathBuf],
    ) -> LibraryId {
        let id = match name.map(normalize_library_name) {
            // Anonymous libraries are never shared, not even within a module.
            None => self.push_library(ANONYMOUS_LIBRARY.to_string(), Some(owner)),
            Some(name) => {
                let key = (owner, name);
                match self.owned.get(&key) {
                    Some(&id) => id,
                    None => {
                        let id = self.push_library(key.1.clone(), Some(owner));
                        self.owned.insert(key, id);
                        id
                    }
                }
            }
        };
        self.add_files(id, files);
        id
    }

    fn push_library(&mut self, name: String, owner: Option<ModuleId>) -> LibraryId {
        self.libraries.push(IrLibrary {
            name,
            owner,
            files: Vec::new(),
        });
        LibraryId(self.libraries.len() - 1)
    }

    fn add_files(&mut self, id: LibraryId, files: &[Utf8PathBuf]) {
        let library = &mut self.libraries[id.0];
        library.files.extend_from_slice(files);
        library.files.sort();
        library.files.dedup();
    }
}

fn add_excludes<'p>(
    excludes: &mut Vec<Exclude>,
    files: impl IntoIterator<Item = &'p Utf8PathBuf>,
    dirs: impl IntoIterator<Item = &'p Utf8PathBuf>,
) {
    excludes.extend(files.into_iter().map(|path| Exclude {
        path: path.clone(),
        is_dir: false,
    }));
    excludes.extend(dirs.into_iter().map(|path| Exclude {
        path: path.clone(),
        is_dir: true,
    }));
}

/// Returns the longest path that is an ancestor of (or equal to) every
/// path in `paths`.
fn common_ancestor<'p>(mut paths: impl Iterator<Item = &'p Utf8Path>) -> Utf8PathBuf {
    let Some(first) = paths.next() else {
        return Utf8PathBuf::new();
    };
    let mut ancestor = first.to_path_buf();
    for path in paths {
        while !path.starts_with(&ancestor) {
            if !ancestor.pop() {
                break;
            }
        }
    }
    ancestor
}
