//! Rule graph assembly.
//!
//! Turns the IR into placed rules in three passes:
//! 1. Creation: one module rule per unit, in the package enclosing its
//!    directory
//! 2. Dependencies: module edges, shared library rules, per-file edges for
//!    module libraries, extra imports
//! 3. Suppression and roots

use std::collections::{HashMap, HashSet};

use camino::{Utf8Path, Utf8PathBuf};
use imlbazel_ir::{IrModule, IrNodeRef, IrProject, LibraryId, ModuleId};
use imlbazel_schemas::{
    Configuration, Diagnostics, Label, Package, Rule, RuleDependency, RuleGraph, RuleKind,
    Scope, Tag,
};
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use tracing::{debug, debug_span, info};

use crate::error::RulesError;
use crate::jars::JarResolver;
use crate::naming::{NamingPolicy, with_project_id};
use crate::workspace::{Workspace, package_relative};

/// Rules by label, in creation order.
pub(crate) type Rules = IndexMap<Label, Rule>;

/// Registers the unmanaged rule `label` for `what`, or reuses it if it
/// already exists. Returns false, and records an error, when a rule of
/// another kind owns the label.
pub(crate) fn unmanaged_rule(
    rules: &mut Rules,
    label: &Label,
    what: &str,
    diagnostics: &Diagnostics,
) -> bool {
    match rules.get(label) {
        Some(rule) if rule.kind != RuleKind::Unmanaged => {
            diagnostics.error(format_args!(
                "Cannot use {label} for {what}: the label belongs to a {:?} rule",
                rule.kind
            ));
            false
        }
        Some(_) => true,
        None => {
            rules.insert(label.clone(), Rule::new(label.name(), RuleKind::Unmanaged));
            true
        }
    }
}

/// Directory of the project-level library definitions, relative to the
/// project directory.
const LIBRARIES_DIR: &str = ".idea/libraries";

/// Inputs of [`assemble`] that stay fixed for a run.
pub struct AssembleContext<'a> {
    pub workspace: &'a Workspace,
    pub config: &'a Configuration,
    pub naming: &'a dyn NamingPolicy,
    /// Absolute paths of library files known to exist.
    pub existing: &'a HashSet<Utf8PathBuf>,
    pub diagnostics: &'a Diagnostics,
}

/// Places every unit and library of `ir` into packages and resolves their
/// dependencies.
///
/// # Errors
///
/// Returns [`RulesError`] if:
/// - A unit directory or root is outside the workspace
///   ([`RulesError::is_outside_workspace`])
/// - A unit directory, or the project library directory, has no enclosing
///   package ([`RulesError::is_missing_package`])
/// - A module library is used by a unit that does not own it
///   ([`RulesError::is_foreign_module_library`])
/// - A configured label is malformed ([`RulesError::is_invalid_label`])
/// - Two jars map onto one import rule ([`RulesError::is_conflicting_jar`])
pub fn assemble(ir: &IrProject, context: &AssembleContext<'_>) -> Result<RuleGraph, RulesError> {
    let _span = debug_span!("assemble", units = ir.modules.len()).entered();

    let mut assembler = Assembler {
        ir,
        context,
        rules: Rules::new(),
        jars: JarResolver::new(context.workspace, context.config, &ir.id, context.existing),
        units: Vec::with_capacity(ir.modules.len()),
        libraries: HashMap::new(),
        libraries_package: None,
    };

    for (_, unit) in ir.modules() {
        assembler.create(unit)?;
    }
    for (id, unit) in ir.modules() {
        assembler.connect(id, unit)?;
    }
    assembler.suppress()?;

    let graph = assembler.finish();
    info!(
        rules = graph.rule_count(),
        packages = graph.packages.len(),
        roots = graph.roots.len(),
        "assembled rule graph"
    );
    Ok(graph)
}

struct Assembler<'a> {
    ir: &'a IrProject,
    context: &'a AssembleContext<'a>,
    rules: Rules,
    jars: JarResolver<'a>,
    /// Label of each unit's rule, indexed by module id; `None` for a unit
    /// dropped because its label was taken.
    units: Vec<Option<Label>>,
    /// Resolved shared libraries; `None` when nothing was left to depend on.
    libraries: HashMap<LibraryId, Option<Label>>,
    libraries_package: Option<String>,
}

impl Assembler<'_> {
    fn create(&mut self, unit: &IrModule) -> Result<(), RulesError> {
        let workspace = self.context.workspace;
        let relative = workspace
            .relativize(&unit.base_dir)
            .ok_or_else(|| RulesError::outside_workspace(&unit.base_dir))?;
        let package = workspace
            .find_package(&relative)
            .ok_or_else(|| RulesError::missing_package("module", &relative))?;

        let name = with_project_id(
            &self.ir.id,
            &self
                .context
                .naming
                .module_name(package, relative.as_str(), &unit.name),
        );
        let mut rule = Rule::new(name.as_str(), RuleKind::Project);
        let place_all = |paths: &[Utf8PathBuf]| -> Result<Vec<String>, RulesError> {
            paths.iter().map(|path| place(workspace, package, path)).collect()
        };
        rule.module_files = place_all(&unit.module_files)?;
        rule.srcs = place_all(&unit.sources)?;
        rule.test_srcs = place_all(&unit.test_sources)?;
        rule.resources = place_all(&unit.resources)?;
        rule.test_resources = place_all(&unit.test_resources)?;
        for (root, prefix) in &unit.prefixes {
            rule.package_prefixes
                .insert(place(workspace, package, root)?, prefix.clone());
        }
        for exclude in &unit.excludes {
            let path = place(workspace, package, &exclude.path)?;
            rule.excludes
                .push(if exclude.is_dir { format!("{path}/*") } else { path });
        }
        rule.javacopts.clone_from(&unit.compiler_options);
        rule.export = true;

        let label = Label::new(package, &name);
        if self.rules.contains_key(&label) {
            self.context
                .diagnostics
                .error(format_args!("Duplicate rule {label} for module {}", unit.name));
            self.units.push(None);
        } else {
            self.rules.insert(label.clone(), rule);
            self.units.push(Some(label));
        }
        Ok(())
    }

    fn connect(&mut self, id: ModuleId, unit: &IrModule) -> Result<(), RulesError> {
        let Some(own) = self.units[id.index()].clone() else {
            return Ok(());
        };
        let ir = self.ir;
        let mut deps = IndexSet::new();
        let mut bundled = IndexSet::new();

        for dependency in &unit.dependencies {
            let tags = dependency.scope.tags();
            match dependency.target {
                IrNodeRef::Module(target) => {
                    let Some(label) = self.units[target.index()].clone() else {
                        continue;
                    };
                    deps.insert(RuleDependency {
                        label,
                        exported: dependency.exported,
                        tags: std::iter::once(Tag::Module).chain(tags).collect(),
                    });
                }
                IrNodeRef::Library(library_id) => {
                    let library = ir.library(library_id);
                    match library.owner {
                        None => {
                            if let Some(label) = self.shared_library(library_id, unit)? {
                                deps.insert(RuleDependency {
                                    label,
                                    exported: dependency.exported,
                                    tags,
                                });
                            }
                        }
                        Some(owner) if owner != id => {
                            return Err(RulesError::foreign_module_library(
                                &library.name,
                                &unit.name,
                            ));
                        }
                        Some(_) => {
                            for file in &library.files {
                                let Some(label) = self.jars.resolve(
                                    &mut self.rules,
                                    file,
                                    &unit.name,
                                    self.context.diagnostics,
                                )?
                                else {
                                    continue;
                                };
                                if !dependency.scope.is_test() && dependency.scope != Scope::Provided {
                                    bundled.insert(label.clone());
                                }
                                deps.insert(RuleDependency {
                                    label,
                                    exported: dependency.exported,
                                    tags: tags.clone(),
                                });
                            }
                        }
                    }
                }
            }
        }

        let config = self.context.config;
        let extra = std::iter::once(&unit.name)
            .chain(&unit.members)
            .filter_map(|name| config.extra_imports.get(name))
            .flatten();
        for text in extra {
            let label = Label::parse(text).ok_or_else(|| RulesError::invalid_label(text))?;
            self.rules
                .entry(label.clone())
                .or_insert_with(|| Rule::new(label.name(), RuleKind::Unmanaged));
            deps.insert(RuleDependency {
                label,
                exported: false,
                tags: Vec::new(),
            });
        }

        let test_friends = unit
            .test_friends
            .iter()
            .filter_map(|friend| self.units[friend.index()].clone())
            .collect();

        if let Some(rule) = self.rules.get_mut(&own) {
            rule.deps = deps.into_iter().collect();
            rule.bundled = bundled.into_iter().collect();
            rule.test_friends = test_friends;
        }
        Ok(())
    }

    /// Returns the rule standing for a shared library, creating it on first
    /// use. Unmanaged libraries map to rules in the SDK package; all others
    /// become a library rule aggregating one edge per jar.
    fn shared_library(
        &mut self,
        id: LibraryId,
        unit: &IrModule,
    ) -> Result<Option<Label>, RulesError> {
        if let Some(label) = self.libraries.get(&id) {
            return Ok(label.clone());
        }
        let config = self.context.config;
        let ir = self.ir;
        let library = ir.library(id);

        let diagnostics = self.context.diagnostics;
        let label = if let Some(name) = config.unmanaged_library(&library.name) {
            let label = Label::new(&config.sdk_package, &name);
            let what = format!("library {}", library.name);
            unmanaged_rule(&mut self.rules, &label, &what, diagnostics).then_some(label)
        } else {
            let package = self.libraries_package()?;
            let name = with_project_id(&ir.id, &library.name);
            let mut jars = IndexSet::new();
            for file in &library.files {
                if let Some(jar) = self.jars.resolve(&mut self.rules, file, &unit.name, diagnostics)? {
                    jars.insert(jar);
                }
            }
            let label = Label::new(&package, &name);
            if jars.is_empty() {
                if library.name == config.sdk_library {
                    diagnostics.warning(format_args!(
                        "SDK library {} is not mapped to an unmanaged rule; dropping the SDK dependency of {}",
                        library.name, unit.name
                    ));
                } else {
                    debug!(library = %library.name, "library has no jars");
                }
                None
            } else if let Some(existing) = self.rules.get(&label) {
                diagnostics.error(format_args!(
                    "Cannot create rule {label} for library {}: the label belongs to a {:?} rule",
                    library.name, existing.kind
                ));
                None
            } else {
                let mut rule = Rule::new(name, RuleKind::Library);
                rule.deps = jars
                    .into_iter()
                    .map(|jar| RuleDependency {
                        label: jar,
                        exported: true,
                        tags: Vec::new(),
                    })
                    .collect();
                self.rules.insert(label.clone(), rule);
                Some(label)
            }
        };

        self.libraries.insert(id, label.clone());
        Ok(label)
    }

    /// Package holding the named library rules.
    fn libraries_package(&mut self) -> Result<String, RulesError> {
        if let Some(package) = &self.libraries_package {
            return Ok(package.clone());
        }
        let workspace = self.context.workspace;
        let dir = self.ir.base_dir.join(&self.ir.project_path).join(LIBRARIES_DIR);
        let relative = workspace
            .relativize(&dir)
            .ok_or_else(|| RulesError::outside_workspace(&dir))?;
        let package = workspace
            .find_package(&relative)
            .ok_or_else(|| RulesError::missing_package("project libraries", &relative))?
            .to_string();
        self.libraries_package = Some(package.clone());
        Ok(package)
    }

    fn suppress(&mut self) -> Result<(), RulesError> {
        let config = self.context.config;
        let targets = config
            .suppressed_targets
            .iter()
            .map(|text| Label::parse(text).ok_or_else(|| RulesError::invalid_label(text)))
            .collect::<Result<HashSet<Label>, _>>()?;

        for (label, rule) in &mut self.rules {
            let package = label.package();
            let under_prefix = config.suppressed_prefixes.iter().any(|prefix| {
                package == prefix
                    || package
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            });
            if under_prefix || targets.contains(label) {
                rule.suppressed = true;
            }
        }
        Ok(())
    }

    fn finish(self) -> RuleGraph {
        let depended: HashSet<&Label> = self
            .rules
            .values()
            .flat_map(Rule::dependency_labels)
            .collect();
        let roots = self
            .rules
            .iter()
            .filter(|(label, rule)| rule.export && !rule.suppressed && !depended.contains(label))
            .map(|(label, _)| label.clone())
            .sorted()
            .collect();

        let mut graph = RuleGraph {
            roots,
            ..RuleGraph::default()
        };
        for (label, rule) in self.rules {
            graph
                .packages
                .entry(label.package().to_string())
                .or_insert_with(Package::default)
                .rules
                .push(rule);
        }
        for package in graph.packages.values_mut() {
            package.rules.sort_by(|a, b| a.name.cmp(&b.name));
        }
        graph
    }
}

fn place(workspace: &Workspace, package: &str, path: &Utf8Path) -> Result<String, RulesError> {
    let relative = workspace
        .relativize(path)
        .ok_or_else(|| RulesError::outside_workspace(path))?;
    Ok(package_relative(package, &relative))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use imlbazel_schemas::{
        DependencyModel, DependencyTarget, LibraryLevel, LibraryModel, ModuleModel, ProjectModel,
    };

    use super::*;
    use crate::naming::ConfiguredNaming;

    fn module(name: &str, dir: &str, dependencies: Vec<DependencyModel>) -> ModuleModel {
        ModuleModel {
            name: name.to_string(),
            base_dir: Utf8PathBuf::from(format!("/ws/{dir}")),
            module_file: Some(Utf8PathBuf::from(format!("/ws/{dir}/{name}.iml"))),
            dependencies,
            ..ModuleModel::default()
        }
    }

    fn on_module(name: &str) -> DependencyModel {
        DependencyModel::new(DependencyTarget::Module {
            name: name.to_string(),
        })
    }

    fn on_library(name: &str) -> DependencyModel {
        DependencyModel::new(DependencyTarget::Library {
            name: Some(name.to_string()),
            level: LibraryLevel::Project,
            files: Vec::new(),
        })
    }

    fn on_jar(path: &str) -> DependencyModel {
        DependencyModel::new(DependencyTarget::Library {
            name: None,
            level: LibraryLevel::Module,
            files: vec![Utf8PathBuf::from(path)],
        })
    }

    fn project(modules: Vec<ModuleModel>) -> ProjectModel {
        ProjectModel {
            base_dir: Utf8PathBuf::from("/ws"),
            modules,
            ..ProjectModel::default()
        }
    }

    fn run(
        model: &ProjectModel,
        config: &Configuration,
        packages: &[&str],
        existing: &[&str],
    ) -> Result<(RuleGraph, Diagnostics), RulesError> {
        let diagnostics = Diagnostics::new();
        let ir = imlbazel_ir::build(model, config, &diagnostics)?;
        let graph = assemble_ir(&ir, config, packages, existing, &diagnostics)?;
        Ok((graph, diagnostics))
    }

    fn assemble_ir(
        ir: &IrProject,
        config: &Configuration,
        packages: &[&str],
        existing: &[&str],
        diagnostics: &Diagnostics,
    ) -> Result<RuleGraph, RulesError> {
        let workspace = Workspace::with_packages(Utf8Path::new("/ws"), packages.iter().copied());
        let existing: HashSet<Utf8PathBuf> = existing.iter().map(Utf8PathBuf::from).collect();
        let naming = ConfiguredNaming::new(config);
        let context = AssembleContext {
            workspace: &workspace,
            config,
            naming: &naming,
            existing: &existing,
            diagnostics,
        };
        assemble(ir, &context)
    }

    fn labels(deps: &[RuleDependency]) -> Vec<&str> {
        deps.iter().map(|dep| dep.label.as_str()).collect()
    }

    #[test]
    fn test_shared_library_becomes_one_rule() {
        let mut model = project(vec![
            module("a", "a", vec![on_library("Guava")]),
            module("b", "b", vec![on_library("Guava")]),
        ]);
        model.libraries = BTreeMap::from([(
            "Guava".to_string(),
            LibraryModel {
                files: vec![
                    Utf8PathBuf::from("/ws/third_party/guava/guava-2.jar"),
                    Utf8PathBuf::from("/ws/third_party/guava/guava-1.jar"),
                ],
            },
        )]);
        let (graph, diagnostics) = run(
            &model,
            &Configuration::default(),
            &["", "a", "b", "third_party/guava"],
            &[
                "/ws/third_party/guava/guava-1.jar",
                "/ws/third_party/guava/guava-2.jar",
            ],
        )
        .unwrap();

        let libraries: Vec<_> = graph
            .rules()
            .filter(|(_, rule)| rule.kind == RuleKind::Library)
            .collect();
        assert_eq!(libraries.len(), 1);
        let (label, library) = &libraries[0];
        assert_eq!(label.as_str(), "//:guava");
        assert_eq!(
            labels(&library.deps),
            vec!["//third_party/guava:guava-1", "//third_party/guava:guava-2"]
        );

        for module in ["//a:a", "//b:b"] {
            let rule = graph.rule(&Label::parse(module).unwrap()).unwrap();
            assert_eq!(labels(&rule.deps), vec!["//:guava"]);
        }
        assert_eq!(diagnostics.tally().warnings, 0);
    }

    #[test]
    fn test_generated_jar_is_unmanaged() {
        let model = project(vec![module(
            "app",
            "app",
            vec![on_jar("/ws/bazel-genfiles/foo/bar.jar")],
        )]);
        let (graph, diagnostics) =
            run(&model, &Configuration::default(), &["app", "foo"], &[]).unwrap();

        let bar = Label::parse("//foo:bar").unwrap();
        assert_eq!(graph.rule(&bar).unwrap().kind, RuleKind::Unmanaged);
        let app = graph.rule(&Label::parse("//app:app").unwrap()).unwrap();
        assert_eq!(labels(&app.deps), vec!["//foo:bar"]);
        assert_eq!(app.bundled, vec![bar]);
        assert_eq!(diagnostics.warning_count(), 0);
    }

    #[test]
    fn test_suppressed_rule_stays_a_dependency_target() {
        let model = project(vec![
            module("app", "tools/app", vec![on_module("vendored")]),
            module("vendored", "prebuilts/vendored", vec![]),
            module("orphan", "prebuilts/orphan", vec![]),
        ]);
        let (graph, _) = run(
            &model,
            &Configuration::default(),
            &["tools/app", "prebuilts/vendored", "prebuilts/orphan"],
            &[],
        )
        .unwrap();

        let roots: Vec<&str> = graph.roots.iter().map(Label::as_str).collect();
        assert_eq!(roots, vec!["//tools/app:app"]);

        let vendored = Label::parse("//prebuilts/vendored:vendored").unwrap();
        assert!(graph.rule(&vendored).unwrap().suppressed);
        let app = graph.rule(&Label::parse("//tools/app:app").unwrap()).unwrap();
        assert_eq!(app.deps[0].label, vendored);
        assert_eq!(app.deps[0].tags, vec![Tag::Module]);
    }

    #[test]
    fn test_explicitly_suppressed_target() {
        let model = project(vec![module("a", "a", vec![])]);
        let config = Configuration {
            suppressed_targets: vec!["//a:a".to_string()],
            ..Configuration::default()
        };
        let (graph, _) = run(&model, &config, &["a"], &[]).unwrap();
        assert!(graph.roots.is_empty());
        assert!(graph.packages["a"].is_external());
    }

    #[test]
    fn test_same_jar_from_two_modules_is_one_rule() {
        let jar = "/ws/tools/lib/x.jar";
        let model = project(vec![
            module("a", "tools/a", vec![on_jar(jar)]),
            module("b", "tools/b", vec![on_jar(jar)]),
        ]);
        let (graph, _) = run(&model, &Configuration::default(), &["tools"], &[jar]).unwrap();

        let imports: Vec<String> = graph
            .rules()
            .filter(|(_, rule)| rule.kind == RuleKind::Import)
            .map(|(label, _)| label.to_string())
            .collect();
        assert_eq!(imports, vec!["//tools:lib/x"]);
        for module in ["//tools:a", "//tools:b"] {
            let rule = graph.rule(&Label::parse(module).unwrap()).unwrap();
            assert_eq!(labels(&rule.deps), vec!["//tools:lib/x"]);
            assert_eq!(rule.srcs, Vec::<String>::new());
            assert_eq!(rule.module_files.len(), 1);
        }
        let a = graph.rule(&Label::parse("//tools:a").unwrap()).unwrap();
        assert_eq!(a.module_files, vec!["a/a.iml"]);
    }

    #[test]
    fn test_runtime_module_edge() {
        let mut runtime = on_module("b");
        runtime.runtime = true;
        runtime.exported = true;
        let model = project(vec![module("a", "a", vec![runtime]), module("b", "b", vec![])]);
        let (graph, _) = run(&model, &Configuration::default(), &["a", "b"], &[]).unwrap();

        let a = graph.rule(&Label::parse("//a:a").unwrap()).unwrap();
        assert!(!a.deps[0].exported);
        assert_eq!(a.deps[0].tags, vec![Tag::Module, Tag::Runtime]);
        assert_eq!(graph.roots, vec![Label::parse("//a:a").unwrap()]);
    }

    #[test]
    fn test_test_friends_and_sdk() {
        let sdk = DependencyModel::new(DependencyTarget::Sdk {
            name: "Android Studio".to_string(),
        });
        let mut tests = module("app.tests", "app/tests", vec![on_module("app"), sdk]);
        tests.production_module = Some("app".to_string());
        let model = project(vec![module("app", "app", vec![]), tests]);
        let (graph, _) = run(
            &model,
            &Configuration::default(),
            &["app", "prebuilts/studio/intellij-sdk"],
            &[],
        )
        .unwrap();

        let tests = graph.rule(&Label::parse("//app:app.tests").unwrap()).unwrap();
        assert_eq!(tests.test_friends, vec![Label::parse("//app:app").unwrap()]);
        assert_eq!(
            labels(&tests.deps),
            vec!["//app:app", "//prebuilts/studio/intellij-sdk:studio-sdk"]
        );
        let sdk = Label::parse("//prebuilts/studio/intellij-sdk:studio-sdk").unwrap();
        assert_eq!(graph.rule(&sdk).unwrap().kind, RuleKind::Unmanaged);
    }

    #[test]
    fn test_extra_imports() {
        let model = project(vec![module("a", "a", vec![])]);
        let config = Configuration {
            extra_imports: BTreeMap::from([(
                "a".to_string(),
                vec!["//prebuilts/tools:layoutlib".to_string()],
            )]),
            ..Configuration::default()
        };
        let (graph, _) = run(&model, &config, &["a"], &[]).unwrap();
        let a = graph.rule(&Label::parse("//a:a").unwrap()).unwrap();
        assert_eq!(labels(&a.deps), vec!["//prebuilts/tools:layoutlib"]);

        let bad = Configuration {
            extra_imports: BTreeMap::from([("a".to_string(), vec!["layoutlib".to_string()])]),
            ..Configuration::default()
        };
        assert!(run(&model, &bad, &["a"], &[]).unwrap_err().is_invalid_label());
    }

    #[test]
    fn test_module_without_package_is_fatal() {
        let model = project(vec![module("a", "a", vec![])]);
        let err = run(&model, &Configuration::default(), &["b"], &[]).unwrap_err();
        assert!(err.is_missing_package());
    }

    #[test]
    fn test_collapsed_cycle_has_no_self_edge() {
        let model = project(vec![
            module("a", "m/a", vec![on_module("b")]),
            module("b", "m/b", vec![on_module("c")]),
            module("c", "m/c", vec![on_module("a")]),
        ]);
        let (graph, diagnostics) = run(&model, &Configuration::default(), &["m"], &[]).unwrap();

        assert_eq!(graph.rule_count(), 1);
        let (label, rule) = graph.rules().next().unwrap();
        assert_eq!(label.as_str(), "//m:a_and_others");
        assert!(rule.deps.is_empty());
        assert_eq!(rule.module_files.len(), 3);
        assert_eq!(diagnostics.tally().errors, 0);
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let jar = "/ws/tools/lib/x.jar";
        let model = project(vec![
            module("a", "tools/a", vec![on_module("b"), on_jar(jar)]),
            module("b", "tools/b", vec![on_module("a")]),
            module("c", "tools/c", vec![on_module("a"), on_jar(jar)]),
        ]);
        let render = || {
            let (graph, _) = run(&model, &Configuration::default(), &["tools"], &[jar]).unwrap();
            serde_json::to_string(&graph).unwrap()
        };
        assert_eq!(render(), render());
    }

    #[test]
    fn test_library_label_taken_by_module() {
        let guava = ModuleModel {
            name: "guava".to_string(),
            base_dir: Utf8PathBuf::from("/ws"),
            module_file: Some(Utf8PathBuf::from("/ws/guava.iml")),
            ..ModuleModel::default()
        };
        let mut model = project(vec![guava, module("app", "app", vec![on_library("Guava")])]);
        model.libraries = BTreeMap::from([(
            "Guava".to_string(),
            LibraryModel {
                files: vec![Utf8PathBuf::from("/ws/third_party/g.jar")],
            },
        )]);
        let (graph, diagnostics) = run(
            &model,
            &Configuration::default(),
            &["", "app", "third_party"],
            &["/ws/third_party/g.jar"],
        )
        .unwrap();

        let module = graph.rule(&Label::parse("//:guava").unwrap()).unwrap();
        assert_eq!(module.kind, RuleKind::Project);
        assert_eq!(module.module_files, vec!["guava.iml"]);
        let app = graph.rule(&Label::parse("//app:app").unwrap()).unwrap();
        assert!(app.deps.is_empty());

        assert_eq!(diagnostics.error_count(), 1);
        assert!(diagnostics.messages().iter().any(|(_, message)| {
            message.contains("//:guava") && message.contains("library guava")
        }));
    }

    #[test]
    fn test_sdk_label_taken_by_module() {
        let sdk = DependencyModel::new(DependencyTarget::Sdk {
            name: "Android Studio".to_string(),
        });
        let model = project(vec![
            module("studio-sdk", "prebuilts/studio/intellij-sdk", vec![]),
            module("app", "app", vec![sdk]),
        ]);
        let (graph, diagnostics) = run(
            &model,
            &Configuration::default(),
            &["app", "prebuilts/studio/intellij-sdk"],
            &[],
        )
        .unwrap();

        let taken = Label::parse("//prebuilts/studio/intellij-sdk:studio-sdk").unwrap();
        assert_eq!(graph.rule(&taken).unwrap().kind, RuleKind::Project);
        let app = graph.rule(&Label::parse("//app:app").unwrap()).unwrap();
        assert!(app.deps.is_empty());
        assert_eq!(diagnostics.error_count(), 1);
    }

    #[test]
    fn test_unmapped_sdk_library_warns() {
        let sdk = DependencyModel::new(DependencyTarget::Sdk {
            name: "Android Studio".to_string(),
        });
        let model = project(vec![module("app", "app", vec![sdk])]);
        let config = Configuration {
            unmanaged_libraries: BTreeMap::new(),
            ..Configuration::default()
        };
        let (graph, diagnostics) = run(&model, &config, &["", "app"], &[]).unwrap();

        let app = graph.rule(&Label::parse("//app:app").unwrap()).unwrap();
        assert!(app.deps.is_empty());
        assert_eq!(diagnostics.warning_count(), 1);
        assert!(
            diagnostics
                .messages()
                .iter()
                .any(|(_, message)| message.contains("SDK library studio-sdk"))
        );
    }

    #[test]
    fn test_duplicate_unit_label_keeps_one_module() {
        let config = Configuration {
            naming: vec![imlbazel_schemas::NamingRule {
                path_prefix: "tools".to_string(),
                name_prefix: "studio.".to_string(),
            }],
            ..Configuration::default()
        };
        let model = project(vec![
            module("x", "tools/x", vec![on_module("dep1")]),
            module("studio.x", "tools/y", vec![on_module("dep2")]),
            module("dep1", "other/dep1", vec![]),
            module("dep2", "other/dep2", vec![]),
        ]);
        let (graph, diagnostics) = run(&model, &config, &["tools", "other"], &[]).unwrap();

        assert_eq!(diagnostics.error_count(), 1);
        let rule = graph.rule(&Label::parse("//tools:studio.x").unwrap()).unwrap();
        assert_eq!(rule.module_files.len(), 1);
        let expected = match rule.module_files[0].as_str() {
            "x/x.iml" => "//other:dep1",
            "y/studio.x.iml" => "//other:dep2",
            other => panic!("unexpected module file {other}"),
        };
        assert_eq!(labels(&rule.deps), vec![expected]);
    }

    #[test]
    fn test_foreign_module_library_is_fatal() {
        let jar = "/ws/tools/lib/x.jar";
        let model = project(vec![
            module("a", "tools/a", vec![on_jar(jar)]),
            module("b", "tools/b", vec![]),
        ]);
        let config = Configuration::default();
        let diagnostics = Diagnostics::new();
        let mut ir = imlbazel_ir::build(&model, &config, &diagnostics).unwrap();

        let a = ir.find_module("a").unwrap();
        let b = ir.find_module("b").unwrap();
        let library = ir.module(a).dependencies[0];
        assert!(matches!(library.target, IrNodeRef::Library(_)));
        ir.modules[b.index()].dependencies.push(library);

        let err = assemble_ir(&ir, &config, &["tools"], &[jar], &diagnostics).unwrap_err();
        assert!(err.is_foreign_module_library());
    }
}
