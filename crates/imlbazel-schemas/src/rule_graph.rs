//! Rule graph schema handed to the BUILD file emitter.
//!
//! The rule graph is the cycle-free result of the pipeline: every module,
//! library and jar has been placed into a package and named. Collections
//! are ordered (`BTreeMap`, sorted `Vec`s) because the emitted text is
//! diffed against existing files to decide whether to rewrite them, so
//! two runs over the same input must serialize byte-for-byte identically.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{Label, Tag};

/// Root structure holding all generated packages and the root set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RuleGraph {
    /// Packages keyed by workspace-relative package path.
    pub packages: BTreeMap<String, Package>,

    /// Top-level exported rules, sorted by label.
    ///
    /// A rule is a root when it is export-marked, not suppressed, and no
    /// other rule in the graph depends on it.
    pub roots: Vec<Label>,
}

impl RuleGraph {
    /// Looks up a rule by label.
    pub fn rule(&self, label: &Label) -> Option<&Rule> {
        self.packages
            .get(label.package())?
            .rules
            .iter()
            .find(|rule| rule.name == label.name())
    }

    /// Iterates over every rule with its label, in package then name order.
    pub fn rules(&self) -> impl Iterator<Item = (Label, &Rule)> {
        self.packages.iter().flat_map(|(package, pkg)| {
            pkg.rules
                .iter()
                .map(move |rule| (Label::new(package, &rule.name), rule))
        })
    }

    /// Counts rules across all packages.
    pub fn rule_count(&self) -> usize {
        self.packages.values().map(|pkg| pkg.rules.len()).sum()
    }
}

/// A package: a directory registered as a buildable unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Package {
    /// Rules of this package, sorted by name.
    pub rules: Vec<Rule>,
}

impl Package {
    /// Returns true when the emitter has nothing to generate here.
    ///
    /// Unmanaged rules exist elsewhere and suppressed rules are owned by
    /// somebody else, so a package made only of those is left alone.
    pub fn is_external(&self) -> bool {
        self.rules
            .iter()
            .all(|rule| rule.suppressed || rule.kind == RuleKind::Unmanaged)
    }
}

/// Kind of a generated rule.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum RuleKind {
    /// A module (collapsed component of IDE modules).
    #[serde(rename = "iml_module")]
    Project,
    /// A named, project-level library aggregating jar rules.
    #[serde(rename = "java_library")]
    Library,
    /// A prebuilt jar in the source tree.
    #[serde(rename = "java_import")]
    Import,
    /// A rule produced elsewhere; referenced but never generated.
    #[serde(rename = "unmanaged")]
    Unmanaged,
}

/// A placed rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Rule {
    /// Target name, unique within its package.
    pub name: String,

    /// What kind of rule this is.
    pub kind: RuleKind,

    /// Dependencies in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deps: Vec<RuleDependency>,

    /// Module definition files, package-relative.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub module_files: Vec<String>,

    /// Source roots, package-relative.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub srcs: Vec<String>,

    /// Test source roots, package-relative.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_srcs: Vec<String>,

    /// Resource roots, package-relative.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,

    /// Test resource roots, package-relative.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_resources: Vec<String>,

    /// Package prefixes keyed by package-relative source root.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub package_prefixes: BTreeMap<String, String>,

    /// Excluded paths, package-relative; directories end in `/*`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<String>,

    /// Jars of an import rule, package-relative.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub jars: Vec<String>,

    /// Production modules whose package-private members the tests of this
    /// module may access (Kotlin "friends").
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_friends: Vec<Label>,

    /// Module-owned library rules bundled with this module.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bundled: Vec<Label>,

    /// Compiler options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub javacopts: Option<String>,

    /// Candidate for the root/export set.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub export: bool,

    /// The rule must not be generated or modified.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub suppressed: bool,
}

impl Rule {
    /// Creates an empty rule of the given kind.
    pub fn new(name: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            name: name.into(),
            kind,
            deps: Vec::new(),
            module_files: Vec::new(),
            srcs: Vec::new(),
            test_srcs: Vec::new(),
            resources: Vec::new(),
            test_resources: Vec::new(),
            package_prefixes: BTreeMap::new(),
            excludes: Vec::new(),
            jars: Vec::new(),
            test_friends: Vec::new(),
            bundled: Vec::new(),
            javacopts: None,
            export: false,
            suppressed: false,
        }
    }

    /// Returns the labels this rule depends on, in declaration order.
    pub fn dependency_labels(&self) -> impl Iterator<Item = &Label> {
        self.deps.iter().map(|dep| &dep.label)
    }
}

/// A dependency edge of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct RuleDependency {
    /// The rule depended upon.
    pub label: Label,

    /// Whether dependents of this rule see the dependency too.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exported: bool,

    /// Scope tags (module, test, runtime, provided).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}
