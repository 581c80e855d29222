//! Project conventions that steer rule generation.
//!
//! Which path prefixes count as generated output, which libraries map to
//! externally produced rules and which rules are owned by somebody else are
//! all project-specific. They live here instead of being hard-coded in the
//! resolver.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Generator configuration. Every field has a default, so an empty JSON
/// object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Configuration {
    /// Workspace-relative prefixes of generated files. Jars under them
    /// become unmanaged rules named after the file.
    pub generated_prefixes: Vec<String>,

    /// Workspace-relative prefixes of binary outputs. Jars under them
    /// become unmanaged rules named after the file without a `lib` prefix.
    pub binary_prefixes: Vec<String>,

    /// Prefixes of the shared third-party (Maven layout) repository.
    pub maven_prefixes: Vec<String>,

    /// Jar prefixes that are dropped without a diagnostic.
    pub ignored_jar_prefixes: Vec<String>,

    /// Module name prefixes for which dangling module references are dropped
    /// silently. Matched against the referencing module.
    pub ignored_module_prefixes: Vec<String>,

    /// Name of the IDE SDK entry that maps to [`Self::sdk_library`].
    pub sdk_name: String,

    /// Library that SDK dependencies are translated into.
    pub sdk_library: String,

    /// Package holding the unmanaged SDK rules.
    pub sdk_package: String,

    /// Shared library name prefix -> unmanaged rule name in `sdk_package`.
    pub unmanaged_libraries: BTreeMap<String, String>,

    /// Package prefixes whose rules are suppressed.
    pub suppressed_prefixes: Vec<String>,

    /// Labels of rules that are suppressed explicitly.
    pub suppressed_targets: Vec<String>,

    /// Module naming rules, applied in order; the first match wins.
    pub naming: Vec<NamingRule>,

    /// Module name -> labels added as extra unmanaged dependencies.
    pub extra_imports: BTreeMap<String, Vec<String>>,

    /// File name the emitter writes in each package.
    pub output_file: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            generated_prefixes: vec!["bazel-genfiles".to_string()],
            binary_prefixes: vec!["bazel-bin".to_string()],
            maven_prefixes: vec!["prebuilts/tools/common/m2".to_string()],
            ignored_jar_prefixes: vec![
                "tools/idea/build/dependencies/build/kotlin".to_string(),
            ],
            ignored_module_prefixes: vec![
                "intellij.platform.".to_string(),
                "intellij.java.".to_string(),
            ],
            sdk_name: "Android Studio".to_string(),
            sdk_library: "studio-sdk".to_string(),
            sdk_package: "prebuilts/studio/intellij-sdk".to_string(),
            unmanaged_libraries: BTreeMap::from([
                ("studio-sdk".to_string(), "studio-sdk".to_string()),
                ("studio-plugin".to_string(), "studio-sdk-plugin".to_string()),
                (
                    "intellij-updater".to_string(),
                    "studio-sdk-updater".to_string(),
                ),
            ]),
            suppressed_prefixes: vec!["prebuilts".to_string(), "vendor".to_string()],
            suppressed_targets: Vec::new(),
            naming: Vec::new(),
            extra_imports: BTreeMap::new(),
            output_file: "BUILD.iml.json".to_string(),
        }
    }
}

impl Configuration {
    /// Returns true if `module` is a platform module whose absence is
    /// expected.
    pub fn is_ignored_module(&self, module: &str) -> bool {
        self.ignored_module_prefixes
            .iter()
            .any(|prefix| module.starts_with(prefix.as_str()))
    }

    /// Maps a shared library to the unmanaged rule that provides it.
    ///
    /// Returns the rule name with the matched prefix replaced, e.g.
    /// `studio-plugin-foo` -> `studio-sdk-plugin-foo`.
    pub fn unmanaged_library(&self, library: &str) -> Option<String> {
        self.unmanaged_libraries.iter().find_map(|(prefix, rule)| {
            library
                .strip_prefix(prefix.as_str())
                .map(|rest| format!("{rule}{rest}"))
        })
    }
}

/// Prepends `name_prefix` to module rules placed under `path_prefix`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NamingRule {
    /// Workspace-relative directory prefix of the module.
    pub path_prefix: String,
    /// Prefix added to the rule name.
    pub name_prefix: String,
}
