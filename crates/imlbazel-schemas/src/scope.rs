//! Dependency scopes and the tags they map to on emitted rules.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Build visibility/lifecycle of a dependency edge.
///
/// Derived from the extension flags on an IDE dependency element. A module
/// may depend on the same target twice with different scopes (for instance
/// COMPILE and TEST); those stay distinct edges.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Needed at compile time and bundled.
    #[default]
    Compile,
    /// Needed only to compile and run tests.
    Test,
    /// Needed only at runtime.
    Runtime,
    /// Available at compile time but not bundled.
    Provided,
    /// Needed only when running tests.
    TestRuntime,
}

impl Scope {
    /// Resolves a scope from the IDE model's extension flags.
    ///
    /// `test` + `runtime` is the combined test-runtime scope; otherwise the
    /// first flag that applies wins, defaulting to [`Scope::Compile`].
    pub fn from_flags(test: bool, runtime: bool, provided: bool) -> Self {
        match (test, runtime, provided) {
            (true, true, _) => Scope::TestRuntime,
            (true, false, _) => Scope::Test,
            (false, true, _) => Scope::Runtime,
            (false, false, true) => Scope::Provided,
            (false, false, false) => Scope::Compile,
        }
    }

    /// Returns true for scopes that only apply at runtime.
    ///
    /// Runtime edges are never exported: re-exporting them would turn a
    /// runtime-only edge into a compile-time one for dependents.
    pub fn is_runtime(self) -> bool {
        matches!(self, Scope::Runtime | Scope::TestRuntime)
    }

    /// Returns true for scopes that only apply to test code.
    pub fn is_test(self) -> bool {
        matches!(self, Scope::Test | Scope::TestRuntime)
    }

    /// Tags attached to a rule dependency with this scope.
    pub fn tags(self) -> Vec<Tag> {
        match self {
            Scope::Compile => Vec::new(),
            Scope::Test => vec![Tag::Test],
            Scope::Runtime => vec![Tag::Runtime],
            Scope::Provided => vec![Tag::Provided],
            Scope::TestRuntime => vec![Tag::Test, Tag::Runtime],
        }
    }
}

/// Tag on an emitted rule dependency.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    /// The target is another module rule.
    Module,
    /// Test-only dependency.
    Test,
    /// Runtime-only dependency.
    Runtime,
    /// Compile-only dependency that is not bundled.
    Provided,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_default_to_compile() {
        assert_eq!(Scope::from_flags(false, false, false), Scope::Compile);
    }

    #[test]
    fn test_and_runtime_combine() {
        assert_eq!(Scope::from_flags(true, true, false), Scope::TestRuntime);
        assert_eq!(Scope::from_flags(true, true, true), Scope::TestRuntime);
    }

    #[test]
    fn single_flags() {
        assert_eq!(Scope::from_flags(true, false, false), Scope::Test);
        assert_eq!(Scope::from_flags(false, true, false), Scope::Runtime);
        assert_eq!(Scope::from_flags(false, false, true), Scope::Provided);
    }

    #[test]
    fn runtime_scopes() {
        assert!(Scope::Runtime.is_runtime());
        assert!(Scope::TestRuntime.is_runtime());
        assert!(!Scope::Test.is_runtime());
        assert!(!Scope::Provided.is_runtime());
    }

    #[test]
    fn test_runtime_tags_both() {
        assert_eq!(Scope::TestRuntime.tags(), vec![Tag::Test, Tag::Runtime]);
        assert!(Scope::Compile.tags().is_empty());
    }
}
