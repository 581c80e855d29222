//! Error types for the imlbazel-ir crate.

use std::backtrace::Backtrace;
use std::fmt;

/// Error type for IR construction.
///
/// Only structural problems end up here: a project model that cannot be
/// turned into a consistent IR. Data-quality issues (dangling references,
/// cycles) are recorded in [`imlbazel_schemas::Diagnostics`] instead.
#[derive(Debug)]
pub struct IrError {
    kind: IrErrorKind,
    backtrace: Backtrace,
}

/// Internal error variants. Not exposed publicly; use `is_xxx()` methods instead.
#[derive(Debug)]
pub(crate) enum IrErrorKind {
    /// Two modules share a name.
    DuplicateModule(String),
    /// A module has no module definition file.
    MissingModuleFile(String),
    /// Members of one collapsed unit disagree on compiler options.
    ConflictingCompilerOptions {
        unit: String,
        first: String,
        second: String,
    },
}

impl IrError {
    /// Creates an error from an error kind, capturing a backtrace.
    pub(crate) fn new(kind: IrErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
        }
    }

    pub(crate) fn duplicate_module(name: &str) -> Self {
        Self::new(IrErrorKind::DuplicateModule(name.to_string()))
    }

    pub(crate) fn missing_module_file(name: &str) -> Self {
        Self::new(IrErrorKind::MissingModuleFile(name.to_string()))
    }

    pub(crate) fn conflicting_compiler_options(
        unit: &str,
        first: &str,
        second: &str,
    ) -> Self {
        Self::new(IrErrorKind::ConflictingCompilerOptions {
            unit: unit.to_string(),
            first: first.to_string(),
            second: second.to_string(),
        })
    }

    /// Returns true if two modules share a name.
    pub fn is_duplicate_module(&self) -> bool {
        matches!(self.kind, IrErrorKind::DuplicateModule(_))
    }

    /// Returns true if a module has no module definition file.
    pub fn is_missing_module_file(&self) -> bool {
        matches!(self.kind, IrErrorKind::MissingModuleFile(_))
    }

    /// Returns true if a collapsed unit has conflicting compiler options.
    pub fn is_conflicting_compiler_options(&self) -> bool {
        matches!(self.kind, IrErrorKind::ConflictingCompilerOptions { .. })
    }

    /// Returns the backtrace captured when this error was created.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Display for IrErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrErrorKind::DuplicateModule(name) => {
                write!(f, "duplicate module name: {name}")
            }
            IrErrorKind::MissingModuleFile(name) => {
                write!(f, "module {name} has no module file")
            }
            IrErrorKind::ConflictingCompilerOptions {
                unit,
                first,
                second,
            } => {
                write!(
                    f,
                    "cannot merge modules into {unit}: conflicting compiler \
                     options \"{first}\" and \"{second}\""
                )
            }
        }
    }
}

impl fmt::Display for IrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Summary of what happened.
        writeln!(f, "{}", self.kind)?;

        // Backtrace (will be empty unless RUST_BACKTRACE is set).
        write!(f, "{}", self.backtrace)
    }
}

impl std::error::Error for IrError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_module() {
        let err = IrError::duplicate_module("core");

        assert!(err.is_duplicate_module());
        assert!(!err.is_missing_module_file());
        assert!(!err.is_conflicting_compiler_options());
        assert!(err.to_string().contains("duplicate module name: core"));
    }

    #[test]
    fn test_conflicting_compiler_options() {
        let err = IrError::conflicting_compiler_options("a_and_others", "-Xa", "-Xb");

        assert!(err.is_conflicting_compiler_options());
        let message = err.to_string();
        assert!(message.contains("a_and_others"));
        assert!(message.contains("\"-Xa\""));
    }

    #[test]
    fn test_debug_impl() {
        let err = IrError::missing_module_file("m");
        let _ = err.backtrace();
        assert!(format!("{err:?}").contains("IrError"));
    }
}
