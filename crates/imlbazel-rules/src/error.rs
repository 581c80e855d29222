//! Error types for the imlbazel-rules crate.

use std::backtrace::Backtrace;
use std::fmt;

use imlbazel_ir::IrError;

/// Error type for rule resolution and emission.
///
/// Covers the fatal category only: a project whose structure cannot be
/// mapped onto the workspace at all. Missing jars and similar data-quality
/// issues go to [`imlbazel_schemas::Diagnostics`].
#[derive(Debug)]
pub struct RulesError {
    kind: RulesErrorKind,
    backtrace: Backtrace,
}

/// Internal error variants. Not exposed publicly; use `is_xxx()` methods instead.
#[derive(Debug)]
pub(crate) enum RulesErrorKind {
    /// Building the IR failed.
    Ir(IrError),
    /// A path that must be inside the workspace is not.
    OutsideWorkspace(String),
    /// No registered package encloses a directory that needs one.
    MissingPackage { what: String, path: String },
    /// A module-level library is referenced by a module that does not own it.
    ForeignModuleLibrary { library: String, module: String },
    /// A configured label has invalid syntax.
    InvalidLabel(String),
    /// Two different jars map onto the same import rule.
    ConflictingJar { label: String, jar: String },
    /// Walking the workspace failed.
    Walk(walkdir::Error),
    /// Failed to serialize output to JSON.
    Serialization(serde_json::Error),
    /// I/O error when reading or writing files.
    Io(std::io::Error),
}

impl RulesError {
    /// Creates an error from an error kind, capturing a backtrace.
    pub(crate) fn new(kind: RulesErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
        }
    }

    pub(crate) fn outside_workspace(path: impl fmt::Display) -> Self {
        Self::new(RulesErrorKind::OutsideWorkspace(path.to_string()))
    }

    pub(crate) fn missing_package(what: impl fmt::Display, path: impl fmt::Display) -> Self {
        Self::new(RulesErrorKind::MissingPackage {
            what: what.to_string(),
            path: path.to_string(),
        })
    }

    pub(crate) fn foreign_module_library(library: &str, module: &str) -> Self {
        Self::new(RulesErrorKind::ForeignModuleLibrary {
            library: library.to_string(),
            module: module.to_string(),
        })
    }

    pub(crate) fn invalid_label(label: &str) -> Self {
        Self::new(RulesErrorKind::InvalidLabel(label.to_string()))
    }

    pub(crate) fn conflicting_jar(label: impl fmt::Display, jar: &str) -> Self {
        Self::new(RulesErrorKind::ConflictingJar {
            label: label.to_string(),
            jar: jar.to_string(),
        })
    }

    /// Returns true if building the IR failed.
    pub fn is_ir(&self) -> bool {
        matches!(self.kind, RulesErrorKind::Ir(_))
    }

    /// Returns the IR error, if this error came from IR construction.
    pub fn as_ir(&self) -> Option<&IrError> {
        match &self.kind {
            RulesErrorKind::Ir(err) => Some(err),
            _ => None,
        }
    }

    /// Returns true if a path lies outside the workspace.
    pub fn is_outside_workspace(&self) -> bool {
        matches!(self.kind, RulesErrorKind::OutsideWorkspace(_))
    }

    /// Returns true if a required package could not be found.
    pub fn is_missing_package(&self) -> bool {
        matches!(self.kind, RulesErrorKind::MissingPackage { .. })
    }

    /// Returns true if a module library is used by a module that does not
    /// own it.
    pub fn is_foreign_module_library(&self) -> bool {
        matches!(self.kind, RulesErrorKind::ForeignModuleLibrary { .. })
    }

    /// Returns true if a configured label has invalid syntax.
    pub fn is_invalid_label(&self) -> bool {
        matches!(self.kind, RulesErrorKind::InvalidLabel(_))
    }

    /// Returns true if two jars map onto the same rule.
    pub fn is_conflicting_jar(&self) -> bool {
        matches!(self.kind, RulesErrorKind::ConflictingJar { .. })
    }

    /// Returns true if this error is due to I/O failure.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, RulesErrorKind::Io(_) | RulesErrorKind::Walk(_))
    }

    /// Returns true if this error is due to serialization failure.
    pub fn is_serialization(&self) -> bool {
        matches!(self.kind, RulesErrorKind::Serialization(_))
    }

    /// Returns the backtrace captured when this error was created.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Display for RulesErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RulesErrorKind::Ir(err) => write!(f, "failed to build IR: {err}"),
            RulesErrorKind::OutsideWorkspace(path) => {
                write!(f, "{path} is outside the workspace")
            }
            RulesErrorKind::MissingPackage { what, path } => write!(
                f,
                "could not find package for {what} {path} (does it not have a BUILD file yet?)"
            ),
            RulesErrorKind::ForeignModuleLibrary { library, module } => write!(
                f,
                "module library {library} belongs to a different module than {module}"
            ),
            RulesErrorKind::InvalidLabel(label) => {
                write!(f, "invalid label: {label}")
            }
            RulesErrorKind::ConflictingJar { label, jar } => {
                write!(f, "cannot add jar {jar}: {label} already imports another jar")
            }
            RulesErrorKind::Walk(err) => {
                write!(f, "failed to walk workspace: {err}")
            }
            RulesErrorKind::Serialization(err) => {
                write!(f, "failed to serialize output: {err}")
            }
            RulesErrorKind::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl fmt::Display for RulesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Summary of what happened.
        writeln!(f, "{}", self.kind)?;

        // Backtrace (will be empty unless RUST_BACKTRACE is set).
        write!(f, "{}", self.backtrace)
    }
}

impl std::error::Error for RulesError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            RulesErrorKind::Ir(err) => Some(err),
            RulesErrorKind::Walk(err) => Some(err),
            RulesErrorKind::Serialization(err) => Some(err),
            RulesErrorKind::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IrError> for RulesError {
    fn from(err: IrError) -> Self {
        Self::new(RulesErrorKind::Ir(err))
    }
}

impl From<walkdir::Error> for RulesError {
    fn from(err: walkdir::Error) -> Self {
        Self::new(RulesErrorKind::Walk(err))
    }
}

impl From<std::io::Error> for RulesError {
    fn from(err: std::io::Error) -> Self {
        Self::new(RulesErrorKind::Io(err))
    }
}

impl From<serde_json::Error> for RulesError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(RulesErrorKind::Serialization(err))
    }
}
