//! Error types for DOT output.

use std::backtrace::Backtrace;
use std::{fmt, io};

use camino::Utf8PathBuf;

/// Errors that can occur while writing a rendered graph.
#[derive(Debug)]
pub struct VizError {
    kind: VizErrorKind,
    backtrace: Backtrace,
}

#[derive(Debug)]
enum VizErrorKind {
    /// Writing the output file failed.
    Write { path: Utf8PathBuf, source: io::Error },
}

impl VizError {
    pub(crate) fn write(path: &camino::Utf8Path, source: io::Error) -> Self {
        Self {
            kind: VizErrorKind::Write {
                path: path.to_path_buf(),
                source,
            },
            backtrace: Backtrace::capture(),
        }
    }

    /// Returns true if writing the output failed.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, VizErrorKind::Write { .. })
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Display for VizError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            VizErrorKind::Write { path, source } => {
                writeln!(f, "failed to write {path}: {source}")?;
            }
        }
        write!(f, "{}", self.backtrace)
    }
}

impl std::error::Error for VizError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            VizErrorKind::Write { source, .. } => Some(source),
        }
    }
}
