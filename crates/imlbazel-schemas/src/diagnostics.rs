//! Run-wide tally of recoverable problems.
//!
//! Data-quality issues (dangling references, missing jars, cycles) must not
//! stop a run over a project with thousands of modules. Phases record them
//! here and carry on; the caller inspects the tally at the end and decides
//! whether the run failed.

use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{error, info, warn};

/// Severity of a recorded diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Warning,
    Error,
}

/// Counting logger shared by all phases of a run.
///
/// Every recorded message is forwarded to `tracing` and counted. Counters
/// are atomic so phases may record from rayon workers.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: AtomicUsize,
    errors: AtomicUsize,
    messages: Mutex<Vec<(Severity, String)>>,
}

/// Snapshot of the counters at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub warnings: usize,
    pub errors: usize,
}

impl Tally {
    /// Returns true if the run should exit with a failure code.
    pub fn is_failure(self, warnings_as_errors: bool) -> bool {
        self.errors > 0 || (warnings_as_errors && self.warnings > 0)
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s), {} warning(s)", self.errors, self.warnings)
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs a progress message. Not counted.
    pub fn info(&self, message: impl fmt::Display) {
        info!("{message}");
    }

    /// Records a warning.
    pub fn warning(&self, message: impl fmt::Display) {
        self.record(Severity::Warning, message.to_string());
    }

    /// Records an error.
    pub fn error(&self, message: impl fmt::Display) {
        self.record(Severity::Error, message.to_string());
    }

    /// Records a message at the given severity.
    pub fn record(&self, severity: Severity, message: String) {
        match severity {
            Severity::Warning => {
                warn!("{message}");
                self.warnings.fetch_add(1, Ordering::Relaxed);
            }
            Severity::Error => {
                error!("{message}");
                self.errors.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.messages
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((severity, message));
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.load(Ordering::Relaxed)
    }

    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn tally(&self) -> Tally {
        Tally {
            warnings: self.warning_count(),
            errors: self.error_count(),
        }
    }

    /// Returns the recorded messages in recording order.
    pub fn messages(&self) -> Vec<(Severity, String)> {
        self.messages
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_severity() {
        let diagnostics = Diagnostics::new();
        diagnostics.warning("missing jar");
        diagnostics.warning(format_args!("missing {}", "module"));
        diagnostics.error("cycle");
        diagnostics.info("not counted");

        assert_eq!(diagnostics.tally(), Tally { warnings: 2, errors: 1 });
        let messages = diagnostics.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1], (Severity::Warning, "missing module".to_string()));
    }

    #[test]
    fn failure_policy() {
        let clean = Tally::default();
        assert!(!clean.is_failure(true));

        let warned = Tally { warnings: 1, errors: 0 };
        assert!(!warned.is_failure(false));
        assert!(warned.is_failure(true));

        let failed = Tally { warnings: 0, errors: 1 };
        assert!(failed.is_failure(false));
    }

    #[test]
    fn tally_display() {
        let tally = Tally { warnings: 3, errors: 0 };
        assert_eq!(tally.to_string(), "0 error(s), 3 warning(s)");
    }
}
