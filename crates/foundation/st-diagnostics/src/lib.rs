//! Diagnostic accumulation for a resolution run
//!
//! The resolution core favors "accumulate and continue" over fail-fast: every
//! pass reports into a [`Monitor`] and keeps going so a single run surfaces the
//! complete set of problems. The monitor is append-only and owned by the run;
//! each entry is mirrored to `tracing` for operators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Informational trace
    Info,
    /// Something was substituted or skipped; the run can still succeed
    Warning,
    /// The run will be marked failed, but processing continues
    Error,
    /// The affected entity was abandoned entirely
    Fatal,
}

impl Severity {
    /// Whether this severity prevents the resolved graph from being handed out
    #[must_use]
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Error | Self::Fatal)
    }

    fn label(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

/// One recorded diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Stable machine-readable code, e.g. `graph::missing-reference`
    pub code: String,
    /// Entity or item the diagnostic is about
    pub subject: Option<String>,
    /// Position in the subject's metadata list, when relevant
    pub position: Option<usize>,
    /// Human-readable message (may span several lines)
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic with no subject
    pub fn new(severity: Severity, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: code.into(),
            subject: None,
            position: None,
            message: message.into(),
        }
    }

    /// Attach the entity/item this diagnostic is about
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Attach a metadata position
    #[must_use]
    pub fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.severity.label(), self.code)?;
        if let Some(subject) = &self.subject {
            write!(f, " {subject}")?;
        }
        if let Some(position) = self.position {
            write!(f, " @{position}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Overall outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Nothing above `Info` was recorded
    Success,
    /// Only warnings were recorded
    SuccessWithWarnings,
    /// At least one error or fatal diagnostic was recorded
    Failed,
}

impl RunStatus {
    /// Whether downstream consumers may use the result
    #[must_use]
    pub fn is_success(self) -> bool {
        !matches!(self, Self::Failed)
    }
}

/// Append-only diagnostic sink for one resolution run
#[derive(Debug, Clone, Default)]
pub struct Monitor {
    entries: Vec<Diagnostic>,
}

impl Monitor {
    /// Create an empty monitor
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic
    pub fn report(&mut self, diagnostic: Diagnostic) {
        let subject = diagnostic.subject.as_deref().unwrap_or("-");
        match diagnostic.severity {
            Severity::Info => {
                tracing::debug!(code = %diagnostic.code, subject, "{}", diagnostic.message);
            }
            Severity::Warning => {
                tracing::warn!(code = %diagnostic.code, subject, "{}", diagnostic.message);
            }
            Severity::Error | Severity::Fatal => {
                tracing::error!(code = %diagnostic.code, subject, "{}", diagnostic.message);
            }
        }
        self.entries.push(diagnostic);
    }

    /// Record an informational entry
    pub fn info(&mut self, code: &str, subject: impl Into<String>, message: impl Into<String>) {
        self.report(Diagnostic::new(Severity::Info, code, message).with_subject(subject));
    }

    /// Record a warning
    pub fn warn(&mut self, code: &str, subject: impl Into<String>, message: impl Into<String>) {
        self.report(Diagnostic::new(Severity::Warning, code, message).with_subject(subject));
    }

    /// Record an error
    pub fn error(&mut self, code: &str, subject: impl Into<String>, message: impl Into<String>) {
        self.report(Diagnostic::new(Severity::Error, code, message).with_subject(subject));
    }

    /// Record a fatal error
    pub fn fatal(&mut self, code: &str, subject: impl Into<String>, message: impl Into<String>) {
        self.report(Diagnostic::new(Severity::Fatal, code, message).with_subject(subject));
    }

    /// All entries in recording order
    #[must_use]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Entries with the given code
    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.entries.iter().filter(move |entry| entry.code == code)
    }

    /// Number of entries recorded so far; used as a checkpoint
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any entry recorded after `checkpoint` is an error or fatal
    #[must_use]
    pub fn has_failures_since(&self, checkpoint: usize) -> bool {
        self.entries
            .iter()
            .skip(checkpoint)
            .any(|entry| entry.severity.is_failure())
    }

    /// Whether any error or fatal entry was recorded
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.has_failures_since(0)
    }

    /// Number of warnings recorded
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.severity == Severity::Warning)
            .count()
    }

    /// Compute the run status
    #[must_use]
    pub fn status(&self, warnings_as_errors: bool) -> RunStatus {
        if self.has_failures() {
            return RunStatus::Failed;
        }
        match (self.warning_count(), warnings_as_errors) {
            (0, _) => RunStatus::Success,
            (_, true) => RunStatus::Failed,
            (_, false) => RunStatus::SuccessWithWarnings,
        }
    }

    /// Consume the monitor, returning its entries
    #[must_use]
    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}
