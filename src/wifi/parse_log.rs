//! Per-run diagnostics sink handed to every parsing component.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.severity, self.message)
    }
}

/// Records what a parse run had to degrade on and forwards each entry to the
/// `log` facade, prefixed with the record-store path.
#[derive(Debug, Default)]
pub struct ParseLog {
    source: String,
    entries: Vec<Diagnostic>,
}

impl ParseLog {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            entries: Vec::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        self.push(Severity::Debug, message.into());
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Severity::Info, message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message.into());
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.severity == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    fn push(&mut self, severity: Severity, message: String) {
        match severity {
            Severity::Debug => log::debug!("{}: {}", self.source, message),
            Severity::Info => log::info!("{}: {}", self.source, message),
            Severity::Warning => log::warn!("{}: {}", self.source, message),
            Severity::Error => log::error!("{}: {}", self.source, message),
        }
        self.entries.push(Diagnostic { severity, message });
    }
}
