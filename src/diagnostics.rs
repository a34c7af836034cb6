//! Sink for errors that are intentionally not surfaced to the user.
//!
//! Storage read/write failures and identity provider errors never interrupt
//! the journal. They are handed to a [`DiagnosticSink`] so that the failure is
//! still observable, either in the log or, in tests, in a [`RecordingSink`].

use std::{
    fmt,
    sync::{Arc, Mutex},
};

use log::warn;

use crate::DiaryError;

/// Where a swallowed failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSource {
    /// Reading or parsing persisted state.
    StorageRead,
    /// Writing persisted state.
    StorageWrite,
    /// Sign-in request to the identity provider.
    SignIn,
    /// Sign-out request to the identity provider.
    SignOut,
}

impl fmt::Display for DiagnosticSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DiagnosticSource::StorageRead => "storage read",
            DiagnosticSource::StorageWrite => "storage write",
            DiagnosticSource::SignIn => "sign-in",
            DiagnosticSource::SignOut => "sign-out",
        };
        f.write_str(label)
    }
}

/// A single swallowed failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub source: DiagnosticSource,
    pub message: String,
}

impl Diagnostic {
    pub fn new(source: DiagnosticSource, error: &DiaryError) -> Self {
        Self {
            source,
            message: error.to_string(),
        }
    }
}

/// Receives failures that callers chose not to propagate.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Shared handle to a diagnostic sink.
pub type SharedSink = Arc<dyn DiagnosticSink>;

/// Forwards every diagnostic to the `log` facade at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, diagnostic: Diagnostic) {
        warn!("{} failed: {}", diagnostic.source, diagnostic.message);
    }
}

/// Keeps every diagnostic in memory, so callers can assert on them.
#[derive(Debug, Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of everything reported so far.
    pub fn entries(&self) -> Vec<Diagnostic> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self, source: DiagnosticSource) -> usize {
        self.entries()
            .iter()
            .filter(|d| d.source == source)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, diagnostic: Diagnostic) {
        // Also log, so recorded failures still show up with RUST_LOG set.
        warn!("{} failed: {}", diagnostic.source, diagnostic.message);
        match self.entries.lock() {
            Ok(mut entries) => entries.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_counts_by_source() {
        let sink = RecordingSink::new();
        let err = DiaryError::AuthError {
            message: "popup closed".to_string(),
        };
        sink.report(Diagnostic::new(DiagnosticSource::SignIn, &err));
        sink.report(Diagnostic::new(DiagnosticSource::SignIn, &err));

        assert_eq!(sink.count(DiagnosticSource::SignIn), 2);
        assert_eq!(sink.count(DiagnosticSource::StorageRead), 0);
        assert_eq!(
            sink.entries()[0].message,
            "Authentication failed: popup closed"
        );
    }
}
