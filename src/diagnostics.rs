//! Diagnostics emitted by the backup engine.
//!
//! The engine never logs directly; it reports to whatever sink it was built
//! with. [`TracingSink`] forwards to `tracing`, [`CapturingSink`] keeps the
//! messages in memory so callers can inspect them.

use std::sync::Mutex;
use tracing::Level;

/// Receiver for leveled engine messages
pub trait DiagnosticsSink: Send + Sync {
    /// Record a single message at the given level
    fn record(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.record(Level::INFO, message);
    }

    fn warn(&self, message: &str) {
        self.record(Level::WARN, message);
    }
}

/// Sink that forwards every message to the `tracing` subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn record(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!(target: "timemachine::backup", "{}", message),
            Level::WARN => tracing::warn!(target: "timemachine::backup", "{}", message),
            Level::INFO => tracing::info!(target: "timemachine::backup", "{}", message),
            Level::DEBUG => tracing::debug!(target: "timemachine::backup", "{}", message),
            Level::TRACE => tracing::trace!(target: "timemachine::backup", "{}", message),
        }
    }
}

/// A recorded diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

/// Sink that stores messages in memory
#[derive(Debug, Default)]
pub struct CapturingSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl CapturingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    /// Messages recorded at `level`, in order
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|d| d.level == level)
            .map(|d| d.message.clone())
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.messages_at(Level::WARN)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Diagnostic>> {
        // A poisoned buffer still holds valid entries
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DiagnosticsSink for CapturingSink {
    fn record(&self, level: Level, message: &str) {
        self.lock().push(Diagnostic {
            level,
            message: message.to_string(),
        });
    }
}
