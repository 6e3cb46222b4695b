//! Per-operation step tracing.
//!
//! A [`Tracer`] is created by the caller and handed to every service
//! operation. Operations open a [`TraceSection`] per step; the section is
//! closed when dropped, logging through `tracing` and recording a
//! [`TraceEntry`]. The recorded entries can be turned into the
//! [`ResultStep`]s of a result report.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::clock::{NanoTime, SystemClock};
use super::reporter::ResultStep;

/// Exit code recorded for a step that completed.
pub const EXIT_SUCCESS: i64 = 0;

/// Exit code recorded for a step that ended with an error.
pub const EXIT_FAILURE: i64 = 1;

/// A closed trace section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub operation: String,
    pub exit_code: i64,
    pub start_nanos: i64,
    pub end_nanos: i64,
    pub info: Vec<String>,
    pub error: Option<String>,
}

/// Collector of trace sections for one caller-level operation.
pub struct Tracer {
    clock: Arc<dyn NanoTime>,
    entries: Mutex<Vec<TraceEntry>>,
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl Tracer {
    /// Create a tracer timing sections with `clock`.
    pub fn new(clock: Arc<dyn NanoTime>) -> Self {
        Self {
            clock,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Open a section for `operation`.
    pub fn begin_section(&self, operation: impl Into<String>) -> TraceSection<'_> {
        let operation = operation.into();
        tracing::debug!(operation = %operation, "Begin section");
        TraceSection {
            tracer: self,
            operation,
            start_nanos: self.clock.now_unix_nanos(),
            info: Vec::new(),
            error: None,
        }
    }

    /// Closed sections in the order they ended.
    pub fn entries(&self) -> Vec<TraceEntry> {
        self.entries.lock().clone()
    }

    /// Closed sections as result steps, timestamped at their end.
    pub fn steps(&self) -> Vec<ResultStep> {
        self.entries
            .lock()
            .iter()
            .map(|e| ResultStep {
                operation: e.operation.clone(),
                exit_code: e.exit_code,
                timestamp_nanos: e.end_nanos,
            })
            .collect()
    }

    fn record(&self, entry: TraceEntry) {
        self.entries.lock().push(entry);
    }
}

/// An open step. Closed on drop.
pub struct TraceSection<'t> {
    tracer: &'t Tracer,
    operation: String,
    start_nanos: i64,
    info: Vec<String>,
    error: Option<String>,
}

impl TraceSection<'_> {
    /// Attach an informational line.
    pub fn info(&mut self, message: impl Into<String>) -> &mut Self {
        let message = message.into();
        tracing::debug!(operation = %self.operation, "{}", message);
        self.info.push(message);
        self
    }

    /// Mark the section failed with `err`.
    pub fn with_error(&mut self, err: &dyn fmt::Display) -> &mut Self {
        self.error = Some(err.to_string());
        self
    }

    /// Close the section now.
    pub fn end(self) {}
}

impl Drop for TraceSection<'_> {
    fn drop(&mut self) {
        let end_nanos = self.tracer.clock.now_unix_nanos();
        let exit_code = if self.error.is_some() {
            EXIT_FAILURE
        } else {
            EXIT_SUCCESS
        };

        match &self.error {
            Some(err) => {
                tracing::warn!(operation = %self.operation, error = %err, "Section failed")
            }
            None => tracing::debug!(operation = %self.operation, "End section"),
        }

        self.tracer.record(TraceEntry {
            operation: std::mem::take(&mut self.operation),
            exit_code,
            start_nanos: self.start_nanos,
            end_nanos,
            info: std::mem::take(&mut self.info),
            error: self.error.take(),
        });
    }
}
