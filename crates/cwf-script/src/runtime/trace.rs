//! Failure trace of traced calls.

use super::function::CallSite;
use super::value::Value;

/// One traced call that was unwound by an error.
#[derive(Debug, Clone)]
pub struct TraceEntry {
    /// The `this` value of the failed call
    pub context: Value,
    /// The arguments of the failed call
    pub args: Vec<Value>,
    /// Where the called function was declared
    pub site: CallSite,
}

/// Records traced calls as an error unwinds through them.
///
/// Entries are pushed innermost first. The recorder is drained by the
/// error reporter after every report.
#[derive(Debug, Default)]
pub struct TraceRecorder {
    entries: Vec<TraceEntry>,
}

impl TraceRecorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failed call.
    pub fn push(&mut self, entry: TraceEntry) {
        self.entries.push(entry);
    }

    /// The recorded entries, innermost first.
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Removes and returns all entries.
    pub fn take(&mut self) -> Vec<TraceEntry> {
        std::mem::take(&mut self.entries)
    }

    /// Drops entries recorded after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    /// Discards all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
