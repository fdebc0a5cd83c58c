//! End-of-run error report

use std::fmt::Write as _;
use std::sync::{Mutex, PoisonError};

/// One unit that could not be stored or deleted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReportEntry {
    /// Last error observed for the unit
    pub error: String,
    /// Ids of every record in the unit, in submission order
    pub record_ids: Vec<String>,
}

impl ErrorReportEntry {
    pub fn new(error: impl Into<String>, record_ids: Vec<String>) -> Self {
        Self {
            error: error.into(),
            record_ids,
        }
    }
}

/// Append-only collector shared by all workers
#[derive(Debug, Default)]
pub struct ErrorAggregator {
    entries: Mutex<Vec<ErrorReportEntry>>,
}

impl ErrorAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry
    pub fn record(&self, entry: ErrorReportEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    /// Snapshot of the entries in append order
    pub fn entries(&self) -> Vec<ErrorReportEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total record ids across all entries
    pub fn failed_record_count(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|e| e.record_ids.len())
            .sum()
    }

    /// Human-readable report, `None` when nothing failed
    ///
    /// Two lines per entry: the error, then the affected ids.
    pub fn render(&self) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.is_empty() {
            return None;
        }

        let mut out = String::new();
        for entry in entries.iter() {
            let _ = writeln!(out, "Error: {}", entry.error);
            let _ = writeln!(out, " Ids: [{}]", entry.record_ids.join(", "));
        }
        Some(out)
    }
}
