//! Run journal - rolling log of command lifecycle events.
//!
//! The emission path is fire-and-forget; the journal retains a bounded
//! buffer of recent lifecycle entries (selections, starts, outcomes)
//! for retrospective queries: a status command, a diagnostics view, a
//! test asserting on run history.

use chrono::{DateTime, Utc};
use janus_types::ViewKey;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;

/// Default maximum retained entries.
const DEFAULT_CAPACITY: usize = 1000;

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JournalKind {
    /// The command was selected on screen.
    Selected,
    /// Validation passed and the body started executing.
    Started,
    /// Validation failed; the body never ran.
    ValidationFailed,
    /// The run finished.
    Finished {
        /// `true` for a normal completion.
        success: bool,
    },
}

/// One journal entry.
#[derive(Debug, Clone, Serialize)]
pub struct JournalEntry {
    /// When the entry was recorded.
    pub timestamp: DateTime<Utc>,
    /// Which command it concerns.
    pub key: ViewKey,
    /// What happened.
    pub kind: JournalKind,
    /// Entry payload (parameters, failure counts, results).
    pub detail: serde_json::Value,
}

/// Shared rolling journal. Cloning shares the buffer.
#[derive(Clone)]
pub struct Journal {
    inner: Arc<RwLock<VecDeque<JournalEntry>>>,
    capacity: usize,
}

impl Journal {
    /// Creates a journal with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a journal retaining at most `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(VecDeque::new())),
            capacity,
        }
    }

    /// Appends an entry, evicting the oldest past capacity.
    pub fn record(&self, key: &ViewKey, kind: JournalKind, detail: serde_json::Value) {
        let mut entries = self.inner.write();
        entries.push_back(JournalEntry {
            timestamp: Utc::now(),
            key: key.clone(),
            kind,
            detail,
        });
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// Returns the most recent `n` entries, oldest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<JournalEntry> {
        let entries = self.inner.read();
        let skip = entries.len().saturating_sub(n);
        entries.iter().skip(skip).cloned().collect()
    }

    /// Returns the total retained entry count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_returns_newest_entries_oldest_first() {
        let journal = Journal::new();
        let key = ViewKey::root("demo");
        journal.record(&key, JournalKind::Selected, serde_json::Value::Null);
        journal.record(&key, JournalKind::Started, serde_json::Value::Null);
        journal.record(
            &key,
            JournalKind::Finished { success: true },
            serde_json::Value::Null,
        );

        let recent = journal.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].kind, JournalKind::Started);
        assert_eq!(recent[1].kind, JournalKind::Finished { success: true });
    }

    #[test]
    fn capacity_evicts_oldest() {
        let journal = Journal::with_capacity(2);
        let key = ViewKey::root("demo");
        for _ in 0..5 {
            journal.record(&key, JournalKind::Selected, serde_json::Value::Null);
        }
        assert_eq!(journal.len(), 2);
    }
}
