use crate::prediction::types::{LogEntry, LogId};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Capacity-bounded, insertion-ordered prediction log.
///
/// Every mutation clones the current snapshot, applies the change, re-sorts
/// ascending by creation time, evicts the oldest entries over capacity, and
/// swaps the `Arc` in one assignment. Readers clone the `Arc` and can never
/// observe a store mid-mutation.
pub struct LogStore {
    max_logs: usize,
    snapshot: Mutex<Arc<Vec<LogEntry>>>,
}

impl LogStore {
    pub fn new(max_logs: usize) -> Self {
        Self {
            max_logs,
            snapshot: Mutex::new(Arc::new(Vec::new())),
        }
    }

    pub fn max_logs(&self) -> usize {
        self.max_logs
    }

    pub fn snapshot(&self) -> Arc<Vec<LogEntry>> {
        Arc::clone(&self.snapshot.lock())
    }

    pub fn len(&self) -> usize {
        self.snapshot.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.lock().is_empty()
    }

    /// Appends a batch of entries, then restores ascending creation order and
    /// the capacity bound. Returns the ids evicted to respect the cap.
    pub fn insert_batch(&self, entries: Vec<LogEntry>) -> Vec<LogId> {
        self.apply(move |current| current.extend(entries))
    }

    /// Applies an arbitrary transformation (status transitions, deletions)
    /// atomically. Returns the ids of entries no longer present afterwards,
    /// including any evicted to restore the capacity bound.
    pub fn mutate<F>(&self, transform: F) -> Vec<LogId>
    where
        F: FnOnce(&mut Vec<LogEntry>),
    {
        self.apply(transform)
    }

    fn apply<F>(&self, transform: F) -> Vec<LogId>
    where
        F: FnOnce(&mut Vec<LogEntry>),
    {
        let mut guard = self.snapshot.lock();
        let before: HashSet<LogId> = guard.iter().map(|entry| entry.id).collect();

        let mut next: Vec<LogEntry> = guard.as_ref().clone();
        transform(&mut next);

        // Re-normalize so concurrent batches interleave by time, not by
        // completion order; id breaks ties deterministically.
        next.sort_by_key(|entry| (entry.created_at_ms, entry.id));
        if next.len() > self.max_logs {
            let overflow = next.len() - self.max_logs;
            next.drain(0..overflow);
        }

        let after: HashSet<LogId> = next.iter().map(|entry| entry.id).collect();
        *guard = Arc::new(next);

        before.difference(&after).copied().collect()
    }
}
