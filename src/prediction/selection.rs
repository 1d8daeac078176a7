use crate::prediction::types::{Instrument, LogId, PipsSettings};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct SelectionSnapshot {
    pub instruments: Vec<Instrument>,
    pub pips: PipsSettings,
    pub focused_entry: Option<LogId>,
}

impl SelectionSnapshot {
    pub fn is_selected(&self, instrument: Instrument) -> bool {
        self.instruments.contains(&instrument)
    }
}

/// Externally-owned, continuously-updated selection cell.
///
/// The UI layer owns the writes; the engine samples it at tick-fire and
/// reconciliation time so selection changes made while a batch is in flight
/// are honored, and clears the focused entry when that entry is removed.
#[derive(Clone)]
pub struct SelectionHandle {
    inner: Arc<RwLock<SelectionSnapshot>>,
}

impl SelectionHandle {
    pub fn new(initial: SelectionSnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        self.inner.read().clone()
    }

    pub fn set_instruments(&self, instruments: Vec<Instrument>) {
        self.inner.write().instruments = instruments;
    }

    pub fn set_pips(&self, pips: PipsSettings) {
        self.inner.write().pips = pips;
    }

    pub fn focus_entry(&self, entry: Option<LogId>) {
        self.inner.write().focused_entry = entry;
    }

    /// Clears the focused entry if it is among `removed`. Returns whether a
    /// clear actually happened.
    pub fn clear_focused_if(&self, removed: &[LogId]) -> bool {
        let mut writable = self.inner.write();
        match writable.focused_entry {
            Some(focused) if removed.contains(&focused) => {
                writable.focused_entry = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for SelectionHandle {
    fn default() -> Self {
        Self::new(SelectionSnapshot::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_observe_live_updates() {
        let handle = SelectionHandle::default();
        let engine_side = handle.clone();

        handle.set_instruments(vec![Instrument::GbpUsd]);

        let sampled = engine_side.snapshot();
        assert!(sampled.is_selected(Instrument::GbpUsd));
        assert!(!sampled.is_selected(Instrument::EurUsd));
    }

    #[test]
    fn clears_focused_entry_only_when_removed() {
        let handle = SelectionHandle::default();
        handle.focus_entry(Some(7));

        assert!(!handle.clear_focused_if(&[1, 2, 3]));
        assert_eq!(handle.snapshot().focused_entry, Some(7));

        assert!(handle.clear_focused_if(&[6, 7]));
        assert_eq!(handle.snapshot().focused_entry, None);

        assert!(!handle.clear_focused_if(&[7]));
    }
}
