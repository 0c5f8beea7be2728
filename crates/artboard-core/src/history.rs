//! Undo/redo history with an action log.

use serde::Serialize;
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

/// Maximum number of undo states to keep by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// What produced a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryEntryKind {
    Record,
    Undo,
    Redo,
}

/// One line of the action log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub label: String,
    pub kind: HistoryEntryKind,
    /// Unix time in milliseconds.
    pub timestamp: u64,
}

/// Linear undo history over snapshots of `T`.
///
/// `present` is the latest recorded snapshot. Recording after an undo
/// discards the redo branch.
#[derive(Debug, Clone)]
pub struct History<T> {
    past: VecDeque<(String, T)>,
    present: (String, T),
    future: Vec<(String, T)>,
    limit: usize,
    log: Vec<HistoryEntry>,
}

impl<T: Clone> History<T> {
    /// Start a history at `initial` with the default limit.
    pub fn new(initial: T) -> Self {
        Self::with_limit(initial, DEFAULT_HISTORY_LIMIT)
    }

    /// History starting at `initial`, keeping at most `limit` undo steps.
    pub fn with_limit(initial: T, limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            present: ("initial".to_string(), initial),
            future: Vec::new(),
            limit: limit.max(1),
            log: Vec::new(),
        }
    }

    /// Record a new present state.
    pub fn record(&mut self, label: impl Into<String>, state: T) {
        let label = label.into();
        let previous = std::mem::replace(&mut self.present, (label.clone(), state));
        self.past.push_back(previous);
        self.future.clear();
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        self.push_log(label, HistoryEntryKind::Record);
    }

    /// Step back. Returns the restored state.
    pub fn undo(&mut self) -> Option<&T> {
        let previous = self.past.pop_back()?;
        let current = std::mem::replace(&mut self.present, previous);
        let label = current.0.clone();
        self.future.push(current);
        self.push_log(label, HistoryEntryKind::Undo);
        Some(&self.present.1)
    }

    /// Step forward. Returns the restored state.
    pub fn redo(&mut self) -> Option<&T> {
        let next = self.future.pop()?;
        let current = std::mem::replace(&mut self.present, next);
        self.past.push_back(current);
        let label = self.present.0.clone();
        self.push_log(label, HistoryEntryKind::Redo);
        Some(&self.present.1)
    }

    /// True when there is a step to undo.
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// True when there is an undone step to redo.
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// The current state.
    pub fn present(&self) -> &T {
        &self.present.1
    }

    /// Label of the change `undo` would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.can_undo().then_some(self.present.0.as_str())
    }

    /// Label of the change `redo` would reapply.
    pub fn redo_label(&self) -> Option<&str> {
        self.future.last().map(|(label, _)| label.as_str())
    }

    /// Number of steps available to undo.
    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    /// Number of steps available to redo.
    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    /// Maximum undo depth.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Every snapshot currently held (past, present, future).
    pub fn snapshots(&self) -> impl Iterator<Item = &T> {
        self.past
            .iter()
            .chain(std::iter::once(&self.present))
            .chain(self.future.iter())
            .map(|(_, state)| state)
    }

    /// Every record, undo and redo, oldest first.
    pub fn log(&self) -> &[HistoryEntry] {
        &self.log
    }

    /// Drop past and future, keeping the present.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
        self.log.clear();
    }

    fn push_log(&mut self, label: String, kind: HistoryEntryKind) {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        self.log.push(HistoryEntry { label, kind, timestamp });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo() {
        let mut history = History::new(0);
        history.record("one", 1);
        history.record("two", 2);

        assert_eq!(history.undo(), Some(&1));
        assert_eq!(history.undo(), Some(&0));
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), Some(&1));
        assert_eq!(*history.present(), 1);
        assert!(history.can_redo());
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::new(0);
        history.record("one", 1);
        history.undo();
        assert!(history.can_redo());
        history.record("other", 5);
        assert!(!history.can_redo());
        assert_eq!(history.undo(), Some(&0));
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = History::with_limit(0, 3);
        for i in 1..=10 {
            history.record(format!("step {i}"), i);
        }
        assert_eq!(history.undo_depth(), 3);
        let mut last = None;
        while let Some(v) = history.undo() {
            last = Some(*v);
        }
        assert_eq!(last, Some(7));
    }

    #[test]
    fn test_labels_and_log() {
        let mut history = History::new("a");
        history.record("add rect", "b");
        assert_eq!(history.undo_label(), Some("add rect"));
        history.undo();
        assert_eq!(history.redo_label(), Some("add rect"));
        history.redo();

        let kinds: Vec<_> = history.log().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![HistoryEntryKind::Record, HistoryEntryKind::Undo, HistoryEntryKind::Redo]
        );
        assert!(history.log().iter().all(|e| e.label == "add rect"));
    }

    #[test]
    fn test_empty_history() {
        let mut history = History::new(());
        assert!(!history.can_undo());
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert_eq!(history.undo_label(), None);
    }
}
