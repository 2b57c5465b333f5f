// Copyright 2026 The Matrix.org Foundation C.I.C.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A linear, size-bounded list of markup snapshots with an undo cursor.

/// Result of an undo or redo.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HistoryStep {
    /// The cursor moved; this is the markup now current.
    Moved(String),
    /// Nothing further to undo or redo; nothing changed.
    BoundaryReached,
}

impl HistoryStep {
    /// True when the caller hit the end of the history and should give
    /// feedback instead of updating the field.
    pub fn is_last_action(&self) -> bool {
        matches!(self, Self::BoundaryReached)
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Moved(value) => Some(value),
            Self::BoundaryReached => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HtmlHistory {
    snapshots: Vec<String>,
    /// `None` until the first snapshot.
    cursor: Option<usize>,
    max_total_len: usize,
}

impl HtmlHistory {
    pub fn new(max_total_len: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            cursor: None,
            max_total_len,
        }
    }

    pub fn reset(&mut self, initial: impl Into<String>) {
        self.snapshots = vec![initial.into()];
        self.cursor = Some(0);
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.cursor = None;
    }

    /// Append `value` unless it equals the latest snapshot, then drop the
    /// oldest snapshots until the total size fits. The newest snapshot is
    /// always kept. Returns whether a snapshot was added.
    pub fn push(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.snapshots.last() == Some(&value) {
            return false;
        }
        self.snapshots.push(value);
        self.prune();
        self.cursor = Some(self.snapshots.len() - 1);
        tracing::trace!(
            snapshots = self.snapshots.len(),
            total_len = self.total_len(),
            "Recorded snapshot"
        );
        true
    }

    /// Discard every snapshot after the cursor.
    pub fn truncate_redo(&mut self) {
        if let Some(cursor) = self.cursor {
            if cursor + 1 < self.snapshots.len() {
                tracing::trace!(
                    dropped = self.snapshots.len() - cursor - 1,
                    "Discarding redo branch"
                );
                self.snapshots.truncate(cursor + 1);
            }
        }
    }

    pub fn undo(&mut self) -> HistoryStep {
        match self.cursor {
            Some(cursor) if cursor > 0 => {
                self.cursor = Some(cursor - 1);
                HistoryStep::Moved(self.snapshots[cursor - 1].clone())
            }
            _ => HistoryStep::BoundaryReached,
        }
    }

    pub fn redo(&mut self) -> HistoryStep {
        match self.cursor {
            Some(cursor) if cursor + 1 < self.snapshots.len() => {
                self.cursor = Some(cursor + 1);
                HistoryStep::Moved(self.snapshots[cursor + 1].clone())
            }
            _ => HistoryStep::BoundaryReached,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|cursor| cursor > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor
            .is_some_and(|cursor| cursor + 1 < self.snapshots.len())
    }

    pub fn current(&self) -> Option<&str> {
        self.cursor.map(|cursor| self.snapshots[cursor].as_str())
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn snapshots(&self) -> &[String] {
        &self.snapshots
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Combined size of all snapshots in bytes.
    pub fn total_len(&self) -> usize {
        self.snapshots.iter().map(String::len).sum()
    }

    fn prune(&mut self) {
        let mut remaining = self.total_len();
        let mut first_kept = self.snapshots.len() - 1;
        for (i, snapshot) in self.snapshots.iter().enumerate() {
            if remaining < self.max_total_len || i + 1 == self.snapshots.len() {
                first_kept = i;
                break;
            }
            remaining -= snapshot.len();
        }
        if first_kept > 0 {
            tracing::trace!(dropped = first_kept, "Pruning oldest snapshots");
            self.snapshots.drain(..first_kept);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> HtmlHistory {
        HtmlHistory::new(4096 * 50)
    }

    #[test]
    fn empty_history_reports_boundaries() {
        let mut history = history();
        assert_eq!(history.undo(), HistoryStep::BoundaryReached);
        assert_eq!(history.redo(), HistoryStep::BoundaryReached);
        assert_eq!(history.current(), None);
    }

    #[test]
    fn reset_starts_over_with_one_snapshot() {
        let mut history = history();
        history.push("a");
        history.push("b");
        history.reset("x");
        assert_eq!(history.snapshots(), ["x"]);
        assert_eq!(history.cursor(), Some(0));
    }

    #[test]
    fn duplicate_of_latest_is_ignored() {
        let mut history = history();
        assert!(history.push("a"));
        assert!(!history.push("a"));
        assert!(history.push("b"));
        assert!(history.push("a"));
        assert_eq!(history.snapshots().len(), 3);
    }

    #[test]
    fn undo_and_redo_walk_the_cursor() {
        let mut history = history();
        for value in ["a", "b", "c"] {
            history.push(value);
        }
        assert_eq!(history.undo().value(), Some("b"));
        assert_eq!(history.undo().value(), Some("a"));
        assert!(history.undo().is_last_action());
        assert_eq!(history.redo().value(), Some("b"));
        assert_eq!(history.redo().value(), Some("c"));
        assert!(history.redo().is_last_action());
    }

    #[test]
    fn oldest_snapshots_are_pruned_to_fit() {
        let mut history = HtmlHistory::new(10);
        history.push("aaaa");
        history.push("bbbb");
        assert_eq!(history.snapshots(), ["aaaa", "bbbb"]);
        history.push("cccc");
        assert_eq!(history.snapshots(), ["bbbb", "cccc"]);
        assert_eq!(history.cursor(), Some(1));
    }

    #[test]
    fn oversized_snapshot_is_still_kept() {
        let mut history = HtmlHistory::new(4);
        history.push("ab");
        history.push("0123456789");
        assert_eq!(history.snapshots(), ["0123456789"]);
        assert_eq!(history.cursor(), Some(0));
    }

    #[test]
    fn truncating_drops_the_redo_branch() {
        let mut history = history();
        for value in ["a", "b", "c"] {
            history.push(value);
        }
        history.undo();
        history.truncate_redo();
        history.push("d");
        assert_eq!(history.snapshots(), ["a", "b", "d"]);
        assert!(!history.can_redo());
        assert!(history.can_undo());
    }
}
