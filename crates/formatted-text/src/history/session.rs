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

//! The history of one editable field, with debounced recording.
//!
//! Nothing here reads the clock: every call that schedules or fires a
//! recording takes the current [`Instant`], and the host calls
//! [`HtmlInputSession::poll`] from its event loop.

use std::time::Duration;

use web_time::Instant;

use super::snapshots::{HistoryStep, HtmlHistory};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_MAX_TOTAL_LEN: usize = 4096 * 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Quiet period after the last edit before it is recorded.
    pub debounce: Duration,
    /// Budget in bytes for all retained snapshots together.
    pub max_total_len: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            max_total_len: DEFAULT_MAX_TOTAL_LEN,
        }
    }
}

impl HistoryConfig {
    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn max_total_len(mut self, max_total_len: usize) -> Self {
        self.max_total_len = max_total_len;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Active,
    TornDown,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct PendingRecord {
    value: String,
    due: Instant,
}

#[derive(Clone, Debug)]
pub struct HtmlInputSession {
    config: HistoryConfig,
    history: HtmlHistory,
    value: String,
    pending: Option<PendingRecord>,
    state: SessionState,
}

impl Default for HtmlInputSession {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl HtmlInputSession {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            config,
            history: HtmlHistory::new(config.max_total_len),
            value: String::new(),
            pending: None,
            state: SessionState::Active,
        }
    }

    /// The field's current markup.
    pub fn html(&self) -> &str {
        &self.value
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn history(&self) -> &HtmlHistory {
        &self.history
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Start over from `initial`, dropping any edit not yet recorded.
    pub fn reset(&mut self, initial: &str) {
        self.history.reset(initial);
        self.value = initial.to_owned();
        self.pending = None;
    }

    /// The user changed the field. The value is current immediately and
    /// recorded once the debounce elapses. Any redo branch is discarded.
    pub fn set_value(&mut self, value: &str, now: Instant) {
        self.history.truncate_redo();
        self.value = value.to_owned();
        self.record(value, now);
    }

    /// Schedule `value` to be recorded after the quiet period. A later call
    /// within the period replaces it.
    pub fn record(&mut self, value: &str, now: Instant) {
        if self.state == SessionState::TornDown {
            tracing::trace!("Ignoring record on a torn-down session");
            return;
        }
        self.pending = Some(PendingRecord {
            value: value.to_owned(),
            due: now + self.config.debounce,
        });
    }

    /// Record the pending value if its quiet period is over. Returns
    /// whether a snapshot was added.
    pub fn poll(&mut self, now: Instant) -> bool {
        match &self.pending {
            Some(pending) if pending.due <= now => self.flush(),
            _ => false,
        }
    }

    /// Record the pending value now, whatever the time.
    pub fn flush(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        if self.state == SessionState::TornDown {
            return false;
        }
        self.history.push(pending.value)
    }

    pub fn undo(&mut self) -> HistoryStep {
        self.flush();
        let step = self.history.undo();
        self.apply(&step);
        step
    }

    pub fn redo(&mut self) -> HistoryStep {
        self.flush();
        let step = self.history.redo();
        self.apply(&step);
        step
    }

    /// End the session. Pending and later recordings are dropped.
    pub fn teardown(&mut self) {
        self.state = SessionState::TornDown;
        self.pending = None;
    }

    fn apply(&mut self, step: &HistoryStep) {
        if let HistoryStep::Moved(value) = step {
            self.value.clone_from(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn later(start: Instant, ms: u64) -> Instant {
        start + Duration::from_millis(ms)
    }

    fn session_with(initial: &str) -> (HtmlInputSession, Instant) {
        let mut session = HtmlInputSession::default();
        session.reset(initial);
        (session, Instant::now())
    }

    #[test]
    fn edits_within_the_quiet_period_are_coalesced() {
        let (mut session, t0) = session_with("");
        session.set_value("h", t0);
        session.set_value("he", later(t0, 100));
        session.set_value("hey", later(t0, 200));
        assert!(!session.poll(later(t0, 450)));
        assert!(session.poll(later(t0, 500)));
        assert_eq!(session.history().snapshots(), ["", "hey"]);
        assert_eq!(session.html(), "hey");
    }

    #[test]
    fn value_is_current_before_it_is_recorded() {
        let (mut session, t0) = session_with("a");
        session.set_value("ab", t0);
        assert_eq!(session.html(), "ab");
        assert!(session.has_pending());
        assert_eq!(session.history().snapshots(), ["a"]);
    }

    #[test]
    fn undo_flushes_the_pending_edit_first() {
        let (mut session, t0) = session_with("a");
        session.set_value("ab", t0);
        assert_eq!(session.undo().value(), Some("a"));
        assert_eq!(session.html(), "a");
        assert_eq!(session.redo().value(), Some("ab"));
    }

    #[test]
    fn fork_after_undo_discards_the_redo_branch() {
        let (mut session, t0) = session_with("A");
        session.set_value("B", t0);
        session.flush();
        session.set_value("C", later(t0, 1000));
        session.flush();

        assert_eq!(session.undo().value(), Some("B"));
        session.set_value("D", later(t0, 2000));
        session.flush();
        assert_eq!(session.history().snapshots(), ["A", "B", "D"]);
        assert!(session.redo().is_last_action());
        assert_eq!(session.html(), "D");
    }

    #[test]
    fn boundaries_leave_the_value_alone() {
        let (mut session, _) = session_with("only");
        assert!(session.undo().is_last_action());
        assert!(session.redo().is_last_action());
        assert_eq!(session.html(), "only");
    }

    #[test]
    fn teardown_neutralises_pending_and_later_records() {
        let (mut session, t0) = session_with("a");
        session.set_value("ab", t0);
        session.teardown();
        assert!(!session.poll(later(t0, 1000)));
        session.record("abc", later(t0, 1000));
        assert!(!session.flush());
        assert_eq!(session.history().snapshots(), ["a"]);
        assert_eq!(session.state(), SessionState::TornDown);
    }

    #[test]
    fn reset_drops_pending_edits() {
        let (mut session, t0) = session_with("a");
        session.set_value("ab", t0);
        session.reset("z");
        assert!(!session.poll(later(t0, 1000)));
        assert_eq!(session.history().snapshots(), ["z"]);
        assert_eq!(session.html(), "z");
    }

    #[test]
    fn config_sets_debounce_and_budget() {
        let config = HistoryConfig::default()
            .debounce(Duration::from_millis(10))
            .max_total_len(8);
        let mut session = HtmlInputSession::new(config);
        let t0 = Instant::now();
        session.reset("");
        session.set_value("12345", t0);
        assert!(session.poll(later(t0, 10)));
        session.set_value("67890", later(t0, 20));
        assert!(session.poll(later(t0, 30)));
        assert_eq!(session.history().snapshots(), ["67890"]);
    }
}
