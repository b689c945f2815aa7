use crate::action::Action;
use serde::{Deserialize, Serialize};

/// One executed step: the action that was issued, whether the driver
/// reported success, and the monotonic step index. Entries are immutable
/// once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub step: usize,
    pub action: Action,
    pub success: bool,
}

/// Append-only log of executed steps, owned by the caller for the whole
/// task run. The resolver keeps no state between invocations; everything
/// it knows about the past arrives through this log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        History { entries }
    }

    /// Append an outcome; the step index is assigned monotonically.
    pub fn push(&mut self, action: Action, success: bool) {
        let step = self.entries.len();
        self.entries.push(HistoryEntry {
            step,
            action,
            success,
        });
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// The last `k` entries, oldest first.
    pub fn last_n(&self, k: usize) -> &[HistoryEntry] {
        &self.entries[self.entries.len().saturating_sub(k)..]
    }

    /// Number of trailing entries whose execution failed.
    pub fn consecutive_failures(&self) -> usize {
        self.entries.iter().rev().take_while(|e| !e.success).count()
    }

    /// Number of trailing WAIT actions, used for backoff scheduling.
    pub fn trailing_waits(&self) -> usize {
        self.entries
            .iter()
            .rev()
            .take_while(|e| matches!(e.action, Action::Wait(_)))
            .count()
    }

    /// True once the candidate's (type, locator, value) identity already
    /// occupies `window - 1` of the last `window` entries, i.e. issuing it
    /// again would be the `window`-th identical attempt.
    pub fn is_repeating(&self, candidate: &Action, window: usize) -> bool {
        if window < 2 {
            return false;
        }
        let needed = window - 1;
        let repeats = self
            .last_n(window)
            .iter()
            .filter(|e| e.action.same_effect(candidate))
            .count();
        repeats >= needed
    }

    /// How far through the goal's step sequence the run has progressed:
    /// the count of successful tap/input/swipe entries.
    pub fn completed_steps(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.success && e.action.advances_step())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Locator;

    fn tap(selector: &str) -> Action {
        Action::tap(Locator::xpath(selector), "test")
    }

    #[test]
    fn consecutive_failures_counts_trailing_run_only() {
        let mut history = History::new();
        history.push(tap("//a[1]"), false);
        history.push(tap("//a[1]"), true);
        history.push(tap("//a[2]"), false);
        history.push(tap("//a[2]"), false);
        assert_eq!(history.consecutive_failures(), 2);
    }

    #[test]
    fn last_n_clamps_to_length() {
        let mut history = History::new();
        history.push(tap("//a[1]"), true);
        assert_eq!(history.last_n(5).len(), 1);
        assert_eq!(history.last_n(0).len(), 0);
    }

    #[test]
    fn step_indices_are_monotonic() {
        let mut history = History::new();
        history.push(tap("//a[1]"), true);
        history.push(Action::wait(1000, "w"), true);
        let steps: Vec<usize> = history.entries().iter().map(|e| e.step).collect();
        assert_eq!(steps, vec![0, 1]);
    }

    #[test]
    fn two_identical_attempts_trip_the_default_window() {
        let mut history = History::new();
        let candidate = tap("//a[1]");
        history.push(tap("//a[1]"), false);
        assert!(!history.is_repeating(&candidate, 3));
        history.push(tap("//a[1]"), false);
        assert!(history.is_repeating(&candidate, 3));
        assert!(!history.is_repeating(&tap("//a[2]"), 3));
    }

    #[test]
    fn waits_do_not_advance_the_step_sequence() {
        let mut history = History::new();
        history.push(tap("//a[1]"), true);
        history.push(Action::wait(1000, "w"), true);
        history.push(Action::wait(2000, "w"), true);
        history.push(tap("//a[2]"), false);
        assert_eq!(history.completed_steps(), 1);
        assert_eq!(history.trailing_waits(), 0);
        history.push(Action::wait(1000, "w"), true);
        assert_eq!(history.trailing_waits(), 1);
    }
}
