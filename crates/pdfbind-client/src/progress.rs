//! Workflow progress as discrete events.
//!
//! Observers subscribe to a channel and receive phase transitions and
//! per-file upload percentages, instead of polling shared state. Percent
//! values for a file never go backwards; a retried chunk reports the
//! highest value seen so far.

use std::collections::BTreeMap;

use tokio::sync::mpsc;

use crate::workflow::Phase;

/// One observable step of the merge workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    PhaseChanged(Phase),
    UploadProgress { file_name: String, percent: u8 },
}

/// Sender half handed to the workflow; drop the receiver to ignore events.
pub type EventSender = mpsc::UnboundedSender<WorkflowEvent>;

/// Receiver half for observers.
pub type EventReceiver = mpsc::UnboundedReceiver<WorkflowEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Emit an event, ignoring a closed channel; progress is advisory.
pub(crate) fn emit(events: &EventSender, event: WorkflowEvent) {
    let _ = events.send(event);
}

/// Per-file progress with monotonic percentages.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    percents: BTreeMap<String, u8>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a progress report. Returns the effective percent, which never
    /// decreases for a given file.
    pub fn record(&mut self, file_name: &str, percent: u8) -> u8 {
        let percent = percent.min(100);
        let entry = self.percents.entry(file_name.to_string()).or_insert(0);
        if percent > *entry {
            *entry = percent;
        }
        *entry
    }

    pub fn percent(&self, file_name: &str) -> u8 {
        self.percents.get(file_name).copied().unwrap_or(0)
    }

    /// Whether every tracked file reached 100.
    pub fn all_complete(&self) -> bool {
        !self.percents.is_empty() && self.percents.values().all(|&p| p == 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_monotonic() {
        let mut tracker = ProgressTracker::new();
        assert_eq!(tracker.record("a.pdf", 40), 40);
        assert_eq!(tracker.record("a.pdf", 25), 40);
        assert_eq!(tracker.record("a.pdf", 100), 100);
        assert_eq!(tracker.percent("a.pdf"), 100);
    }

    #[test]
    fn test_percent_is_clamped() {
        let mut tracker = ProgressTracker::new();
        assert_eq!(tracker.record("a.pdf", 250), 100);
    }

    #[test]
    fn test_all_complete() {
        let mut tracker = ProgressTracker::new();
        assert!(!tracker.all_complete());
        tracker.record("a.pdf", 100);
        tracker.record("b.pdf", 80);
        assert!(!tracker.all_complete());
        tracker.record("b.pdf", 100);
        assert!(tracker.all_complete());
    }
}
