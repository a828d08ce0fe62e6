// ActionHistory - bounded record of executed actions (provenance feed)

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::action::context::ActionSource;
use crate::action::dispatcher::ActionOutcome;

/// One executed action as the history remembers it.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// The command-string form of the action
    pub action_string: String,
    pub source: ActionSource,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

/// Bounded log of executed actions, fed by the dispatcher's post-action
/// signal.
///
/// Replay sources (undo buffer, provenance playback) are skipped: those
/// executions were recorded when they first happened and must not appear
/// as new activity. Oldest entries fall off when the limit is reached.
pub struct ActionHistory {
    entries: Mutex<VecDeque<HistoryEntry>>,
    max_entries: usize,
}

impl ActionHistory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            max_entries,
        }
    }

    /// Record one dispatcher outcome. Connected to the post-action signal
    /// by the application context.
    pub fn record(&self, outcome: &ActionOutcome) {
        if matches!(
            outcome.source,
            ActionSource::UndoBuffer | ActionSource::Provenance
        ) {
            return;
        }

        let mut entries = self.entries.lock().expect("action history poisoned");
        entries.push_back(HistoryEntry {
            action_string: outcome.action.export_to_string(),
            source: outcome.source,
            success: outcome.success,
            timestamp: Utc::now(),
        });
        while entries.len() > self.max_entries {
            entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("action history poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry `index` steps from the oldest retained record.
    pub fn entry(&self, index: usize) -> Option<HistoryEntry> {
        self.entries
            .lock()
            .expect("action history poisoned")
            .get(index)
            .cloned()
    }

    /// The most recent record.
    pub fn latest(&self) -> Option<HistoryEntry> {
        self.entries
            .lock()
            .expect("action history poisoned")
            .back()
            .cloned()
    }

    pub fn clear(&self) {
        self.entries.lock().expect("action history poisoned").clear();
    }
}
