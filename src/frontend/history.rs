//! Sent command history

use chrono::{DateTime, Local};
use std::collections::VecDeque;

/// Maximum number of entries kept
pub const HISTORY_CAPACITY: usize = 500;

/// One command line sent from the UI
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub command: String,
    pub sent_at: DateTime<Local>,
    /// Whether the write reached an open port
    pub delivered: bool,
}

impl HistoryEntry {
    /// `HH:MM:SS` timestamp for display
    pub fn time_label(&self) -> String {
        self.sent_at.format("%H:%M:%S").to_string()
    }
}

/// Bounded log of sent commands, oldest first
#[derive(Debug, Clone)]
pub struct CommandHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(HISTORY_CAPACITY)),
            capacity,
        }
    }

    /// Record a command, evicting the oldest entry when full
    pub fn push(&mut self, command: impl Into<String>, delivered: bool) {
        self.push_at(command, delivered, Local::now());
    }

    pub fn push_at(&mut self, command: impl Into<String>, delivered: bool, sent_at: DateTime<Local>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry {
            command: command.into(),
            sent_at,
            delivered,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    /// Entries, newest first
    pub fn recent(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev()
    }
}
