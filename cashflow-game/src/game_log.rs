//! Append-only game log, tagged with turn numbers.

use serde::{Deserialize, Serialize};

/// One recorded event line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub turn: u32,
    pub message: String,
}

/// Ordered event history for one game. Entries are never removed or edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GameLog {
    entries: Vec<LogEntry>,
}

impl GameLog {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn record(&mut self, turn: u32, message: impl Into<String>) {
        self.entries.push(LogEntry {
            turn,
            message: message.into(),
        });
    }

    /// The most recent `count` entries, oldest first.
    #[must_use]
    pub fn recent(&self, count: usize) -> &[LogEntry] {
        let start = self.entries.len().saturating_sub(count);
        &self.entries[start..]
    }

    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
