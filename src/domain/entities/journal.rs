use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entry from the system journal (journald)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub timestamp: DateTime<Utc>,
    pub priority: u8,
    pub unit: String,
    pub identifier: String,
    pub message: String,
}

impl JournalEntry {
    /// One-line rendering used as evidence.
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "{} {}: {}",
            self.timestamp.format("%H:%M:%S"),
            self.identifier,
            self.message
        )
    }
}
