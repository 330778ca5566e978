use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::domain::entities::finding::Finding;
use crate::domain::entities::report::OverallStatus;
use crate::domain::value_objects::RunMode;

#[derive(Error, Debug)]
pub enum RunLogError {
    #[error("failed to write run log: {0}")]
    WriteFailed(String),
}

/// One step of a diagnostic run, in the order it happened
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    RunStarted {
        at: DateTime<Utc>,
        mode: RunMode,
        probes: Vec<String>,
    },
    ProbeCompleted {
        probe: String,
        elapsed_ms: u64,
        metrics: usize,
    },
    ProbeFailed {
        probe: String,
        reason: String,
    },
    ProbeSkipped {
        probe: String,
        reason: String,
    },
    FindingRecorded {
        finding: Finding,
    },
    RunFinished {
        at: DateTime<Utc>,
        status: OverallStatus,
        findings: usize,
    },
}

/// Sink for the persisted record of a run. Failures are reported to the
/// caller, which logs them and carries on.
pub trait RunLog: Send + Sync {
    /// Append one event.
    ///
    /// # Errors
    ///
    /// Returns `RunLogError` if the event cannot be persisted.
    fn record(&self, event: &RunEvent) -> Result<(), RunLogError>;
}
