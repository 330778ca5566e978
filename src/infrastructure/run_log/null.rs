use crate::domain::ports::run_log::{RunEvent, RunLog, RunLogError};

/// Discards every event (`--no-log`).
pub struct NullRunLog;

impl RunLog for NullRunLog {
    fn record(&self, _event: &RunEvent) -> Result<(), RunLogError> {
        Ok(())
    }
}
