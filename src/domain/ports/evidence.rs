use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::process::ProcessInfo;

#[derive(Error, Debug)]
pub enum EvidenceError {
    #[error("process table unavailable: {0}")]
    ProcessTable(String),
}

/// Live process listing used to rank contributors to a breach.
#[async_trait]
pub trait ProcessSource: Send + Sync {
    /// Current process table, CPU usage sampled over a short interval.
    ///
    /// # Errors
    ///
    /// Returns `EvidenceError` if the process table cannot be read.
    async fn processes(&self) -> Result<Vec<ProcessInfo>, EvidenceError>;
}
