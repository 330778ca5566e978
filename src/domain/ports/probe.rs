use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::snapshot::MetricSnapshot;

#[derive(Error, Debug)]
pub enum ProbeError {
    /// The OS facility or tool the probe relies on is absent
    #[error("facility unavailable: {0}")]
    Unavailable(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
    /// The tool ran but its output could not be interpreted at all
    #[error("unexpected output: {0}")]
    Parse(String),
}

/// One category of host metrics.
///
/// Implementations must report an absent tool or unreadable OS source as
/// `ProbeError::Unavailable` rather than panicking; the orchestrator turns
/// every error into a single WARN finding and moves on.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Stable probe identity, matched against `ThresholdRule::probe`.
    fn name(&self) -> &'static str;

    /// Capture a fresh snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ProbeError` when the underlying facility is missing, a command
    /// fails, or its output cannot be interpreted at all. Timeouts are
    /// enforced by the caller.
    async fn capture(&self) -> Result<MetricSnapshot, ProbeError>;
}
