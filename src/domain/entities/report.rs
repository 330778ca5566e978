use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::finding::Finding;
use super::host::HostInfo;
use crate::domain::value_objects::{RunMode, Severity};

/// Whether the run went through its whole probe list
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Completed,
    Interrupted,
}

/// Maximum severity present, plus whether the run was cut short by an interrupt
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct OverallStatus {
    pub severity: Severity,
    pub run: RunState,
}

impl OverallStatus {
    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        matches!(self.run, RunState::Interrupted)
    }
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.run {
            RunState::Completed => write!(f, "{}", self.severity),
            RunState::Interrupted => write!(f, "INTERRUPTED ({})", self.severity),
        }
    }
}

/// Final, ordered result of a diagnostic run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    #[serde(default)]
    pub host: HostInfo,
    pub mode: RunMode,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub findings: Vec<Finding>,
    pub severity_counts: BTreeMap<Severity, usize>,
    pub overall_status: OverallStatus,
}

impl DiagnosticReport {
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.severity_counts.get(&severity).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn elapsed(&self) -> chrono::Duration {
        self.ended_at - self.started_at
    }

    #[must_use]
    pub fn with_host(mut self, host: HostInfo) -> Self {
        self.host = host;
        self
    }
}
