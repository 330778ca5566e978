use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::severity::Severity;

/// Rule ids used for findings the orchestrator synthesizes itself.
pub const PROBE_UNAVAILABLE: &str = "probe_unavailable";
pub const PROBE_TIMEOUT: &str = "probe_timeout";
pub const BUDGET_EXCEEDED: &str = "budget_exceeded";
pub const INTERRUPTED: &str = "interrupted";

/// Why a finding exists
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// A threshold rule's condition held
    Breach,
    /// A metric a rule depends on could not be parsed
    MetricUnreadable,
    /// The probe failed or its OS facility is missing
    ProbeUnavailable,
    /// The probe ran past its own timeout
    ProbeTimeout,
    /// The run budget ran out before the probe finished or started
    Skipped,
    /// The run was interrupted before the probe finished or started
    Interrupted,
}

impl std::fmt::Display for FindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Breach => write!(f, "breach"),
            Self::MetricUnreadable => write!(f, "metric unreadable"),
            Self::ProbeUnavailable => write!(f, "probe unavailable"),
            Self::ProbeTimeout => write!(f, "probe timed out"),
            Self::Skipped => write!(f, "skipped — time budget exceeded"),
            Self::Interrupted => write!(f, "skipped — diagnosis interrupted"),
        }
    }
}

/// Supplementary context attached to a breach (a process, an interface, a log line).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub description: String,
    pub value: String,
}

impl EvidenceItem {
    #[must_use]
    pub fn new(description: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            value: value.into(),
        }
    }
}

/// Record of a rule breach or a probe-level failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub rule_id: String,
    pub probe: String,
    /// Position of the probe in the declared probe list, used for ordering.
    pub probe_order: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub kind: FindingKind,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_value: Option<f64>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub evidence: Vec<EvidenceItem>,
}

impl Finding {
    /// WARN finding for a probe that produced no snapshot.
    #[must_use]
    pub fn probe_level(
        probe: &str,
        probe_order: usize,
        kind: FindingKind,
        detail: &str,
    ) -> Self {
        let rule_id = match kind {
            FindingKind::ProbeTimeout => PROBE_TIMEOUT,
            FindingKind::Skipped => BUDGET_EXCEEDED,
            FindingKind::Interrupted => INTERRUPTED,
            FindingKind::Breach | FindingKind::MetricUnreadable | FindingKind::ProbeUnavailable => {
                PROBE_UNAVAILABLE
            }
        };
        let message = if detail.is_empty() {
            format!("{probe}: {kind}")
        } else {
            format!("{probe}: {kind} ({detail})")
        };
        Self {
            rule_id: rule_id.to_string(),
            probe: probe.to_string(),
            probe_order,
            field: None,
            subject: None,
            kind,
            severity: Severity::Warn,
            observed_value: None,
            threshold_value: None,
            message,
            timestamp: Utc::now(),
            evidence: Vec::new(),
        }
    }

    /// `field` or `field[subject]`, for display.
    #[must_use]
    pub fn target(&self) -> String {
        match (&self.field, &self.subject) {
            (Some(field), Some(subject)) => format!("{field}[{subject}]"),
            (Some(field), None) => field.clone(),
            (None, _) => self.probe.clone(),
        }
    }

    #[must_use]
    pub fn with_evidence(mut self, evidence: Vec<EvidenceItem>) -> Self {
        self.evidence = evidence;
        self
    }
}
