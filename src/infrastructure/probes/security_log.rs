use std::time::Duration;

use async_trait::async_trait;

use super::journal;
use crate::domain::entities::snapshot::{context, fields, probes, MetricSnapshot};
use crate::domain::entities::JournalEntry;
use crate::domain::ports::probe::{Probe, ProbeError};

// auth (4) and authpriv (10)
const AUTH_FACILITIES: &[&str] = &["SYSLOG_FACILITY=4", "SYSLOG_FACILITY=10"];
const FAILED_AUTH_MARKERS: &[&str] = &[
    "failed password",
    "authentication failure",
    "invalid user",
    "failed publickey",
];

/// Failed logins and privilege escalations from auth logs in a trailing window.
pub struct SecurityLogProbe {
    window: Duration,
}

impl SecurityLogProbe {
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self { window }
    }
}

#[async_trait]
impl Probe for SecurityLogProbe {
    fn name(&self) -> &'static str {
        probes::SECURITY_LOG
    }

    async fn capture(&self) -> Result<MetricSnapshot, ProbeError> {
        let entries = journal::read_journal(self.window, AUTH_FACILITIES).await?;
        Ok(summarize(&entries))
    }
}

fn is_failed_auth(entry: &JournalEntry) -> bool {
    let message = entry.message.to_lowercase();
    FAILED_AUTH_MARKERS.iter().any(|m| message.contains(m))
}

/// A `sudo` command line or an `su` session being opened.
fn is_privilege_escalation(entry: &JournalEntry) -> bool {
    match entry.identifier.as_str() {
        "sudo" => entry.message.contains("COMMAND="),
        "su" => entry.message.contains("session opened"),
        _ => false,
    }
}

#[allow(clippy::cast_precision_loss)]
fn summarize(entries: &[JournalEntry]) -> MetricSnapshot {
    let failed: Vec<String> = entries
        .iter()
        .filter(|e| is_failed_auth(e))
        .map(JournalEntry::summary_line)
        .collect();
    let escalations: Vec<String> = entries
        .iter()
        .filter(|e| is_privilege_escalation(e))
        .map(JournalEntry::summary_line)
        .collect();

    MetricSnapshot::builder(probes::SECURITY_LOG)
        .number(fields::FAILED_AUTH_COUNT, failed.len() as f64)
        .number(fields::PRIVILEGE_ESCALATION_COUNT, escalations.len() as f64)
        .context(context::FAILED_AUTH, failed)
        .context(context::PRIVILEGE_ESCALATION, escalations)
        .build()
}
