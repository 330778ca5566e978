use std::time::Duration;

use async_trait::async_trait;

use super::journal;
use crate::domain::entities::snapshot::{context, fields, probes, MetricSnapshot};
use crate::domain::entities::JournalEntry;
use crate::domain::ports::probe::{Probe, ProbeError};

/// syslog priority `crit`
const CRITICAL_PRIORITY: u8 = 2;
const OOM_MARKERS: &[&str] = &["out of memory", "oom-kill", "oom_reaper"];

/// Error-level journal entries and OOM-killer activity in a trailing window.
pub struct SystemLogProbe {
    window: Duration,
}

impl SystemLogProbe {
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self { window }
    }
}

#[async_trait]
impl Probe for SystemLogProbe {
    fn name(&self) -> &'static str {
        probes::SYSTEM_LOG
    }

    async fn capture(&self) -> Result<MetricSnapshot, ProbeError> {
        let entries = journal::read_journal(self.window, &["--priority", "err"]).await?;
        Ok(summarize(&entries))
    }
}

fn is_oom(entry: &JournalEntry) -> bool {
    let message = entry.message.to_lowercase();
    OOM_MARKERS.iter().any(|m| message.contains(m))
}

#[allow(clippy::cast_precision_loss)]
fn summarize(entries: &[JournalEntry]) -> MetricSnapshot {
    let critical: Vec<String> = entries
        .iter()
        .filter(|e| e.priority <= CRITICAL_PRIORITY)
        .map(JournalEntry::summary_line)
        .collect();
    let oom: Vec<String> = entries
        .iter()
        .filter(|e| is_oom(e))
        .map(JournalEntry::summary_line)
        .collect();

    MetricSnapshot::builder(probes::SYSTEM_LOG)
        .number(fields::SYSLOG_ERROR_COUNT, entries.len() as f64)
        .number(fields::SYSLOG_CRITICAL_COUNT, critical.len() as f64)
        .number(fields::OOM_KILL_COUNT, oom.len() as f64)
        .context(context::SYSLOG_CRITICAL, critical)
        .context(context::OOM_MESSAGES, oom)
        .build()
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(priority: u8, identifier: &str, message: &str) -> JournalEntry {
        JournalEntry {
            timestamp: Utc::now(),
            priority,
            unit: format!("{identifier}.service"),
            identifier: identifier.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn summarize_counts_errors_critical_and_oom() {
        let snapshot = summarize(&[
            entry(3, "nginx", "upstream timed out"),
            entry(2, "kernel", "EXT4-fs error (device sda1)"),
            entry(3, "kernel", "Out of memory: Killed process 4242 (java)"),
            entry(0, "systemd", "Caught <SEGV>, dumped core"),
        ]);
        assert_eq!(snapshot.number(fields::SYSLOG_ERROR_COUNT), Some(4.0));
        assert_eq!(snapshot.number(fields::SYSLOG_CRITICAL_COUNT), Some(2.0));
        assert_eq!(snapshot.number(fields::OOM_KILL_COUNT), Some(1.0));
        assert_eq!(snapshot.context_values(context::SYSLOG_CRITICAL).len(), 2);
        assert!(snapshot.context_values(context::OOM_MESSAGES)[0].contains("Killed process 4242"));
    }

    #[test]
    fn quiet_journal_is_all_zero() {
        let snapshot = summarize(&[]);
        assert_eq!(snapshot.number(fields::SYSLOG_ERROR_COUNT), Some(0.0));
        assert_eq!(snapshot.number(fields::OOM_KILL_COUNT), Some(0.0));
        assert!(snapshot.context.is_empty());
    }
}
