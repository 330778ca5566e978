use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::command;
use crate::domain::entities::JournalEntry;
use crate::domain::ports::probe::ProbeError;

const DEFAULT_SYSLOG_PRIORITY: u8 = 6;

/// `journalctl --since "<window> ago" --output json` plus `filters`. The
/// whole window is read so counts derived from it are exact.
pub(crate) async fn read_journal(
    window: Duration,
    filters: &[&str],
) -> Result<Vec<JournalEntry>, ProbeError> {
    let since = format!("{} min ago", (window.as_secs() / 60).max(1));
    let mut args = vec![
        "--since",
        since.as_str(),
        "--output",
        "json",
        "--no-pager",
        "--quiet",
    ];
    args.extend_from_slice(filters);

    let stdout = command::stdout_of("journalctl", &args).await?;
    parse_journal_output(&stdout)
}

fn field<'a>(entry: &'a HashMap<String, serde_json::Value>, key: &str) -> Option<&'a str> {
    entry.get(key).and_then(|v| v.as_str())
}

fn parse_timestamp(entry: &HashMap<String, serde_json::Value>) -> DateTime<Utc> {
    field(entry, "__REALTIME_TIMESTAMP")
        .and_then(|s| s.parse::<i64>().ok())
        .and_then(|us| {
            let nanos = u32::try_from((us % 1_000_000) * 1_000).unwrap_or(0);
            DateTime::from_timestamp(us / 1_000_000, nanos)
        })
        .unwrap_or_else(Utc::now)
}

fn parse_priority(entry: &HashMap<String, serde_json::Value>) -> u8 {
    entry
        .get("PRIORITY")
        .and_then(|v| {
            v.as_str()
                .and_then(|s| s.parse::<u8>().ok())
                .or_else(|| v.as_u64().and_then(|n| u8::try_from(n).ok()))
        })
        .unwrap_or(DEFAULT_SYSLOG_PRIORITY)
}

/// Parses `journalctl --output json` (one object per line). Lines that are
/// not JSON objects and entries without a text message are skipped.
///
/// # Errors
///
/// Returns `ProbeError::Parse` when there is output but not a single line
/// of it is a JSON object.
pub(crate) fn parse_journal_output(stdout: &str) -> Result<Vec<JournalEntry>, ProbeError> {
    let mut saw_output = false;
    let objects: Vec<HashMap<String, serde_json::Value>> = stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .inspect(|_| saw_output = true)
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect();
    if saw_output && objects.is_empty() {
        return Err(ProbeError::Parse(
            "journalctl output contains no JSON entries".to_string(),
        ));
    }

    Ok(objects
        .into_iter()
        .filter_map(|entry| {
            let message = field(&entry, "MESSAGE").unwrap_or("").to_string();
            if message.is_empty() {
                return None;
            }
            let identifier = field(&entry, "SYSLOG_IDENTIFIER")
                .or_else(|| field(&entry, "_COMM"))
                .unwrap_or("unknown")
                .to_string();
            let unit = field(&entry, "_SYSTEMD_UNIT")
                .unwrap_or(identifier.as_str())
                .to_string();
            Some(JournalEntry {
                timestamp: parse_timestamp(&entry),
                priority: parse_priority(&entry),
                unit,
                identifier,
                message,
            })
        })
        .collect())
}
