use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Probe identities, in declared execution order.
pub mod probes {
    pub const LOAD: &str = "load";
    pub const MEMORY: &str = "memory";
    pub const STORAGE: &str = "storage";
    pub const NETWORK: &str = "network";
    pub const PROCESS: &str = "process";
    pub const SYSTEM_LOG: &str = "system_log";
    pub const SERVICES: &str = "services";
    pub const SECURITY_LOG: &str = "security_log";

    pub const DECLARED_ORDER: [&str; 8] = [
        LOAD,
        MEMORY,
        STORAGE,
        NETWORK,
        PROCESS,
        SYSTEM_LOG,
        SERVICES,
        SECURITY_LOG,
    ];
}

/// Metric field names shared by probes, rules and the evidence collector.
pub mod fields {
    pub const LOAD1: &str = "load1";
    pub const LOAD5: &str = "load5";
    pub const LOAD15: &str = "load15";
    pub const CPU_CORES: &str = "cpu_cores";
    pub const CPU_PERCENT: &str = "cpu_percent";
    pub const CPU_STEAL_PERCENT: &str = "cpu_steal_percent";

    pub const MEM_USED_PERCENT: &str = "mem_used_percent";
    pub const MEM_AVAILABLE_PERCENT: &str = "mem_available_percent";
    pub const MEM_TOTAL_MB: &str = "mem_total_mb";
    pub const SWAP_USED_PERCENT: &str = "swap_used_percent";

    pub const DISK_USED_PERCENT: &str = "disk_used_percent";
    pub const INODE_USED_PERCENT: &str = "inode_used_percent";

    pub const CONNECTIONS_TOTAL: &str = "connections_total";
    pub const CONNECTIONS_ESTABLISHED: &str = "connections_established";
    pub const CONNECTIONS_LISTENING: &str = "connections_listening";
    pub const IFACE_ERRORS: &str = "iface_errors";
    pub const IFACE_DROPS: &str = "iface_drops";

    pub const PROCESS_TOTAL: &str = "process_total";
    pub const PROCESS_RUNNING: &str = "process_running";
    pub const PROCESS_SLEEPING: &str = "process_sleeping";
    pub const PROCESS_ZOMBIE: &str = "zombie_count";

    pub const SYSLOG_ERROR_COUNT: &str = "syslog_error_count";
    pub const SYSLOG_CRITICAL_COUNT: &str = "syslog_critical_count";
    pub const OOM_KILL_COUNT: &str = "oom_kill_count";

    pub const SERVICE_ACTIVE: &str = "service_active";
    pub const FAILED_UNIT_COUNT: &str = "failed_unit_count";
    pub const SERVICE_PORT_OPEN: &str = "service_port_open";

    pub const FAILED_AUTH_COUNT: &str = "failed_auth_count";
    pub const PRIVILEGE_ESCALATION_COUNT: &str = "privilege_escalation_count";
}

/// Fields `probe` can record, or `None` for an unknown probe.
#[must_use]
pub fn probe_fields(probe: &str) -> Option<&'static [&'static str]> {
    use fields::*;
    let known: &'static [&'static str] = match probe {
        probes::LOAD => &[LOAD1, LOAD5, LOAD15, CPU_CORES, CPU_PERCENT, CPU_STEAL_PERCENT],
        probes::MEMORY => &[
            MEM_USED_PERCENT,
            MEM_AVAILABLE_PERCENT,
            MEM_TOTAL_MB,
            SWAP_USED_PERCENT,
        ],
        probes::STORAGE => &[DISK_USED_PERCENT, INODE_USED_PERCENT],
        probes::NETWORK => &[
            CONNECTIONS_TOTAL,
            CONNECTIONS_ESTABLISHED,
            CONNECTIONS_LISTENING,
            IFACE_ERRORS,
            IFACE_DROPS,
        ],
        probes::PROCESS => &[PROCESS_TOTAL, PROCESS_RUNNING, PROCESS_SLEEPING, PROCESS_ZOMBIE],
        probes::SYSTEM_LOG => &[SYSLOG_ERROR_COUNT, SYSLOG_CRITICAL_COUNT, OOM_KILL_COUNT],
        probes::SERVICES => &[SERVICE_ACTIVE, FAILED_UNIT_COUNT, SERVICE_PORT_OPEN],
        probes::SECURITY_LOG => &[FAILED_AUTH_COUNT, PRIVILEGE_ESCALATION_COUNT],
        _ => return None,
    };
    Some(known)
}

/// Keys of [`MetricSnapshot::context`] that probes fill for the evidence collector.
pub mod context {
    pub const FAILED_UNITS: &str = "failed_units";
    pub const SYSLOG_CRITICAL: &str = "syslog_critical";
    pub const OOM_MESSAGES: &str = "oom_messages";
    pub const FAILED_AUTH: &str = "failed_auth";
    pub const PRIVILEGE_ESCALATION: &str = "privilege_escalation";
}

/// A single observed value. Probes record `Unreadable` instead of failing
/// when the OS returned something that could not be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricValue {
    Number(f64),
    Unreadable(String),
}

/// One field of a snapshot. `subject` distinguishes instances of a keyed
/// family (mount point, interface, service name).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub value: MetricValue,
}

/// Immutable output of one probe invocation. Metrics keep the order the
/// probe recorded them in, which is the order rules are evaluated in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub probe: String,
    pub captured_at: DateTime<Utc>,
    pub metrics: Vec<Metric>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, Vec<String>>,
}

impl MetricSnapshot {
    #[must_use]
    pub fn builder(probe: &str) -> SnapshotBuilder {
        SnapshotBuilder {
            probe: probe.to_string(),
            metrics: Vec::new(),
            context: BTreeMap::new(),
        }
    }

    /// First readable value of an unkeyed field.
    #[must_use]
    pub fn number(&self, field: &str) -> Option<f64> {
        self.metrics
            .iter()
            .filter(|m| m.field == field && m.subject.is_none())
            .find_map(|m| match m.value {
                MetricValue::Number(v) => Some(v),
                MetricValue::Unreadable(_) => None,
            })
    }

    /// Readable value of `field` for a given subject.
    #[must_use]
    pub fn number_for(&self, field: &str, subject: &str) -> Option<f64> {
        self.metrics
            .iter()
            .filter(|m| m.field == field && m.subject.as_deref() == Some(subject))
            .find_map(|m| match m.value {
                MetricValue::Number(v) => Some(v),
                MetricValue::Unreadable(_) => None,
            })
    }

    pub fn metrics_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Metric> + 'a {
        self.metrics.iter().filter(move |m| m.field == field)
    }

    #[must_use]
    pub fn context_values(&self, key: &str) -> &[String] {
        self.context.get(key).map_or(&[], Vec::as_slice)
    }
}

/// Accumulates metrics for a snapshot; `build` stamps the capture time.
#[derive(Debug)]
pub struct SnapshotBuilder {
    probe: String,
    metrics: Vec<Metric>,
    context: BTreeMap<String, Vec<String>>,
}

impl SnapshotBuilder {
    #[must_use]
    pub fn number(mut self, field: &str, value: f64) -> Self {
        self.metrics.push(Metric {
            field: field.to_string(),
            subject: None,
            value: MetricValue::Number(value),
        });
        self
    }

    #[must_use]
    pub fn keyed(mut self, field: &str, subject: &str, value: f64) -> Self {
        self.metrics.push(Metric {
            field: field.to_string(),
            subject: Some(subject.to_string()),
            value: MetricValue::Number(value),
        });
        self
    }

    #[must_use]
    pub fn unreadable(mut self, field: &str, subject: Option<&str>, reason: &str) -> Self {
        self.metrics.push(Metric {
            field: field.to_string(),
            subject: subject.map(str::to_string),
            value: MetricValue::Unreadable(reason.to_string()),
        });
        self
    }

    #[must_use]
    pub fn context(mut self, key: &str, values: Vec<String>) -> Self {
        if !values.is_empty() {
            self.context.insert(key.to_string(), values);
        }
        self
    }

    #[must_use]
    pub fn build(self) -> MetricSnapshot {
        MetricSnapshot {
            probe: self.probe,
            captured_at: Utc::now(),
            metrics: self.metrics,
            context: self.context,
        }
    }
}
