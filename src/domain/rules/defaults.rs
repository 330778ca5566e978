use super::threshold::ThresholdRule;
use crate::domain::entities::snapshot::{fields, probes};
use crate::domain::value_objects::{Comparator, Severity};

use Comparator::{GreaterThan, LessThan};

type RuleRow = (&'static str, &'static str, &'static str, Comparator, f64, Severity);

#[rustfmt::skip]
const DEFAULT_ROWS: &[RuleRow] = &[
    ("cpu_usage_high",      probes::LOAD,         fields::CPU_PERCENT,           GreaterThan, 80.0,     Severity::Warn),
    ("cpu_steal_high",      probes::LOAD,         fields::CPU_STEAL_PERCENT,     GreaterThan, 10.0,     Severity::Info),
    ("memory_pressure",     probes::MEMORY,       fields::MEM_USED_PERCENT,      GreaterThan, 85.0,     Severity::Alert),
    ("swap_in_use",         probes::MEMORY,       fields::SWAP_USED_PERCENT,     GreaterThan, 10.0,     Severity::Warn),
    ("disk_usage_warn",     probes::STORAGE,      fields::DISK_USED_PERCENT,     GreaterThan, 85.0,     Severity::Warn),
    ("disk_usage_alert",    probes::STORAGE,      fields::DISK_USED_PERCENT,     GreaterThan, 90.0,     Severity::Alert),
    ("inode_usage_warn",    probes::STORAGE,      fields::INODE_USED_PERCENT,    GreaterThan, 85.0,     Severity::Warn),
    ("connections_high",    probes::NETWORK,      fields::CONNECTIONS_TOTAL,     GreaterThan, 10_000.0, Severity::Warn),
    ("iface_errors",        probes::NETWORK,      fields::IFACE_ERRORS,          GreaterThan, 0.0,      Severity::Warn),
    ("iface_drops",         probes::NETWORK,      fields::IFACE_DROPS,           GreaterThan, 0.0,      Severity::Warn),
    ("zombie_processes",    probes::PROCESS,      fields::PROCESS_ZOMBIE,        GreaterThan, 0.0,      Severity::Warn),
    ("syslog_critical",     probes::SYSTEM_LOG,   fields::SYSLOG_CRITICAL_COUNT, GreaterThan, 0.0,      Severity::Warn),
    ("oom_killer",          probes::SYSTEM_LOG,   fields::OOM_KILL_COUNT,        GreaterThan, 0.0,      Severity::Alert),
    ("service_inactive",    probes::SERVICES,     fields::SERVICE_ACTIVE,        LessThan,    1.0,      Severity::Warn),
    ("failed_units",        probes::SERVICES,     fields::FAILED_UNIT_COUNT,     GreaterThan, 0.0,      Severity::Warn),
    ("service_port_closed", probes::SERVICES,     fields::SERVICE_PORT_OPEN,     LessThan,    1.0,      Severity::Warn),
    ("failed_auth_burst",   probes::SECURITY_LOG, fields::FAILED_AUTH_COUNT,     GreaterThan, 20.0,     Severity::Warn),
];

/// Built-in threshold rules. Every one of them can be replaced or disabled
/// from configuration by id.
#[must_use]
pub fn default_rules() -> Vec<ThresholdRule> {
    let mut rules: Vec<ThresholdRule> = DEFAULT_ROWS
        .iter()
        .map(|&(id, probe, field, cmp, threshold, severity)| {
            ThresholdRule::new(id, probe, field, cmp, threshold, severity)
        })
        .collect();
    // load1 compares against a multiple of the core count
    rules.insert(
        2,
        ThresholdRule::new(
            "load_saturated",
            probes::LOAD,
            fields::LOAD1,
            GreaterThan,
            2.0,
            Severity::Alert,
        )
        .per_core(),
    );
    rules
}
