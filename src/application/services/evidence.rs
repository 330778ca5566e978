use std::time::Duration;

use crate::domain::entities::finding::{EvidenceItem, Finding, FindingKind};
use crate::domain::entities::process::ProcessInfo;
use crate::domain::entities::snapshot::{context, fields, MetricSnapshot};
use crate::domain::ports::evidence::ProcessSource;

/// Where the contributors for a breached field come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EvidenceKind {
    TopCpu,
    TopMemory,
    Zombies,
    Interface,
    Context(&'static str),
    None,
}

impl EvidenceKind {
    fn for_field(field: &str) -> Self {
        match field {
            fields::CPU_PERCENT
            | fields::CPU_STEAL_PERCENT
            | fields::LOAD1
            | fields::LOAD5
            | fields::LOAD15 => Self::TopCpu,
            fields::MEM_USED_PERCENT | fields::MEM_AVAILABLE_PERCENT | fields::SWAP_USED_PERCENT => {
                Self::TopMemory
            }
            fields::PROCESS_ZOMBIE => Self::Zombies,
            fields::IFACE_ERRORS | fields::IFACE_DROPS => Self::Interface,
            fields::FAILED_UNIT_COUNT => Self::Context(context::FAILED_UNITS),
            fields::SYSLOG_CRITICAL_COUNT => Self::Context(context::SYSLOG_CRITICAL),
            fields::OOM_KILL_COUNT => Self::Context(context::OOM_MESSAGES),
            fields::FAILED_AUTH_COUNT => Self::Context(context::FAILED_AUTH),
            fields::PRIVILEGE_ESCALATION_COUNT => Self::Context(context::PRIVILEGE_ESCALATION),
            _ => Self::None,
        }
    }

    const fn needs_processes(self) -> bool {
        matches!(self, Self::TopCpu | Self::TopMemory | Self::Zombies)
    }
}

/// Attaches ranked contributors to breach findings.
///
/// Best-effort: when the process table cannot be read the affected findings
/// keep an empty evidence list.
pub struct EvidenceCollector<'a> {
    source: &'a dyn ProcessSource,
    limit: usize,
    fetch_timeout: Duration,
}

impl<'a> EvidenceCollector<'a> {
    #[must_use]
    pub fn new(source: &'a dyn ProcessSource, limit: usize, fetch_timeout: Duration) -> Self {
        Self {
            source,
            limit,
            fetch_timeout,
        }
    }

    /// Enriches every breach in `findings`. The process table is read at
    /// most once per call.
    pub async fn enrich(
        &self,
        findings: Vec<Finding>,
        snapshots: &[MetricSnapshot],
    ) -> Vec<Finding> {
        let needs_processes = findings
            .iter()
            .filter(|f| f.kind == FindingKind::Breach)
            .filter_map(|f| f.field.as_deref())
            .any(|field| EvidenceKind::for_field(field).needs_processes());

        let processes = if needs_processes {
            self.fetch_processes().await
        } else {
            None
        };

        findings
            .into_iter()
            .map(|finding| {
                if finding.kind != FindingKind::Breach {
                    return finding;
                }
                let snapshot = snapshots.iter().find(|s| s.probe == finding.probe);
                let evidence = self.evidence_for(&finding, snapshot, processes.as_deref());
                finding.with_evidence(evidence)
            })
            .collect()
    }

    async fn fetch_processes(&self) -> Option<Vec<ProcessInfo>> {
        match tokio::time::timeout(self.fetch_timeout, self.source.processes()).await {
            Ok(Ok(mut processes)) => {
                // Exclude own process so the diagnosis never blames itself
                let own_pid = std::process::id();
                processes.retain(|p| p.pid != own_pid);
                Some(processes)
            }
            Ok(Err(e)) => {
                tracing::warn!("Evidence collection degraded: {e}");
                None
            }
            Err(_) => {
                tracing::warn!(
                    "Evidence collection degraded: process table not read within {:?}",
                    self.fetch_timeout
                );
                None
            }
        }
    }

    fn evidence_for(
        &self,
        finding: &Finding,
        snapshot: Option<&MetricSnapshot>,
        processes: Option<&[ProcessInfo]>,
    ) -> Vec<EvidenceItem> {
        let Some(field) = finding.field.as_deref() else {
            return Vec::new();
        };
        let mut items = match EvidenceKind::for_field(field) {
            EvidenceKind::TopCpu => processes.map(top_cpu).unwrap_or_default(),
            EvidenceKind::TopMemory => processes.map(top_memory).unwrap_or_default(),
            EvidenceKind::Zombies => processes.map(zombies).unwrap_or_default(),
            EvidenceKind::Interface => match (snapshot, finding.subject.as_deref()) {
                (Some(snapshot), Some(iface)) => interface_counters(snapshot, iface),
                _ => Vec::new(),
            },
            EvidenceKind::Context(key) => snapshot
                .map(|s| {
                    s.context_values(key)
                        .iter()
                        .map(|line| EvidenceItem::new(key.replace('_', " "), line.clone()))
                        .collect()
                })
                .unwrap_or_default(),
            EvidenceKind::None => Vec::new(),
        };
        items.truncate(self.limit);
        items
    }
}

fn top_cpu(processes: &[ProcessInfo]) -> Vec<EvidenceItem> {
    let mut ranked: Vec<&ProcessInfo> = processes.iter().collect();
    ranked.sort_by(|a, b| {
        b.cpu_percent
            .total_cmp(&a.cpu_percent)
            .then_with(|| a.pid.cmp(&b.pid))
    });
    ranked
        .into_iter()
        .map(|p| EvidenceItem::new(p.label(), format!("{:.1}% CPU", p.cpu_percent)))
        .collect()
}

fn top_memory(processes: &[ProcessInfo]) -> Vec<EvidenceItem> {
    let mut ranked: Vec<&ProcessInfo> = processes.iter().collect();
    ranked.sort_by(|a, b| b.rss_mb.cmp(&a.rss_mb).then_with(|| a.pid.cmp(&b.pid)));
    ranked
        .into_iter()
        .map(|p| EvidenceItem::new(p.label(), format!("{} MB RSS", p.rss_mb)))
        .collect()
}

fn zombies(processes: &[ProcessInfo]) -> Vec<EvidenceItem> {
    let mut zombies: Vec<&ProcessInfo> = processes
        .iter()
        .filter(|p| p.is_zombie())
        .collect();
    zombies.sort_by_key(|p| p.pid);
    zombies
        .into_iter()
        .map(|p| EvidenceItem::new(p.label(), format!("parent {}", p.ppid)))
        .collect()
}

/// Raw error and drop counters for one interface, errors first.
fn interface_counters(snapshot: &MetricSnapshot, iface: &str) -> Vec<EvidenceItem> {
    [(fields::IFACE_ERRORS, "errors"), (fields::IFACE_DROPS, "drops")]
        .into_iter()
        .filter_map(|(field, label)| {
            snapshot
                .number_for(field, iface)
                .map(|v| EvidenceItem::new(format!("{iface} {label}"), format!("{v:.0}")))
        })
        .collect()
}
