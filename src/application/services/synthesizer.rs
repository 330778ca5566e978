use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::entities::finding::Finding;
use crate::domain::entities::host::HostInfo;
use crate::domain::entities::report::{DiagnosticReport, OverallStatus, RunState};
use crate::domain::value_objects::{RunMode, Severity};

/// Pure aggregation of findings into a `DiagnosticReport`.
pub struct ReportSynthesizer;

impl ReportSynthesizer {
    /// Orders findings (severity desc, declared probe order, rule id,
    /// subject), tallies them per severity and derives the overall status.
    #[must_use]
    pub fn synthesize(
        mode: RunMode,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        mut findings: Vec<Finding>,
        run: RunState,
    ) -> DiagnosticReport {
        findings.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.probe_order.cmp(&b.probe_order))
                .then_with(|| a.rule_id.cmp(&b.rule_id))
                .then_with(|| a.subject.cmp(&b.subject))
        });

        let severity_counts = severity_counts(&findings);
        let severity = findings
            .iter()
            .map(|f| f.severity)
            .max()
            .unwrap_or(Severity::Healthy);

        DiagnosticReport {
            host: HostInfo::default(),
            mode,
            started_at,
            ended_at,
            findings,
            severity_counts,
            overall_status: OverallStatus { severity, run },
        }
    }

    /// One-line verdict shared by the terminal and JSON views.
    #[must_use]
    pub fn headline(report: &DiagnosticReport) -> String {
        let issues = report.findings.len();
        match report.overall_status.run {
            RunState::Interrupted => format!(
                "Diagnosis interrupted (partial results: {issues} issue(s))"
            ),
            RunState::Completed if issues == 0 => "Diagnosis completed: host healthy".to_string(),
            RunState::Completed => format!("Diagnosis completed with {issues} issue(s)"),
        }
    }
}

/// Every non-healthy severity gets an entry, zero included.
fn severity_counts(findings: &[Finding]) -> BTreeMap<Severity, usize> {
    let mut counts: BTreeMap<Severity, usize> =
        Severity::RANKED.iter().map(|s| (*s, 0)).collect();
    for finding in findings {
        *counts.entry(finding.severity).or_insert(0) += 1;
    }
    counts
}
