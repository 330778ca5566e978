use colored::Colorize;
use serde::Serialize;

use super::status_fmt::{colorize_severity, section_header};
use crate::application::services::ReportSynthesizer;
use crate::domain::entities::finding::{Finding, FindingKind};
use crate::domain::entities::report::DiagnosticReport;
use crate::domain::value_objects::Severity;

/// Strips ANSI/OSC escape sequences from a string to prevent terminal injection.
fn sanitize_terminal(input: &str) -> String {
    input.chars().filter(|c| *c != '\x1b').collect()
}

fn severity_badge(severity: Severity) -> String {
    let label = format!(" {severity:<5} ");
    match severity {
        Severity::Alert => format!("{}", label.on_red().white().bold()),
        Severity::Warn => format!("{}", label.on_yellow().black().bold()),
        Severity::Info => format!("{}", label.on_blue().white()),
        Severity::Healthy => format!("{}", label.on_green().black()),
    }
}

/// Machine-readable view: the report plus the same headline the terminal shows.
#[derive(Debug, Serialize)]
pub struct ReportView<'a> {
    pub summary: String,
    #[serde(flatten)]
    pub report: &'a DiagnosticReport,
}

impl<'a> ReportView<'a> {
    #[must_use]
    pub fn new(report: &'a DiagnosticReport) -> Self {
        Self {
            summary: ReportSynthesizer::headline(report),
            report,
        }
    }
}

/// Pretty JSON for downstream consumers.
///
/// # Errors
///
/// Returns an error if the report cannot be serialized.
pub fn render_json(report: &DiagnosticReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ReportView::new(report))
}

/// Terminal summary: headline, status line with counts, then each finding.
#[must_use]
pub fn render_report(report: &DiagnosticReport) -> String {
    let status = report.overall_status;
    let mut lines = vec![
        section_header(&format!("Host diagnosis ({} mode)", report.mode)),
        format!("Host: {}", sanitize_terminal(&report.host.to_string())),
        colorize_severity(status.severity, &ReportSynthesizer::headline(report)).to_string(),
    ];

    let counts = Severity::RANKED
        .iter()
        .map(|s| format!("{s} {}", report.count(*s)))
        .collect::<Vec<_>>()
        .join("  ");
    #[allow(clippy::cast_precision_loss)]
    let elapsed = report.elapsed().num_milliseconds() as f64 / 1000.0;
    lines.push(format!(
        "Status: {}   {}   ({elapsed:.1}s)",
        colorize_severity(status.severity, &status.to_string()),
        counts.dimmed()
    ));

    for finding in &report.findings {
        lines.push(String::new());
        lines.extend(finding_lines(finding));
    }
    lines.join("\n")
}

fn finding_lines(finding: &Finding) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} {}  {}",
        severity_badge(finding.severity),
        finding.severity.symbol(),
        finding.rule_id.bold(),
        sanitize_terminal(&finding.message)
    )];
    if finding.kind != FindingKind::Breach {
        lines.push(format!("  {}", finding.kind.to_string().dimmed()));
    }
    for item in &finding.evidence {
        lines.push(format!(
            "  · {}: {}",
            sanitize_terminal(&item.description),
            sanitize_terminal(&item.value).cyan()
        ));
    }
    lines
}

/// Shown instead of a report when the run never started.
#[must_use]
pub fn render_failure(error: &anyhow::Error) -> String {
    format!(
        "{} {}",
        "✖ Diagnosis could not run:".red().bold(),
        sanitize_terminal(&format!("{error:#}"))
    )
}
