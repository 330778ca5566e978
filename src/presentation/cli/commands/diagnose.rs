use std::future::Future;

use crate::application::config::DiagnosticConfig;
use crate::application::services::DiagnosticOrchestrator;
use crate::domain::entities::report::DiagnosticReport;
use crate::domain::value_objects::Severity;
use crate::presentation::cli::formatters::report_fmt;

/// Exit code for scripts: warnings are not failures.
pub const EXIT_HEALTHY: u8 = 0;
pub const EXIT_ALERT: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;
pub const EXIT_INTERRUPTED: u8 = 130;

/// Runs one diagnostic pass and prints the report.
///
/// # Errors
///
/// Returns an error if the configuration is rejected before probing starts
/// or the report cannot be serialized.
pub async fn run_diagnose<F>(
    orchestrator: &DiagnosticOrchestrator<'_>,
    config: &DiagnosticConfig,
    json: bool,
    interrupt: F,
) -> anyhow::Result<DiagnosticReport>
where
    F: Future<Output = ()>,
{
    let report = orchestrator.run_diagnosis(config, interrupt).await?;

    if json {
        println!("{}", report_fmt::render_json(&report)?);
    } else {
        println!("{}", report_fmt::render_report(&report));
    }

    Ok(report)
}

#[must_use]
pub fn exit_code(report: &DiagnosticReport) -> u8 {
    if report.overall_status.is_interrupted() {
        EXIT_INTERRUPTED
    } else if report.overall_status.severity == Severity::Alert {
        EXIT_ALERT
    } else {
        EXIT_HEALTHY
    }
}
