use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::{error::Elapsed, Instant};

use super::evidence::EvidenceCollector;
use super::synthesizer::ReportSynthesizer;
use crate::application::config::DiagnosticConfig;
use crate::domain::entities::finding::{Finding, FindingKind};
use crate::domain::entities::host::HostInfo;
use crate::domain::entities::report::{DiagnosticReport, RunState};
use crate::domain::entities::snapshot::MetricSnapshot;
use crate::domain::ports::evidence::ProcessSource;
use crate::domain::ports::probe::{Probe, ProbeError};
use crate::domain::ports::run_log::{RunEvent, RunLog};
use crate::domain::rules::{RuleError, RuleSet};

/// Configuration problems that stop a run before any probe starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiagnosisError {
    #[error("no probes registered")]
    NoProbes,
    #[error("total time budget must be positive")]
    InvalidBudget,
    #[error("per-probe timeout must be positive")]
    InvalidProbeTimeout,
    #[error("rule '{id}' is malformed: {reason}")]
    InvalidRule { id: String, reason: String },
    #[error("rule id '{0}' is defined more than once")]
    DuplicateRule(String),
}

impl From<RuleError> for DiagnosisError {
    fn from(err: RuleError) -> Self {
        match err {
            RuleError::Invalid { id, reason } => Self::InvalidRule { id, reason },
            RuleError::Duplicate(id) => Self::DuplicateRule(id),
        }
    }
}

/// Why scheduling stopped before every probe reported back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    BudgetExhausted,
    Interrupted,
}

/// What one probe contributed to the run.
enum ProbeOutcome {
    Captured(MetricSnapshot),
    Failed(Finding),
}

type ProbeResult = (usize, Result<Result<MetricSnapshot, ProbeError>, Elapsed>, Duration);

/// Owns one diagnostic run: schedules probes on a bounded worker pool,
/// evaluates rules, gathers evidence and hands everything to the synthesizer.
///
/// Probes report back through their task results; findings are only ever
/// assembled here.
pub struct DiagnosticOrchestrator<'a> {
    probes: Vec<Arc<dyn Probe>>,
    evidence_source: &'a dyn ProcessSource,
    run_log: &'a dyn RunLog,
    host: HostInfo,
}

impl<'a> DiagnosticOrchestrator<'a> {
    /// `probes` must be given in declared order; that order breaks ties in
    /// the final report regardless of completion order.
    #[must_use]
    pub fn new(
        probes: Vec<Arc<dyn Probe>>,
        evidence_source: &'a dyn ProcessSource,
        run_log: &'a dyn RunLog,
    ) -> Self {
        Self {
            probes,
            evidence_source,
            run_log,
            host: HostInfo::default(),
        }
    }

    /// Identity stamped on every report this orchestrator produces.
    #[must_use]
    pub fn with_host(mut self, host: HostInfo) -> Self {
        self.host = host;
        self
    }

    #[must_use]
    pub fn probe_names(&self) -> Vec<String> {
        self.probes.iter().map(|p| p.name().to_string()).collect()
    }

    /// Runs every registered probe under its own timeout and the overall
    /// budget. When `interrupt` resolves, no further probe is started and
    /// the report is finalized with what exists, flagged as interrupted.
    ///
    /// # Errors
    ///
    /// Returns `DiagnosisError` for configuration problems only; probe and
    /// rule failures become findings.
    pub async fn run_diagnosis<F>(
        &self,
        config: &DiagnosticConfig,
        interrupt: F,
    ) -> Result<DiagnosticReport, DiagnosisError>
    where
        F: Future<Output = ()>,
    {
        let rules = self.validate(config)?;

        let started_at = Utc::now();
        let start = Instant::now();
        tracing::info!(
            mode = %config.mode,
            probes = self.probes.len(),
            budget = ?config.total_budget,
            "Diagnosis started"
        );
        self.record(&RunEvent::RunStarted {
            at: started_at,
            mode: config.mode,
            probes: self.probe_names(),
        });

        let (outcomes, started, stop) = self.schedule(config, start, interrupt).await;

        let mut snapshots: Vec<(usize, MetricSnapshot)> = Vec::new();
        let mut findings: Vec<Finding> = Vec::new();
        for (idx, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Some(ProbeOutcome::Captured(snapshot)) => snapshots.push((idx, snapshot)),
                Some(ProbeOutcome::Failed(finding)) => findings.push(finding),
                None => findings.push(self.unfinished(idx, started[idx], stop)),
            }
        }

        let mut breaches: Vec<Finding> = snapshots
            .iter()
            .flat_map(|(idx, snapshot)| rules.evaluate_snapshot(snapshot, *idx))
            .collect();

        if stop != Some(StopReason::Interrupted) {
            let collector = EvidenceCollector::new(
                self.evidence_source,
                config.evidence_limit,
                config.probe_timeout,
            );
            let captured: Vec<MetricSnapshot> = snapshots.into_iter().map(|(_, s)| s).collect();
            breaches = collector.enrich(breaches, &captured).await;
        }
        findings.extend(breaches);

        let run = if stop == Some(StopReason::Interrupted) {
            RunState::Interrupted
        } else {
            RunState::Completed
        };
        let ended_at = Utc::now();
        let report =
            ReportSynthesizer::synthesize(config.mode, started_at, ended_at, findings, run)
                .with_host(self.host.clone());

        for finding in &report.findings {
            self.record(&RunEvent::FindingRecorded {
                finding: finding.clone(),
            });
        }
        self.record(&RunEvent::RunFinished {
            at: ended_at,
            status: report.overall_status,
            findings: report.findings.len(),
        });
        tracing::info!(
            status = %report.overall_status,
            findings = report.findings.len(),
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Diagnosis finished"
        );

        Ok(report)
    }

    fn validate(&self, config: &DiagnosticConfig) -> Result<RuleSet, DiagnosisError> {
        if self.probes.is_empty() {
            return Err(DiagnosisError::NoProbes);
        }
        if config.total_budget.is_zero() {
            return Err(DiagnosisError::InvalidBudget);
        }
        if config.probe_timeout.is_zero() {
            return Err(DiagnosisError::InvalidProbeTimeout);
        }
        Ok(RuleSet::new(config.rules.clone())?)
    }

    /// Runs probes at most `max_parallel` at a time until all report back,
    /// the budget runs out, or `interrupt` fires. Outstanding tasks are
    /// aborted on return, which drops (and kills) any child command.
    async fn schedule<F>(
        &self,
        config: &DiagnosticConfig,
        start: Instant,
        interrupt: F,
    ) -> (Vec<Option<ProbeOutcome>>, Vec<bool>, Option<StopReason>)
    where
        F: Future<Output = ()>,
    {
        let total = self.probes.len();
        let mut outcomes: Vec<Option<ProbeOutcome>> = (0..total).map(|_| None).collect();
        let mut started = vec![false; total];
        let mut next = 0;
        let mut set: JoinSet<ProbeResult> = JoinSet::new();

        let deadline = start.checked_add(config.total_budget);
        let budget = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(budget);
        tokio::pin!(interrupt);

        let stop = loop {
            while next < total && set.len() < config.max_parallel.max(1) {
                let probe = Arc::clone(&self.probes[next]);
                let idx = next;
                let timeout = config.probe_timeout;
                tracing::debug!(probe = probe.name(), "Probe scheduled");
                set.spawn(async move {
                    let began = Instant::now();
                    let result = tokio::time::timeout(timeout, probe.capture()).await;
                    (idx, result, began.elapsed())
                });
                started[idx] = true;
                next += 1;
            }

            if set.is_empty() {
                break None;
            }

            tokio::select! {
                biased;
                () = &mut interrupt => break Some(StopReason::Interrupted),
                () = &mut budget => break Some(StopReason::BudgetExhausted),
                joined = set.join_next() => match joined {
                    Some(Ok((idx, result, elapsed))) => {
                        outcomes[idx] = Some(self.outcome(idx, result, elapsed, config.probe_timeout));
                    }
                    Some(Err(e)) => {
                        // The probe's slot stays empty and is reported as unavailable
                        tracing::warn!("Probe task failed: {e}");
                    }
                    None => break None,
                },
            }
        };

        match stop {
            Some(StopReason::Interrupted) => tracing::warn!("Diagnosis interrupted"),
            Some(StopReason::BudgetExhausted) => tracing::warn!(
                budget = ?config.total_budget,
                "Time budget exhausted, remaining probes skipped"
            ),
            None => {}
        }
        set.abort_all();

        (outcomes, started, stop)
    }

    fn outcome(
        &self,
        idx: usize,
        result: Result<Result<MetricSnapshot, ProbeError>, Elapsed>,
        elapsed: Duration,
        timeout: Duration,
    ) -> ProbeOutcome {
        let name = self.probes[idx].name();
        match result {
            Ok(Ok(snapshot)) => {
                tracing::debug!(probe = name, metrics = snapshot.metrics.len(), "Probe completed");
                self.record(&RunEvent::ProbeCompleted {
                    probe: name.to_string(),
                    elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                    metrics: snapshot.metrics.len(),
                });
                ProbeOutcome::Captured(snapshot)
            }
            Ok(Err(e)) => {
                tracing::warn!(probe = name, "Probe unavailable: {e}");
                self.record(&RunEvent::ProbeFailed {
                    probe: name.to_string(),
                    reason: e.to_string(),
                });
                ProbeOutcome::Failed(Finding::probe_level(
                    name,
                    idx,
                    FindingKind::ProbeUnavailable,
                    &e.to_string(),
                ))
            }
            Err(_) => {
                let reason = format!("no result within {timeout:?}");
                tracing::warn!(probe = name, "Probe timed out: {reason}");
                self.record(&RunEvent::ProbeFailed {
                    probe: name.to_string(),
                    reason: reason.clone(),
                });
                ProbeOutcome::Failed(Finding::probe_level(
                    name,
                    idx,
                    FindingKind::ProbeTimeout,
                    &reason,
                ))
            }
        }
    }

    /// Finding for a probe that never produced an outcome.
    fn unfinished(&self, idx: usize, was_started: bool, stop: Option<StopReason>) -> Finding {
        let name = self.probes[idx].name();
        let (kind, detail) = match (stop, was_started) {
            (Some(StopReason::Interrupted), true) => (FindingKind::Interrupted, "cancelled while running"),
            (Some(StopReason::Interrupted), false) => (FindingKind::Interrupted, "not started"),
            (Some(StopReason::BudgetExhausted), true) => (FindingKind::Skipped, "cancelled while running"),
            (Some(StopReason::BudgetExhausted), false) => (FindingKind::Skipped, "not started"),
            (None, _) => (FindingKind::ProbeUnavailable, "probe task aborted"),
        };
        let finding = Finding::probe_level(name, idx, kind, detail);
        if kind == FindingKind::ProbeUnavailable {
            self.record(&RunEvent::ProbeFailed {
                probe: name.to_string(),
                reason: detail.to_string(),
            });
        } else {
            self.record(&RunEvent::ProbeSkipped {
                probe: name.to_string(),
                reason: finding.message.clone(),
            });
        }
        finding
    }

    fn record(&self, event: &RunEvent) {
        if let Err(e) = self.run_log.record(event) {
            tracing::warn!("Run log write failed: {e}");
        }
    }
}
