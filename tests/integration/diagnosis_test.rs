#![allow(clippy::expect_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use hostcheck::application::config::{AppConfig, DiagnosticConfig};
use hostcheck::application::services::{DiagnosisError, DiagnosticOrchestrator, ReportSynthesizer};
use hostcheck::domain::entities::finding::FindingKind;
use hostcheck::domain::entities::process::{ProcessInfo, ProcessState};
use hostcheck::domain::entities::report::DiagnosticReport;
use hostcheck::domain::entities::snapshot::{probes, MetricSnapshot};
use hostcheck::domain::ports::evidence::{EvidenceError, ProcessSource};
use hostcheck::domain::ports::probe::{Probe, ProbeError};
use hostcheck::domain::ports::run_log::{RunEvent, RunLog, RunLogError};
use hostcheck::domain::value_objects::{RunMode, Severity};
use hostcheck::infrastructure::run_log::JsonLinesRunLog;
use hostcheck::presentation::cli::runtime::run_to_completion;

// --- Test doubles ---

/// Replays a captured snapshot, optionally after a delay.
struct FixtureProbe {
    name: &'static str,
    snapshot: MetricSnapshot,
    delay: Duration,
}

#[async_trait]
impl Probe for FixtureProbe {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn capture(&self) -> Result<MetricSnapshot, ProbeError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.snapshot.clone())
    }
}

struct UnavailableProbe(&'static str);

#[async_trait]
impl Probe for UnavailableProbe {
    fn name(&self) -> &'static str {
        self.0
    }

    async fn capture(&self) -> Result<MetricSnapshot, ProbeError> {
        Err(ProbeError::Unavailable("journalctl not found".into()))
    }
}

/// Storage probe whose blocking call never comes back in time, like a
/// `statvfs` on a hung network mount.
struct StuckStorage;

#[async_trait]
impl Probe for StuckStorage {
    fn name(&self) -> &'static str {
        probes::STORAGE
    }

    async fn capture(&self) -> Result<MetricSnapshot, ProbeError> {
        tokio::task::spawn_blocking(|| std::thread::sleep(Duration::from_secs(15)))
            .await
            .map_err(|e| ProbeError::Unavailable(e.to_string()))?;
        Ok(MetricSnapshot::builder(probes::STORAGE).build())
    }
}

struct ProcessTable(Vec<ProcessInfo>);

#[async_trait]
impl ProcessSource for ProcessTable {
    async fn processes(&self) -> Result<Vec<ProcessInfo>, EvidenceError> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
struct MemoryLog(Mutex<Vec<RunEvent>>);

impl RunLog for MemoryLog {
    fn record(&self, event: &RunEvent) -> Result<(), RunLogError> {
        self.0
            .lock()
            .map_err(|e| RunLogError::WriteFailed(e.to_string()))?
            .push(event.clone());
        Ok(())
    }
}

// --- Helpers ---

fn load_fixture(name: &str) -> Vec<MetricSnapshot> {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let json = std::fs::read_to_string(&path).expect("Failed to read fixture");
    serde_json::from_str(&json).expect("Failed to parse fixture")
}

fn static_name(probe: &str) -> &'static str {
    probes::DECLARED_ORDER
        .iter()
        .copied()
        .find(|p| *p == probe)
        .expect("fixture uses a declared probe")
}

fn replay(name: &str) -> Vec<Arc<dyn Probe>> {
    load_fixture(name)
        .into_iter()
        .map(|snapshot| {
            Arc::new(FixtureProbe {
                name: static_name(&snapshot.probe),
                snapshot,
                delay: Duration::ZERO,
            }) as Arc<dyn Probe>
        })
        .collect()
}

fn zombie_table() -> ProcessTable {
    let proc = |pid: u32, name: &str, state: ProcessState, cpu: f32, rss: u64| ProcessInfo {
        pid,
        ppid: 1,
        name: name.to_string(),
        state,
        cpu_percent: cpu,
        rss_mb: rss,
    };
    ProcessTable(vec![
        proc(101, "postgres", ProcessState::Sleeping, 35.0, 2048),
        proc(202, "rustc", ProcessState::Running, 98.0, 900),
        proc(303, "worker", ProcessState::Zombie, 0.0, 0),
        proc(304, "worker", ProcessState::Zombie, 0.0, 0),
        proc(305, "worker", ProcessState::Zombie, 0.0, 0),
    ])
}

fn config() -> DiagnosticConfig {
    let mut config = AppConfig::default().diagnostic_config(RunMode::Full);
    config.total_budget = Duration::from_secs(10);
    config.probe_timeout = Duration::from_secs(2);
    config
}

async fn diagnose(lineup: Vec<Arc<dyn Probe>>, source: &dyn ProcessSource) -> DiagnosticReport {
    let log = MemoryLog::default();
    DiagnosticOrchestrator::new(lineup, source, &log)
        .run_diagnosis(&config(), std::future::pending())
        .await
        .expect("diagnosis runs")
}

// --- Scenarios ---

#[tokio::test]
async fn healthy_host_reports_healthy() {
    let report = diagnose(replay("healthy_host.json"), &zombie_table()).await;

    assert!(report.findings.is_empty());
    assert_eq!(report.overall_status.severity, Severity::Healthy);
    assert!(!report.overall_status.is_interrupted());
    assert!(report.severity_counts.values().all(|c| *c == 0));
    assert!(report.ended_at >= report.started_at);
}

#[tokio::test]
async fn degraded_host_is_ranked_deterministically() {
    let report = diagnose(replay("degraded_host.json"), &zombie_table()).await;

    let order: Vec<&str> = report.findings.iter().map(|f| f.rule_id.as_str()).collect();
    assert_eq!(
        order,
        vec![
            "load_saturated",
            "memory_pressure",
            "disk_usage_alert",
            "cpu_usage_high",
            "iface_drops",
            "zombie_processes",
            "failed_units",
            "service_inactive",
        ]
    );
    assert_eq!(report.overall_status.severity, Severity::Alert);
    assert_eq!(report.count(Severity::Alert), 3);
    assert_eq!(report.count(Severity::Warn), 5);
    assert_eq!(report.count(Severity::Info), 0);
}

#[tokio::test]
async fn severity_counts_match_findings() {
    let report = diagnose(replay("degraded_host.json"), &zombie_table()).await;
    for (severity, count) in &report.severity_counts {
        let tally = report
            .findings
            .iter()
            .filter(|f| f.severity == *severity)
            .count();
        assert_eq!(*count, tally, "{severity}");
    }
    assert_eq!(
        report.severity_counts.values().sum::<usize>(),
        report.findings.len()
    );
}

#[tokio::test]
async fn breaches_carry_ranked_evidence() {
    let report = diagnose(replay("degraded_host.json"), &zombie_table()).await;

    let zombies = report
        .findings
        .iter()
        .find(|f| f.rule_id == "zombie_processes")
        .expect("zombie finding");
    assert_eq!(zombies.observed_value, Some(3.0));
    let pids: Vec<&str> = zombies.evidence.iter().map(|e| e.description.as_str()).collect();
    assert_eq!(
        pids,
        vec!["PID 303 (worker)", "PID 304 (worker)", "PID 305 (worker)"]
    );

    let cpu = report
        .findings
        .iter()
        .find(|f| f.rule_id == "cpu_usage_high")
        .expect("cpu finding");
    assert_eq!(cpu.evidence[0].description, "PID 202 (rustc)");

    let memory = report
        .findings
        .iter()
        .find(|f| f.rule_id == "memory_pressure")
        .expect("memory finding");
    assert_eq!(memory.evidence[0].description, "PID 101 (postgres)");

    let failed = report
        .findings
        .iter()
        .find(|f| f.rule_id == "failed_units")
        .expect("failed units finding");
    assert_eq!(failed.evidence[0].value, "backup.service");

    let disk = report
        .findings
        .iter()
        .find(|f| f.rule_id == "disk_usage_alert")
        .expect("disk finding");
    assert!(disk.evidence.is_empty());
}

#[tokio::test]
async fn repeated_runs_are_identical() {
    let strip = |report: DiagnosticReport| {
        report
            .findings
            .into_iter()
            .map(|f| (f.rule_id, f.probe, f.subject, f.severity, f.observed_value, f.evidence))
            .collect::<Vec<_>>()
    };
    let first = diagnose(replay("degraded_host.json"), &zombie_table()).await;
    let second = diagnose(replay("degraded_host.json"), &zombie_table()).await;
    assert_eq!(strip(first), strip(second));
}

#[tokio::test]
async fn unavailable_probe_is_one_warn_among_other_findings() {
    let mut lineup = replay("degraded_host.json");
    lineup[5] = Arc::new(UnavailableProbe(probes::SYSTEM_LOG)) as Arc<dyn Probe>;
    let report = diagnose(lineup, &zombie_table()).await;

    let unavailable: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.probe == probes::SYSTEM_LOG)
        .collect();
    assert_eq!(unavailable.len(), 1);
    assert_eq!(unavailable[0].kind, FindingKind::ProbeUnavailable);
    assert_eq!(unavailable[0].severity, Severity::Warn);
    assert_eq!(report.findings.len(), 9);
    assert_eq!(report.count(Severity::Alert), 3);
}

#[tokio::test]
async fn budget_exhaustion_skips_the_rest_of_the_list() {
    let mut lineup = replay("healthy_host.json");
    let slow_snapshot = load_fixture("healthy_host.json").remove(3);
    lineup[3] = Arc::new(FixtureProbe {
        name: probes::NETWORK,
        snapshot: slow_snapshot,
        delay: Duration::from_secs(30),
    }) as Arc<dyn Probe>;

    let mut cfg = config();
    cfg.max_parallel = 1;
    cfg.total_budget = Duration::from_millis(300);
    cfg.probe_timeout = Duration::from_secs(1);

    let log = MemoryLog::default();
    let report = DiagnosticOrchestrator::new(lineup, &zombie_table(), &log)
        .run_diagnosis(&cfg, std::future::pending())
        .await
        .expect("diagnosis runs");

    let skipped: Vec<&str> = report
        .findings
        .iter()
        .filter(|f| f.kind == FindingKind::Skipped)
        .map(|f| f.probe.as_str())
        .collect();
    assert_eq!(
        skipped,
        vec![
            probes::NETWORK,
            probes::PROCESS,
            probes::SYSTEM_LOG,
            probes::SERVICES,
            probes::SECURITY_LOG,
        ]
    );
    assert!(report
        .findings
        .iter()
        .all(|f| f.severity == Severity::Warn && f.message.contains("time budget exceeded")));

    let elapsed = report.elapsed().to_std().expect("non-negative elapsed");
    assert!(elapsed <= cfg.total_budget + cfg.probe_timeout, "{elapsed:?}");

    let events = log.0.lock().expect("lock");
    let skipped_events = events
        .iter()
        .filter(|e| matches!(e, RunEvent::ProbeSkipped { .. }))
        .count();
    assert_eq!(skipped_events, 5);
}

#[tokio::test]
async fn interrupt_returns_partial_report() {
    let mut lineup = replay("degraded_host.json");
    let slow_snapshot = load_fixture("degraded_host.json").remove(6);
    lineup[6] = Arc::new(FixtureProbe {
        name: probes::SERVICES,
        snapshot: slow_snapshot,
        delay: Duration::from_secs(30),
    }) as Arc<dyn Probe>;

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = tx.send(());
    });

    let mut cfg = config();
    cfg.probe_timeout = Duration::from_secs(20);
    let log = MemoryLog::default();
    let report = DiagnosticOrchestrator::new(lineup, &zombie_table(), &log)
        .run_diagnosis(&cfg, async {
            let _ = rx.await;
        })
        .await
        .expect("diagnosis runs");

    assert!(report.overall_status.is_interrupted());
    assert!(ReportSynthesizer::headline(&report).starts_with("Diagnosis interrupted"));
    let interrupted: Vec<&str> = report
        .findings
        .iter()
        .filter(|f| f.kind == FindingKind::Interrupted)
        .map(|f| f.probe.as_str())
        .collect();
    assert_eq!(interrupted, vec![probes::SERVICES]);
    assert!(report.findings.iter().any(|f| f.rule_id == "load_saturated"));
}

#[tokio::test]
async fn zero_budget_is_rejected_before_any_probe_runs() {
    let log = MemoryLog::default();
    let mut cfg = config();
    cfg.total_budget = Duration::ZERO;
    let result = DiagnosticOrchestrator::new(replay("healthy_host.json"), &zombie_table(), &log)
        .run_diagnosis(&cfg, std::future::pending())
        .await;

    assert_eq!(result.err(), Some(DiagnosisError::InvalidBudget));
    assert!(log.0.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn run_log_artifact_records_the_whole_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = JsonLinesRunLog::for_run(dir.path(), chrono::Utc::now());
    let report = DiagnosticOrchestrator::new(replay("degraded_host.json"), &zombie_table(), &log)
        .run_diagnosis(&config(), std::future::pending())
        .await
        .expect("diagnosis runs");

    let content = std::fs::read_to_string(log.path()).expect("read run log");
    let events: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).expect("json line"))
        .collect();

    assert_eq!(events.first().expect("first")["event"], "run_started");
    assert_eq!(events.last().expect("last")["event"], "run_finished");
    assert_eq!(events.last().expect("last")["findings"], 8);
    let completed = events
        .iter()
        .filter(|e| e["event"] == "probe_completed")
        .count();
    assert_eq!(completed, 8);
    let recorded: Vec<&str> = events
        .iter()
        .filter(|e| e["event"] == "finding_recorded")
        .map(|e| e["finding"]["rule_id"].as_str().expect("rule id"))
        .collect();
    let in_report: Vec<&str> = report.findings.iter().map(|f| f.rule_id.as_str()).collect();
    assert_eq!(recorded, in_report);

    let file_name = log
        .path()
        .file_name()
        .and_then(|n| n.to_str())
        .expect("file name");
    assert!(file_name.starts_with("hostcheck-") && file_name.ends_with("Z.jsonl"));
}

#[test]
fn stuck_blocking_probe_does_not_hold_the_process() {
    let log = MemoryLog::default();
    let table = zombie_table();
    let mut cfg = config();
    cfg.probe_timeout = Duration::from_millis(200);
    let orchestrator = DiagnosticOrchestrator::new(
        vec![Arc::new(StuckStorage) as Arc<dyn Probe>],
        &table,
        &log,
    );

    let started = std::time::Instant::now();
    let report = run_to_completion(orchestrator.run_diagnosis(&cfg, std::future::pending()))
        .expect("runtime")
        .expect("diagnosis runs");

    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].kind, FindingKind::ProbeTimeout);
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "runtime shut down after {:?}",
        started.elapsed()
    );
}
