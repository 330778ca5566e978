#![allow(clippy::expect_used)]

use hostcheck::domain::entities::finding::FindingKind;
use hostcheck::domain::entities::snapshot::{fields, probes, MetricSnapshot};
use hostcheck::domain::rules::{default_rules, evaluate, RuleSet, ThresholdRule};
use hostcheck::domain::value_objects::{Comparator, Severity};

fn load_fixture(name: &str) -> Vec<MetricSnapshot> {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let json = std::fs::read_to_string(&path).expect("Failed to read fixture");
    serde_json::from_str(&json).expect("Failed to parse fixture")
}

fn default_set() -> RuleSet {
    RuleSet::new(default_rules()).expect("default rules are valid")
}

#[test]
fn healthy_fixture_triggers_nothing() {
    let rules = default_set();
    for (idx, snapshot) in load_fixture("healthy_host.json").iter().enumerate() {
        let findings = rules.evaluate_snapshot(snapshot, idx);
        assert!(
            findings.is_empty(),
            "{} produced {findings:?}",
            snapshot.probe
        );
    }
}

#[test]
fn degraded_fixture_triggers_expected_rules() {
    let rules = default_set();
    let mut ids: Vec<(String, Option<String>, Severity)> = load_fixture("degraded_host.json")
        .iter()
        .enumerate()
        .flat_map(|(idx, s)| rules.evaluate_snapshot(s, idx))
        .map(|f| (f.rule_id, f.subject, f.severity))
        .collect();
    ids.sort();

    let mut expected = vec![
        ("cpu_usage_high".to_string(), None, Severity::Warn),
        ("disk_usage_alert".to_string(), Some("/".to_string()), Severity::Alert),
        ("failed_units".to_string(), None, Severity::Warn),
        ("iface_drops".to_string(), Some("eth0".to_string()), Severity::Warn),
        ("load_saturated".to_string(), None, Severity::Alert),
        ("memory_pressure".to_string(), None, Severity::Alert),
        ("service_inactive".to_string(), Some("cron".to_string()), Severity::Warn),
        ("zombie_processes".to_string(), None, Severity::Warn),
    ];
    expected.sort();
    assert_eq!(ids, expected);
}

#[test]
fn load_against_per_core_threshold() {
    let snapshot = MetricSnapshot::builder(probes::LOAD)
        .number(fields::LOAD1, 16.0)
        .number(fields::CPU_CORES, 4.0)
        .build();
    let findings = default_set().evaluate_snapshot(&snapshot, 0);

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].rule_id, "load_saturated");
    assert_eq!(findings[0].severity, Severity::Alert);
    assert_eq!(findings[0].observed_value, Some(16.0));
    assert_eq!(findings[0].threshold_value, Some(8.0));
}

#[test]
fn root_at_92_percent_is_one_alert() {
    let snapshot = MetricSnapshot::builder(probes::STORAGE)
        .keyed(fields::DISK_USED_PERCENT, "/", 92.0)
        .build();
    let findings = default_set().evaluate_snapshot(&snapshot, 2);

    assert_eq!(findings.len(), 1);
    let finding = &findings[0];
    assert_eq!(finding.rule_id, "disk_usage_alert");
    assert_eq!(finding.severity, Severity::Alert);
    assert_eq!(finding.subject.as_deref(), Some("/"));
    assert_eq!(finding.observed_value, Some(92.0));
    assert_eq!(finding.threshold_value, Some(90.0));
    assert_eq!(finding.probe_order, 2);
}

#[test]
fn disk_between_warn_and_alert_is_one_warn() {
    let snapshot = MetricSnapshot::builder(probes::STORAGE)
        .keyed(fields::DISK_USED_PERCENT, "/", 87.0)
        .keyed(fields::DISK_USED_PERCENT, "/home", 95.0)
        .build();
    let findings = default_set().evaluate_snapshot(&snapshot, 2);

    assert_eq!(findings.len(), 2);
    let root = findings
        .iter()
        .find(|f| f.subject.as_deref() == Some("/"))
        .expect("root finding");
    assert_eq!(root.rule_id, "disk_usage_warn");
    let home = findings
        .iter()
        .find(|f| f.subject.as_deref() == Some("/home"))
        .expect("home finding");
    assert_eq!(home.rule_id, "disk_usage_alert");
}

#[test]
fn any_value_above_threshold_yields_exactly_one_finding() {
    for (threshold, observed) in [(80.0, 80.5), (10.0, 99.0), (0.0, 1.0), (10_000.0, 10_001.0)] {
        let rule = ThresholdRule::new(
            "probe_rule",
            probes::MEMORY,
            fields::SWAP_USED_PERCENT,
            Comparator::GreaterThan,
            threshold,
            Severity::Info,
        );
        let snapshot = MetricSnapshot::builder(probes::MEMORY)
            .number(fields::SWAP_USED_PERCENT, observed)
            .build();
        let findings = evaluate(&rule, &snapshot);
        assert_eq!(findings.len(), 1, "threshold {threshold}, observed {observed}");
        assert_eq!(findings[0].severity, Severity::Info);
        assert_eq!(findings[0].observed_value, Some(observed));
        assert_eq!(findings[0].threshold_value, Some(threshold));
    }
}

#[test]
fn unreadable_metric_degrades_to_warn_and_others_still_evaluate() {
    let snapshot = MetricSnapshot::builder(probes::STORAGE)
        .keyed(fields::DISK_USED_PERCENT, "/", 93.0)
        .unreadable(fields::INODE_USED_PERCENT, Some("/"), "unexpected inode usage '??%'")
        .build();
    let findings = default_set().evaluate_snapshot(&snapshot, 2);

    assert_eq!(findings.len(), 2);
    let unreadable = findings
        .iter()
        .find(|f| f.kind == FindingKind::MetricUnreadable)
        .expect("unreadable finding");
    assert_eq!(unreadable.severity, Severity::Warn);
    assert_eq!(unreadable.rule_id, "inode_usage_warn");
    assert!(findings.iter().any(|f| f.rule_id == "disk_usage_alert"));
}

#[test]
fn inactive_service_uses_less_than() {
    let snapshot = MetricSnapshot::builder(probes::SERVICES)
        .keyed(fields::SERVICE_ACTIVE, "sshd", 1.0)
        .keyed(fields::SERVICE_ACTIVE, "cron", 0.0)
        .build();
    let findings = default_set().evaluate_snapshot(&snapshot, 6);

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].subject.as_deref(), Some("cron"));
    assert_eq!(findings[0].rule_id, "service_inactive");
}
