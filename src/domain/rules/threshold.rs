use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::entities::finding::{Finding, FindingKind};
use crate::domain::entities::snapshot::{fields, probe_fields, MetricSnapshot, MetricValue};
use crate::domain::value_objects::{Comparator, Severity};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("rule '{id}' is malformed: {reason}")]
    Invalid { id: String, reason: String },
    #[error("rule id '{0}' is defined more than once")]
    Duplicate(String),
}

/// How the configured threshold turns into the value compared against
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdScale {
    #[default]
    Fixed,
    /// Multiplied by the snapshot's `cpu_cores` value
    PerCore,
}

/// Named comparison of one snapshot field against a threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub id: String,
    pub probe: String,
    pub field: String,
    pub comparator: Comparator,
    pub threshold: f64,
    #[serde(default)]
    pub scale: ThresholdScale,
    pub severity: Severity,
}

impl ThresholdRule {
    #[must_use]
    pub fn new(
        id: &str,
        probe: &str,
        field: &str,
        comparator: Comparator,
        threshold: f64,
        severity: Severity,
    ) -> Self {
        Self {
            id: id.to_string(),
            probe: probe.to_string(),
            field: field.to_string(),
            comparator,
            threshold,
            scale: ThresholdScale::Fixed,
            severity,
        }
    }

    #[must_use]
    pub const fn per_core(mut self) -> Self {
        self.scale = ThresholdScale::PerCore;
        self
    }

    /// Structural checks run once at startup.
    ///
    /// # Errors
    ///
    /// Returns `RuleError::Invalid` when an identifier is empty, the probe or
    /// field is not one a probe records, the threshold is not finite, or the
    /// severity is `Healthy`.
    pub fn validate(&self) -> Result<(), RuleError> {
        let invalid = |reason: &str| RuleError::Invalid {
            id: self.id.clone(),
            reason: reason.to_string(),
        };
        if self.id.trim().is_empty() {
            return Err(invalid("empty id"));
        }
        if self.probe.trim().is_empty() {
            return Err(invalid("empty probe name"));
        }
        if self.field.trim().is_empty() {
            return Err(invalid("empty field name"));
        }
        let Some(known) = probe_fields(&self.probe) else {
            return Err(invalid(&format!("unknown probe '{}'", self.probe)));
        };
        if !known.contains(&self.field.as_str()) {
            return Err(invalid(&format!(
                "probe '{}' records no field '{}'",
                self.probe, self.field
            )));
        }
        if !self.threshold.is_finite() {
            return Err(invalid("threshold is not a finite number"));
        }
        if self.severity == Severity::Healthy {
            return Err(invalid("HEALTHY is not a finding severity"));
        }
        Ok(())
    }

    /// Resolves the effective threshold for a snapshot.
    ///
    /// # Errors
    ///
    /// Returns a reason string when a per-core threshold has no readable core count.
    pub fn resolve_threshold(&self, snapshot: &MetricSnapshot) -> Result<f64, String> {
        match self.scale {
            ThresholdScale::Fixed => Ok(self.threshold),
            ThresholdScale::PerCore => match snapshot.number(fields::CPU_CORES) {
                Some(cores) if cores > 0.0 => Ok(self.threshold * cores),
                _ => Err("core count unavailable for per-core threshold".to_string()),
            },
        }
    }

    /// Human label of the rule condition, e.g. `load1 > 2 × cores`.
    #[must_use]
    pub fn describe(&self) -> String {
        match self.scale {
            ThresholdScale::Fixed => {
                format!("{} {} {}", self.field, self.comparator, self.threshold)
            }
            ThresholdScale::PerCore => {
                format!("{} {} {} × cores", self.field, self.comparator, self.threshold)
            }
        }
    }
}

/// Evaluates one rule against one snapshot.
///
/// Yields at most one finding per metric instance (`field`, `subject`): a
/// breach when the condition holds, a WARN "metric unreadable" finding when
/// the value could not be read. Snapshots from other probes yield nothing.
#[must_use]
pub fn evaluate(rule: &ThresholdRule, snapshot: &MetricSnapshot) -> Vec<Finding> {
    if rule.probe != snapshot.probe {
        return Vec::new();
    }

    let threshold = rule.resolve_threshold(snapshot);

    snapshot
        .metrics_for(&rule.field)
        .filter_map(|metric| {
            let subject = metric.subject.as_deref();
            let observed = match &metric.value {
                MetricValue::Number(v) if v.is_finite() => *v,
                MetricValue::Number(v) => {
                    let reason = format!("non-finite value {v}");
                    return Some(unreadable(rule, snapshot, subject, &reason));
                }
                MetricValue::Unreadable(reason) => {
                    return Some(unreadable(rule, snapshot, subject, reason));
                }
            };
            let limit = match &threshold {
                Ok(limit) => *limit,
                Err(reason) => return Some(unreadable(rule, snapshot, subject, reason)),
            };
            if !rule.comparator.holds(observed, limit) {
                return None;
            }
            let target = subject.map_or_else(|| rule.field.clone(), |s| format!("{}[{s}]", rule.field));
            Some(Finding {
                rule_id: rule.id.clone(),
                probe: rule.probe.clone(),
                probe_order: 0,
                field: Some(rule.field.clone()),
                subject: metric.subject.clone(),
                kind: FindingKind::Breach,
                severity: rule.severity,
                observed_value: Some(observed),
                threshold_value: Some(limit),
                message: format!(
                    "{target} = {} {} {}",
                    trim_number(observed),
                    rule.comparator,
                    trim_number(limit)
                ),
                timestamp: Utc::now(),
                evidence: Vec::new(),
            })
        })
        .collect()
}

fn unreadable(
    rule: &ThresholdRule,
    snapshot: &MetricSnapshot,
    subject: Option<&str>,
    reason: &str,
) -> Finding {
    let target = subject.map_or_else(|| rule.field.clone(), |s| format!("{}[{s}]", rule.field));
    Finding {
        rule_id: rule.id.clone(),
        probe: snapshot.probe.clone(),
        probe_order: 0,
        field: Some(rule.field.clone()),
        subject: subject.map(str::to_string),
        kind: FindingKind::MetricUnreadable,
        severity: Severity::Warn,
        observed_value: None,
        threshold_value: None,
        message: format!("{target}: metric unreadable ({reason})"),
        timestamp: Utc::now(),
        evidence: Vec::new(),
    }
}

/// Formats a value without a trailing `.0` when it is integral.
#[must_use]
pub fn trim_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::entities::snapshot::probes;

    fn load_rule() -> ThresholdRule {
        ThresholdRule::new(
            "load_saturated",
            probes::LOAD,
            fields::LOAD1,
            Comparator::GreaterThan,
            2.0,
            Severity::Alert,
        )
        .per_core()
    }

    #[test]
    fn per_core_threshold_scales_with_cores() {
        let snap = MetricSnapshot::builder(probes::LOAD)
            .number(fields::LOAD1, 16.0)
            .number(fields::CPU_CORES, 4.0)
            .build();
        let findings = evaluate(&load_rule(), &snap);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Alert);
        assert_eq!(findings[0].observed_value, Some(16.0));
        assert_eq!(findings[0].threshold_value, Some(8.0));
        assert_eq!(findings[0].kind, FindingKind::Breach);
    }

    #[test]
    fn no_finding_below_threshold() {
        let snap = MetricSnapshot::builder(probes::LOAD)
            .number(fields::LOAD1, 7.9)
            .number(fields::CPU_CORES, 4.0)
            .build();
        assert!(evaluate(&load_rule(), &snap).is_empty());
    }

    #[test]
    fn missing_core_count_is_unreadable() {
        let snap = MetricSnapshot::builder(probes::LOAD)
            .number(fields::LOAD1, 3.0)
            .build();
        let findings = evaluate(&load_rule(), &snap);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::MetricUnreadable);
        assert_eq!(findings[0].severity, Severity::Warn);
    }

    #[test]
    fn unreadable_value_yields_warn() {
        let rule = ThresholdRule::new(
            "memory_pressure",
            probes::MEMORY,
            fields::MEM_USED_PERCENT,
            Comparator::GreaterThan,
            85.0,
            Severity::Alert,
        );
        let snap = MetricSnapshot::builder(probes::MEMORY)
            .unreadable(fields::MEM_USED_PERCENT, None, "garbage")
            .build();
        let findings = evaluate(&rule, &snap);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warn);
        assert!(findings[0].message.contains("metric unreadable"));
        assert!(findings[0].observed_value.is_none());
    }

    #[test]
    fn nan_value_is_unreadable() {
        let rule = ThresholdRule::new(
            "cpu",
            probes::LOAD,
            fields::CPU_PERCENT,
            Comparator::GreaterThan,
            80.0,
            Severity::Warn,
        );
        let snap = MetricSnapshot::builder(probes::LOAD)
            .number(fields::CPU_PERCENT, f64::NAN)
            .build();
        let findings = evaluate(&rule, &snap);
        assert_eq!(findings[0].kind, FindingKind::MetricUnreadable);
    }

    #[test]
    fn keyed_metrics_yield_one_finding_per_subject() {
        let rule = ThresholdRule::new(
            "disk",
            probes::STORAGE,
            fields::DISK_USED_PERCENT,
            Comparator::GreaterThan,
            90.0,
            Severity::Alert,
        );
        let snap = MetricSnapshot::builder(probes::STORAGE)
            .keyed(fields::DISK_USED_PERCENT, "/", 92.0)
            .keyed(fields::DISK_USED_PERCENT, "/var", 95.0)
            .keyed(fields::DISK_USED_PERCENT, "/home", 10.0)
            .build();
        let findings = evaluate(&rule, &snap);
        let subjects: Vec<_> = findings.iter().filter_map(|f| f.subject.as_deref()).collect();
        assert_eq!(subjects, vec!["/", "/var"]);
        assert_eq!(findings[0].message, "disk_used_percent[/] = 92 > 90");
    }

    #[test]
    fn other_probe_snapshot_is_ignored() {
        let snap = MetricSnapshot::builder(probes::MEMORY)
            .number(fields::LOAD1, 100.0)
            .build();
        assert!(evaluate(&load_rule(), &snap).is_empty());
    }

    #[test]
    fn validate_rejects_malformed_rules() {
        let mut rule = load_rule();
        rule.threshold = f64::INFINITY;
        assert!(rule.validate().is_err());

        let mut rule = load_rule();
        rule.severity = Severity::Healthy;
        assert!(rule.validate().is_err());

        let mut rule = load_rule();
        rule.field = " ".into();
        assert!(matches!(rule.validate(), Err(RuleError::Invalid { .. })));

        assert!(load_rule().validate().is_ok());
    }

    #[test]
    fn validate_rejects_unknown_probe_and_field() {
        let mut rule = load_rule();
        rule.probe = "memroy".into();
        let err = rule.validate().expect_err("unknown probe");
        assert_eq!(
            err,
            RuleError::Invalid {
                id: "load_saturated".into(),
                reason: "unknown probe 'memroy'".into(),
            }
        );

        let mut rule = load_rule();
        rule.field = fields::MEM_USED_PERCENT.into();
        let err = rule.validate().expect_err("field of another probe");
        assert!(err.to_string().contains("records no field 'mem_used_percent'"));
    }

    #[test]
    fn describe_mentions_scale() {
        assert_eq!(load_rule().describe(), "load1 > 2 × cores");
    }

    #[test]
    fn trim_number_formats() {
        assert_eq!(trim_number(92.0), "92");
        assert_eq!(trim_number(8.5), "8.50");
    }
}
