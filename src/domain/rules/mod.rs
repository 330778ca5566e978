pub mod defaults;
pub mod threshold;

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::domain::entities::finding::{Finding, FindingKind};
use crate::domain::entities::snapshot::MetricSnapshot;

pub use defaults::default_rules;
pub use threshold::{evaluate, RuleError, ThresholdRule, ThresholdScale};

/// Validated, immutable collection of threshold rules.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    rules: Vec<ThresholdRule>,
}

impl RuleSet {
    /// Builds a rule set, rejecting malformed or duplicated rules.
    ///
    /// # Errors
    ///
    /// Returns the first `RuleError` found.
    pub fn new(rules: Vec<ThresholdRule>) -> Result<Self, RuleError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            rule.validate()?;
            if !seen.insert(rule.id.as_str()) {
                return Err(RuleError::Duplicate(rule.id.clone()));
            }
        }
        Ok(Self { rules })
    }

    #[must_use]
    pub fn rules(&self) -> &[ThresholdRule] {
        &self.rules
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluates every rule that targets `snapshot.probe`.
    ///
    /// Fields are visited in the order the probe recorded them. Rules sharing
    /// a field run in ascending threshold order and, per metric instance, only
    /// the most severe outcome is kept: a 92% disk yields the 90% ALERT, not
    /// the 85% WARN as well.
    #[must_use]
    pub fn evaluate_snapshot(
        &self,
        snapshot: &MetricSnapshot,
        probe_order: usize,
    ) -> Vec<Finding> {
        let mut field_order: Vec<&str> = Vec::new();
        for metric in &snapshot.metrics {
            if !field_order.contains(&metric.field.as_str()) {
                field_order.push(metric.field.as_str());
            }
        }

        let mut findings = Vec::new();
        for field in field_order {
            let mut rules: Vec<&ThresholdRule> = self
                .rules
                .iter()
                .filter(|r| r.probe == snapshot.probe && r.field == field)
                .collect();
            rules.sort_by(|a, b| {
                a.comparator
                    .strictness(a.threshold)
                    .partial_cmp(&b.comparator.strictness(b.threshold))
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.id.cmp(&b.id))
            });

            // (subject, winning finding) in first-seen subject order
            let mut kept: Vec<(Option<String>, Finding)> = Vec::new();
            for rule in rules {
                for finding in evaluate(rule, snapshot) {
                    match kept.iter_mut().find(|(s, _)| *s == finding.subject) {
                        Some((_, current)) => {
                            if outranks(&finding, current) {
                                *current = finding;
                            }
                        }
                        None => kept.push((finding.subject.clone(), finding)),
                    }
                }
            }
            findings.extend(kept.into_iter().map(|(_, mut f)| {
                f.probe_order = probe_order;
                f
            }));
        }

        findings
    }
}

/// A real breach beats an unreadable marker; among equals the more severe
/// wins. Rules arrive in ascending threshold order, so ties keep the later,
/// stricter rule.
fn outranks(candidate: &Finding, current: &Finding) -> bool {
    let rank = |f: &Finding| (f.kind == FindingKind::Breach, f.severity);
    rank(candidate) >= rank(current)
}
