use crate::domain::rules::ThresholdRule;

use super::status_fmt::colorize_severity;

/// Formats threshold rules as an aligned table, in evaluation order.
///
/// # Returns
///
/// A multi-line string with header, separator, and one row per rule.
#[must_use]
pub fn format_rule_table(rules: &[ThresholdRule]) -> String {
    let header = format!(
        "{:<22} {:<13} {:<32} {:<6}",
        "RULE", "PROBE", "CONDITION", "SEVERITY"
    );
    let separator = "─".repeat(header.chars().count());

    let mut rows = vec![header, separator];

    for rule in rules {
        let id: String = rule.id.chars().take(21).collect();
        let condition: String = rule.describe().chars().take(31).collect();
        rows.push(format!(
            "{:<22} {:<13} {:<32} {}",
            id,
            rule.probe,
            condition,
            colorize_severity(rule.severity, &rule.severity.to_string())
        ));
    }

    rows.join("\n")
}
