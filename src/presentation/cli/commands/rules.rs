use crate::domain::rules::ThresholdRule;
use crate::presentation::cli::formatters::status_fmt::section_header;
use crate::presentation::cli::formatters::table_fmt::format_rule_table;

/// Prints the effective rule set (defaults merged with configuration).
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn run_rules(rules: &[ThresholdRule], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rules)?);
    } else {
        println!("{}", section_header("Threshold rules"));
        println!("{}", format_rule_table(rules));
    }
    Ok(())
}
