use colored::{ColoredString, Colorize};

use crate::domain::value_objects::Severity;

#[must_use]
pub fn colorize_severity(severity: Severity, text: &str) -> ColoredString {
    match severity {
        Severity::Alert => text.red().bold(),
        Severity::Warn => text.yellow().bold(),
        Severity::Info => text.blue(),
        Severity::Healthy => text.green().bold(),
    }
}

#[must_use]
pub fn section_header(title: &str) -> String {
    let display_width = title.chars().count();
    format!("{}\n{}", title.bold().cyan(), "─".repeat(display_width).cyan())
}
