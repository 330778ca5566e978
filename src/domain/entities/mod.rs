pub mod finding;
pub mod host;
pub mod journal;
pub mod process;
pub mod report;
pub mod snapshot;

pub use finding::{EvidenceItem, Finding, FindingKind};
pub use host::HostInfo;
pub use journal::JournalEntry;
pub use process::{ProcessInfo, ProcessState};
pub use report::{DiagnosticReport, OverallStatus, RunState};
pub use snapshot::{Metric, MetricSnapshot, MetricValue};
