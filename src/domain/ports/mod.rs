pub mod evidence;
pub mod probe;
pub mod run_log;

pub use evidence::{EvidenceError, ProcessSource};
pub use probe::{Probe, ProbeError};
pub use run_log::{RunEvent, RunLog, RunLogError};
