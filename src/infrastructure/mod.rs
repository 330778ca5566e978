pub mod host;
pub mod probes;
pub mod processes;
pub mod run_log;
