use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::value_objects::RunMode;

/// hostcheck: rapid host-health diagnostics
///
/// Probes load, memory, storage, network, processes, logs and services,
/// evaluates thresholds and prints a severity-ranked report. Exit code 0
/// means healthy or warnings only, 1 alerts, 2 configuration error,
/// 130 interrupted.
#[derive(Parser, Debug)]
#[command(name = "hostcheck")]
#[command(version, about, long_about)]
pub struct Cli {
    /// Subcommand to execute (default: diagnose)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Run mode: quick (core probes, tight budget) or full
    #[arg(short, long, global = true)]
    pub mode: Option<RunMode>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to custom config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory for the run log artifact
    #[arg(long, global = true)]
    pub log_dir: Option<String>,

    /// Do not write a run log artifact
    #[arg(long, global = true)]
    pub no_log: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run a diagnostic pass
    #[command(alias = "d")]
    Diagnose,

    /// Show the effective threshold rules
    #[command(alias = "r")]
    Rules,
}
