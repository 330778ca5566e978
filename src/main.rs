use std::process::ExitCode;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hostcheck::application::config::AppConfig;
use hostcheck::application::services::DiagnosticOrchestrator;
use hostcheck::domain::ports::run_log::RunLog;
use hostcheck::infrastructure::host::detect_host;
use hostcheck::infrastructure::probes::build_probes;
use hostcheck::infrastructure::processes::SysinfoProcessSource;
use hostcheck::infrastructure::run_log::{JsonLinesRunLog, NullRunLog};
use hostcheck::presentation::cli::app::{Cli, Commands};
use hostcheck::presentation::cli::commands::diagnose::{exit_code, run_diagnose, EXIT_CONFIG_ERROR};
use hostcheck::presentation::cli::commands::rules::run_rules;
use hostcheck::presentation::cli::formatters::report_fmt::render_failure;
use hostcheck::presentation::cli::runtime::run_to_completion;

fn setup_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = if let Some(ref path) = cli.config {
        AppConfig::load_from(path)?
    } else {
        AppConfig::load()?
    };
    config
        .apply_env(|key| std::env::var(key).ok())
        .context("Invalid environment override")?;
    if let Some(ref dir) = cli.log_dir {
        config.general.log_dir.clone_from(dir);
    }
    Ok(config)
}

/// Resolves when the user hits Ctrl-C; never resolves if the handler
/// cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let config = load_config(&cli)?;

    if cli.command == Some(Commands::Rules) {
        run_rules(&config.effective_rules(), cli.json)?;
        return Ok(0);
    }

    let mode = cli.mode.unwrap_or(config.general.mode);
    let diagnostic = config.diagnostic_config(mode);

    // Manual DI: main.rs is the only place that knows concrete types
    let probes = build_probes(mode, &config.probe_settings());
    let process_source = SysinfoProcessSource;
    let run_log: Box<dyn RunLog> = if cli.no_log {
        Box::new(NullRunLog)
    } else {
        let log = JsonLinesRunLog::for_run(&config.log_dir(), Utc::now());
        tracing::info!("Run log: {}", log.path().display());
        Box::new(log)
    };

    let orchestrator = DiagnosticOrchestrator::new(probes, &process_source, run_log.as_ref())
        .with_host(detect_host());
    let report = run_diagnose(&orchestrator, &diagnostic, cli.json, ctrl_c()).await?;
    Ok(exit_code(&report))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    // Built by hand so shutdown never waits on a probe stuck in a syscall
    match run_to_completion(run(cli)).and_then(|result| result) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{}", render_failure(&e));
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}
