use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::rules::{default_rules, ThresholdRule};
use crate::domain::value_objects::RunMode;

pub const ENV_MODE: &str = "HOSTCHECK_MODE";
pub const ENV_CRITICAL_SERVICES: &str = "HOSTCHECK_CRITICAL_SERVICES";
pub const ENV_LOG_DIR: &str = "HOSTCHECK_LOG_DIR";

const MAX_EVIDENCE_LIMIT: usize = 10;

/// Top-level application configuration loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub budget: BudgetConfig,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub security: WindowConfig,
    #[serde(default)]
    pub logs: WindowConfig,
    #[serde(default)]
    pub rules: RulesConfig,
}

/// Mode, evidence depth, parallelism and run-log location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub mode: RunMode,
    #[serde(default = "default_evidence_limit")]
    pub evidence_limit: usize,
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

/// Time budgets per run mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    #[serde(default = "default_quick_budget")]
    pub quick: ModeBudget,
    #[serde(default = "default_full_budget")]
    pub full: ModeBudget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeBudget {
    pub total_secs: u64,
    pub probe_timeout_secs: u64,
}

/// Critical services checked through the service manager, and TCP ports
/// checked on localhost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    #[serde(default = "default_critical_services")]
    pub critical: Vec<String>,
    #[serde(default)]
    pub ports: BTreeMap<String, u16>,
}

/// Trailing window for log-based probes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_mins")]
    pub window_mins: u64,
}

impl WindowConfig {
    /// At least one minute; absurdly large values saturate instead of overflowing.
    #[must_use]
    pub const fn window(&self) -> Duration {
        let mins = if self.window_mins == 0 { 1 } else { self.window_mins };
        Duration::from_secs(mins.saturating_mul(60))
    }
}

/// Threshold overrides: `custom` rules replace defaults with the same id or
/// are appended; `disabled` ids are removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default)]
    pub disabled: Vec<String>,
    #[serde(default)]
    pub custom: Vec<ThresholdRule>,
}

// --- Defaults ---

const fn default_evidence_limit() -> usize {
    5
}

const fn default_max_parallel() -> usize {
    4
}

// NOTE: Stored with tilde, expanded by `AppConfig::log_dir`
fn default_log_dir() -> String {
    "~/.local/share/hostcheck/runs".into()
}

const fn default_quick_budget() -> ModeBudget {
    ModeBudget {
        total_secs: 20,
        probe_timeout_secs: 3,
    }
}

const fn default_full_budget() -> ModeBudget {
    ModeBudget {
        total_secs: 120,
        probe_timeout_secs: 10,
    }
}

fn default_critical_services() -> Vec<String> {
    vec!["sshd".into(), "cron".into(), "systemd-journald".into()]
}

const fn default_window_mins() -> u64 {
    60
}

// --- Default impls ---

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            evidence_limit: default_evidence_limit(),
            max_parallel: default_max_parallel(),
            log_dir: default_log_dir(),
        }
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            quick: default_quick_budget(),
            full: default_full_budget(),
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            critical: default_critical_services(),
            ports: BTreeMap::new(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_mins: default_window_mins(),
        }
    }
}

// --- AppConfig methods ---

impl AppConfig {
    /// Load from the default path, falling back to built-in defaults when
    /// no file exists there.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML content is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// `<config_dir>/hostcheck/config.toml`
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hostcheck").join("config.toml"))
    }

    /// Applies environment overrides on top of file values. `lookup` is
    /// `std::env::var(..).ok()` in production.
    ///
    /// # Errors
    ///
    /// Returns an error if `HOSTCHECK_MODE` holds an unknown mode.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup(ENV_MODE) {
            self.general.mode = mode
                .parse()
                .map_err(|e: String| anyhow::anyhow!("{ENV_MODE}: {e}"))?;
        }
        if let Some(services) = lookup(ENV_CRITICAL_SERVICES) {
            self.services.critical = services
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(dir) = lookup(ENV_LOG_DIR) {
            if !dir.trim().is_empty() {
                self.general.log_dir = dir;
            }
        }
        Ok(())
    }

    /// Defaults, minus disabled ids, with custom rules replacing or appended.
    #[must_use]
    pub fn effective_rules(&self) -> Vec<ThresholdRule> {
        let mut rules: Vec<ThresholdRule> = default_rules()
            .into_iter()
            .filter(|r| !self.rules.disabled.contains(&r.id))
            .collect();

        for id in &self.rules.disabled {
            if !rules.iter().any(|r| &r.id == id) && !self.rules.custom.iter().any(|r| &r.id == id) {
                tracing::warn!(rule = %id, "disabled rule id matches no rule");
            }
        }

        for custom in &self.rules.custom {
            match rules.iter_mut().find(|r| r.id == custom.id) {
                Some(existing) => *existing = custom.clone(),
                None => rules.push(custom.clone()),
            }
        }
        rules
    }

    /// Resolves the engine configuration for a run.
    #[must_use]
    pub fn diagnostic_config(&self, mode: RunMode) -> DiagnosticConfig {
        let budget = match mode {
            RunMode::Quick => self.budget.quick,
            RunMode::Full => self.budget.full,
        };
        DiagnosticConfig {
            mode,
            total_budget: Duration::from_secs(budget.total_secs),
            probe_timeout: Duration::from_secs(budget.probe_timeout_secs),
            evidence_limit: self.general.evidence_limit.clamp(1, MAX_EVIDENCE_LIMIT),
            max_parallel: self.general.max_parallel.max(1),
            rules: self.effective_rules(),
        }
    }

    /// Settings the concrete probes are built from.
    #[must_use]
    pub fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings {
            critical_services: self.services.critical.clone(),
            service_ports: self.services.ports.clone(),
            security_window: self.security.window(),
            syslog_window: self.logs.window(),
        }
    }

    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.general.log_dir).as_ref())
    }
}

/// Fully resolved input of `DiagnosticOrchestrator::run_diagnosis`.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticConfig {
    pub mode: RunMode,
    pub total_budget: Duration,
    pub probe_timeout: Duration,
    pub evidence_limit: usize,
    pub max_parallel: usize,
    pub rules: Vec<ThresholdRule>,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        AppConfig::default().diagnostic_config(RunMode::Full)
    }
}

/// Resolved per-probe settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    pub critical_services: Vec<String>,
    pub service_ports: BTreeMap<String, u16>,
    pub security_window: Duration,
    pub syslog_window: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        AppConfig::default().probe_settings()
    }
}
