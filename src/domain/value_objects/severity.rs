use serde::{Deserialize, Serialize};

/// Ordinal severity of a finding. `Healthy` is only ever an overall status,
/// never the severity of an individual finding.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    Healthy,
    Info,
    Warn,
    Alert,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "HEALTHY"),
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Alert => write!(f, "ALERT"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "healthy" => Ok(Self::Healthy),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "alert" => Ok(Self::Alert),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

impl Severity {
    /// Severities a finding can carry, most severe first.
    pub const RANKED: [Self; 3] = [Self::Alert, Self::Warn, Self::Info];

    #[must_use]
    pub const fn symbol(&self) -> &str {
        match self {
            Self::Healthy => "✔",
            Self::Info => "ℹ",
            Self::Warn => "⚠",
            Self::Alert => "✖",
        }
    }
}
