use serde::{Deserialize, Serialize};

/// Scope of a diagnostic pass
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Bounded subset of probes under a tight budget
    Quick,
    /// Every registered probe, looser budget
    #[default]
    Full,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Quick => write!(f, "quick"),
            Self::Full => write!(f, "full"),
        }
    }
}

impl std::str::FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quick" | "q" => Ok(Self::Quick),
            "full" | "f" => Ok(Self::Full),
            other => Err(format!("unknown mode '{other}' (valid: quick, full)")),
        }
    }
}
