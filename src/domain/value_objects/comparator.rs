use serde::{Deserialize, Serialize};

/// Comparison applied between an observed value and a threshold
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Comparator {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<")]
    LessThan,
}

impl Comparator {
    /// Returns `true` when `observed` breaches `threshold`.
    #[must_use]
    pub fn holds(self, observed: f64, threshold: f64) -> bool {
        match self {
            Self::GreaterThan => observed > threshold,
            Self::GreaterOrEqual => observed >= threshold,
            Self::LessThan => observed < threshold,
        }
    }

    /// How far past the threshold `observed` sits, in the comparator's direction.
    /// Used to rank competing breaches on the same metric.
    #[must_use]
    pub fn strictness(self, threshold: f64) -> f64 {
        match self {
            Self::GreaterThan | Self::GreaterOrEqual => threshold,
            Self::LessThan => -threshold,
        }
    }
}

impl std::fmt::Display for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GreaterThan => write!(f, ">"),
            Self::GreaterOrEqual => write!(f, ">="),
            Self::LessThan => write!(f, "<"),
        }
    }
}
