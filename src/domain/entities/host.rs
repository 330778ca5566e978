use serde::{Deserialize, Serialize};

pub const UNKNOWN: &str = "unknown";

/// Identity of the machine a report describes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    pub hostname: String,
    pub os: String,
    pub kernel: String,
    pub arch: String,
}

impl Default for HostInfo {
    fn default() -> Self {
        Self {
            hostname: UNKNOWN.to_string(),
            os: UNKNOWN.to_string(),
            kernel: UNKNOWN.to_string(),
            arch: UNKNOWN.to_string(),
        }
    }
}

impl std::fmt::Display for HostInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}, kernel {}, {})",
            self.hostname, self.os, self.kernel, self.arch
        )
    }
}
