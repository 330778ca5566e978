use serde::{Deserialize, Serialize};

/// One row of the process table, as far as evidence ranking needs it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    /// 0 when the parent is unknown
    pub ppid: u32,
    pub name: String,
    pub state: ProcessState,
    pub cpu_percent: f32,
    pub rss_mb: u64,
}

impl ProcessInfo {
    /// `PID <pid> (<name>)`, the description used for evidence items.
    #[must_use]
    pub fn label(&self) -> String {
        format!("PID {} ({})", self.pid, self.name)
    }

    #[must_use]
    pub fn is_zombie(&self) -> bool {
        self.state == ProcessState::Zombie
    }
}

/// Scheduler state, collapsed to what the process probe counts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    Running,
    Sleeping,
    Zombie,
    Stopped,
    Dead,
    Unknown,
}
