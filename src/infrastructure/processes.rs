use async_trait::async_trait;
use sysinfo::System;

use crate::domain::entities::process::{ProcessInfo, ProcessState};
use crate::domain::ports::evidence::{EvidenceError, ProcessSource};

pub(crate) const BYTES_PER_MB: u64 = 1_048_576;

/// Reads the process table through `sysinfo`.
pub struct SysinfoProcessSource;

#[async_trait]
impl ProcessSource for SysinfoProcessSource {
    async fn processes(&self) -> Result<Vec<ProcessInfo>, EvidenceError> {
        tokio::task::spawn_blocking(|| {
            let mut sys = System::new_all();
            // CPU usage needs two samples
            std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
            sys.refresh_all();
            process_table(&sys)
        })
        .await
        .map_err(|e| EvidenceError::ProcessTable(format!("sampling task failed: {e}")))
    }
}

/// Converts the refreshed `sysinfo` table into domain processes.
pub(crate) fn process_table(sys: &System) -> Vec<ProcessInfo> {
    sys.processes()
        .values()
        .map(|proc_info| ProcessInfo {
            pid: proc_info.pid().as_u32(),
            ppid: proc_info.parent().map_or(0, sysinfo::Pid::as_u32),
            name: proc_info.name().to_string_lossy().to_string(),
            state: map_process_status(proc_info.status()),
            cpu_percent: proc_info.cpu_usage(),
            rss_mb: proc_info.memory() / BYTES_PER_MB,
        })
        .collect()
}

pub(crate) const fn map_process_status(status: sysinfo::ProcessStatus) -> ProcessState {
    match status {
        sysinfo::ProcessStatus::Run => ProcessState::Running,
        sysinfo::ProcessStatus::Sleep
        | sysinfo::ProcessStatus::Idle
        | sysinfo::ProcessStatus::UninterruptibleDiskSleep
        | sysinfo::ProcessStatus::Parked
        | sysinfo::ProcessStatus::Waking
        | sysinfo::ProcessStatus::Wakekill => ProcessState::Sleeping,
        sysinfo::ProcessStatus::Zombie => ProcessState::Zombie,
        sysinfo::ProcessStatus::Stop | sysinfo::ProcessStatus::Tracing => ProcessState::Stopped,
        sysinfo::ProcessStatus::Dead => ProcessState::Dead,
        _ => ProcessState::Unknown,
    }
}
