use async_trait::async_trait;
use sysinfo::System;

use crate::domain::entities::process::{ProcessInfo, ProcessState};
use crate::domain::entities::snapshot::{fields, probes, MetricSnapshot};
use crate::domain::ports::probe::{Probe, ProbeError};
use crate::infrastructure::processes::process_table;

/// Process totals by run state.
pub struct ProcessProbe;

#[async_trait]
impl Probe for ProcessProbe {
    fn name(&self) -> &'static str {
        probes::PROCESS
    }

    async fn capture(&self) -> Result<MetricSnapshot, ProbeError> {
        let processes = tokio::task::spawn_blocking(|| process_table(&System::new_all()))
            .await
            .map_err(|e| ProbeError::Unavailable(format!("process sampling task failed: {e}")))?;
        if processes.is_empty() {
            return Err(ProbeError::Unavailable("empty process table".to_string()));
        }
        Ok(process_snapshot(&processes))
    }
}

#[allow(clippy::cast_precision_loss)]
fn process_snapshot(processes: &[ProcessInfo]) -> MetricSnapshot {
    let count = |state: ProcessState| processes.iter().filter(|p| p.state == state).count() as f64;
    MetricSnapshot::builder(probes::PROCESS)
        .number(fields::PROCESS_TOTAL, processes.len() as f64)
        .number(fields::PROCESS_RUNNING, count(ProcessState::Running))
        .number(fields::PROCESS_SLEEPING, count(ProcessState::Sleeping))
        .number(fields::PROCESS_ZOMBIE, count(ProcessState::Zombie))
        .build()
}
