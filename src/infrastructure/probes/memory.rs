use async_trait::async_trait;
use sysinfo::System;

use crate::domain::entities::snapshot::{fields, probes, MetricSnapshot};
use crate::domain::ports::probe::{Probe, ProbeError};
use crate::infrastructure::processes::BYTES_PER_MB;

/// Physical memory and swap usage.
pub struct MemoryProbe;

#[async_trait]
impl Probe for MemoryProbe {
    fn name(&self) -> &'static str {
        probes::MEMORY
    }

    async fn capture(&self) -> Result<MetricSnapshot, ProbeError> {
        let totals = tokio::task::spawn_blocking(|| {
            let mut sys = System::new();
            sys.refresh_memory();
            MemoryTotals {
                total: sys.total_memory(),
                used: sys.used_memory(),
                available: sys.available_memory(),
                swap_total: sys.total_swap(),
                swap_used: sys.used_swap(),
            }
        })
        .await
        .map_err(|e| ProbeError::Unavailable(format!("memory sampling task failed: {e}")))?;

        memory_snapshot(&totals)
    }
}

/// Raw byte counts as reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MemoryTotals {
    total: u64,
    used: u64,
    available: u64,
    swap_total: u64,
    swap_used: u64,
}

/// Returns `(numerator / denominator) * 100.0`, or `0.0` when `denominator` is zero.
#[allow(clippy::cast_precision_loss)]
fn safe_percent(numerator: u64, denominator: u64) -> f64 {
    if denominator > 0 {
        (numerator as f64 / denominator as f64) * 100.0
    } else {
        0.0
    }
}

#[allow(clippy::cast_precision_loss)]
fn memory_snapshot(totals: &MemoryTotals) -> Result<MetricSnapshot, ProbeError> {
    if totals.total == 0 {
        return Err(ProbeError::Unavailable(
            "total memory reported as zero".to_string(),
        ));
    }
    Ok(MetricSnapshot::builder(probes::MEMORY)
        .number(fields::MEM_USED_PERCENT, safe_percent(totals.used, totals.total))
        .number(
            fields::MEM_AVAILABLE_PERCENT,
            safe_percent(totals.available, totals.total),
        )
        .number(fields::MEM_TOTAL_MB, (totals.total / BYTES_PER_MB) as f64)
        .number(
            fields::SWAP_USED_PERCENT,
            safe_percent(totals.swap_used, totals.swap_total),
        )
        .build())
}
