use async_trait::async_trait;
use sysinfo::System;

use crate::domain::entities::snapshot::{fields, probes, MetricSnapshot};
use crate::domain::ports::probe::{Probe, ProbeError};

const PROC_STAT: &str = "/proc/stat";

/// Load averages, logical cores, CPU utilisation and steal time.
pub struct LoadProbe;

#[async_trait]
impl Probe for LoadProbe {
    fn name(&self) -> &'static str {
        probes::LOAD
    }

    async fn capture(&self) -> Result<MetricSnapshot, ProbeError> {
        tokio::task::spawn_blocking(sample)
            .await
            .map_err(|e| ProbeError::Unavailable(format!("load sampling task failed: {e}")))
    }
}

/// Aggregate `cpu` line of `/proc/stat`, in jiffies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CpuTimes {
    total: u64,
    steal: u64,
}

fn sample() -> MetricSnapshot {
    let before = read_cpu_times();
    let mut sys = System::new();
    sys.refresh_cpu_usage();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_usage();
    let after = read_cpu_times();

    let load = System::load_average();
    let per_core: Vec<f32> = sys.cpus().iter().map(sysinfo::Cpu::cpu_usage).collect();

    let mut builder = MetricSnapshot::builder(probes::LOAD)
        .number(fields::LOAD1, load.one)
        .number(fields::LOAD5, load.five)
        .number(fields::LOAD15, load.fifteen);

    builder = if per_core.is_empty() {
        builder
            .unreadable(fields::CPU_CORES, None, "no CPU reported")
            .unreadable(fields::CPU_PERCENT, None, "no CPU reported")
    } else {
        #[allow(clippy::cast_precision_loss)]
        let cores = per_core.len() as f64;
        builder
            .number(fields::CPU_CORES, cores)
            .number(fields::CPU_PERCENT, f64::from(avg_cpu_usage(&per_core)))
    };

    if let Some(steal) = before.zip(after).and_then(|(b, a)| steal_percent(b, a)) {
        builder = builder.number(fields::CPU_STEAL_PERCENT, steal);
    }
    builder.build()
}

/// Returns the arithmetic mean of `per_core` usages, or `0.0` when the slice is empty.
#[allow(clippy::cast_precision_loss)]
fn avg_cpu_usage(per_core: &[f32]) -> f32 {
    let count = per_core.len();
    if count > 0 {
        per_core.iter().sum::<f32>() / count as f32
    } else {
        0.0
    }
}

fn read_cpu_times() -> Option<CpuTimes> {
    let content = std::fs::read_to_string(PROC_STAT).ok()?;
    content.lines().find_map(parse_cpu_line)
}

/// `cpu  user nice system idle iowait irq softirq steal guest guest_nice`.
/// Guest time is already part of user time and is left out of the total.
fn parse_cpu_line(line: &str) -> Option<CpuTimes> {
    let mut parts = line.split_whitespace();
    if parts.next()? != "cpu" {
        return None;
    }
    let values: Vec<u64> = parts.take(8).map(str::parse).collect::<Result<_, _>>().ok()?;
    if values.len() < 8 {
        return None;
    }
    Some(CpuTimes {
        total: values.iter().sum(),
        steal: values[7],
    })
}

#[allow(clippy::cast_precision_loss)]
fn steal_percent(before: CpuTimes, after: CpuTimes) -> Option<f64> {
    let total = after.total.checked_sub(before.total)?;
    let steal = after.steal.checked_sub(before.steal)?;
    (total > 0).then(|| steal as f64 / total as f64 * 100.0)
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_cpu_line_reads_steal_column() {
        let times = parse_cpu_line("cpu  100 0 50 800 10 0 5 35 0 0").expect("cpu line");
        assert_eq!(times.total, 1000);
        assert_eq!(times.steal, 35);
    }

    #[test]
    fn parse_cpu_line_ignores_per_core_and_short_lines() {
        assert!(parse_cpu_line("cpu0 1 2 3 4 5 6 7 8").is_none());
        assert!(parse_cpu_line("cpu  1 2 3 4").is_none());
        assert!(parse_cpu_line("intr 12345").is_none());
    }

    #[test]
    fn steal_percent_from_deltas() {
        let before = CpuTimes { total: 1000, steal: 10 };
        let after = CpuTimes { total: 1200, steal: 40 };
        let steal = steal_percent(before, after).expect("delta");
        assert!((steal - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn steal_percent_without_progress_is_none() {
        let times = CpuTimes { total: 1000, steal: 10 };
        assert!(steal_percent(times, times).is_none());
    }

    #[test]
    fn avg_cpu_usage_empty_is_zero() {
        assert!((avg_cpu_usage(&[]) - 0.0).abs() < f32::EPSILON);
        assert!((avg_cpu_usage(&[20.0, 40.0]) - 30.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn capture_reports_load_and_cores() {
        let snapshot = LoadProbe.capture().await.expect("capture");
        assert_eq!(snapshot.probe, probes::LOAD);
        assert!(snapshot.number(fields::LOAD1).is_some());
        assert!(snapshot.number(fields::CPU_CORES).unwrap_or(0.0) >= 1.0);
    }
}
