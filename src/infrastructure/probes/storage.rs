use async_trait::async_trait;
use sysinfo::Disks;

use super::command;
use crate::domain::entities::snapshot::{fields, probes, MetricSnapshot};
use crate::domain::ports::probe::{Probe, ProbeError};

/// Filesystem types to exclude from storage metrics.
const PSEUDO_FILESYSTEMS: &[&str] = &[
    "tmpfs",
    "devtmpfs",
    "sysfs",
    "proc",
    "cgroup2",
    "overlay",
    "squashfs",
    "efivarfs",
    "bpf",
    "hugetlbfs",
    "mqueue",
    "pstore",
    "securityfs",
    "debugfs",
    "tracefs",
    "fusectl",
    "rpc_pipefs",
];

/// Usage and inode usage per real mounted filesystem.
pub struct StorageProbe;

#[async_trait]
impl Probe for StorageProbe {
    fn name(&self) -> &'static str {
        probes::STORAGE
    }

    async fn capture(&self) -> Result<MetricSnapshot, ProbeError> {
        let mounts = tokio::task::spawn_blocking(mounted_usage)
            .await
            .map_err(|e| ProbeError::Unavailable(format!("disk sampling task failed: {e}")))?;
        if mounts.is_empty() {
            return Err(ProbeError::Unavailable(
                "no mounted filesystems reported".to_string(),
            ));
        }

        let mut builder = MetricSnapshot::builder(probes::STORAGE);
        for (mount, percent) in &mounts {
            builder = builder.keyed(fields::DISK_USED_PERCENT, mount, *percent);
        }

        match command::stdout_of("df", &["-iP"]).await {
            Ok(stdout) => {
                let names: Vec<&str> = mounts.iter().map(|(m, _)| m.as_str()).collect();
                for (mount, usage) in parse_df_inodes(&stdout, &names) {
                    builder = match usage {
                        Ok(percent) => builder.keyed(fields::INODE_USED_PERCENT, &mount, percent),
                        Err(reason) => {
                            builder.unreadable(fields::INODE_USED_PERCENT, Some(mount.as_str()), &reason)
                        }
                    };
                }
            }
            Err(e) => tracing::debug!("Inode usage unavailable: {e}"),
        }

        Ok(builder.build())
    }
}

/// `(mount point, used %)` for every real filesystem, sorted by mount point.
#[allow(clippy::cast_precision_loss)]
fn mounted_usage() -> Vec<(String, f64)> {
    let disks = Disks::new_with_refreshed_list();
    let mut mounts: Vec<(String, f64)> = disks
        .iter()
        .filter(|d| {
            let fs = d.file_system().to_string_lossy();
            !PSEUDO_FILESYSTEMS.iter().any(|&pseudo| fs == pseudo) && d.total_space() > 0
        })
        .map(|disk| {
            let total = disk.total_space();
            let used = total.saturating_sub(disk.available_space());
            let percent = ((used as f64 / total as f64) * 100.0).clamp(0.0, 100.0);
            (disk.mount_point().to_string_lossy().to_string(), percent)
        })
        .collect();
    mounts.sort_by(|a, b| a.0.cmp(&b.0));
    mounts.dedup_by(|a, b| a.0 == b.0);
    mounts
}

/// Parses `df -iP` for the given mount points.
///
/// Columns: `Filesystem Inodes IUsed IFree IUse% Mounted on`. Filesystems
/// without a fixed inode table report `-` and are left out.
fn parse_df_inodes(stdout: &str, mounts: &[&str]) -> Vec<(String, Result<f64, String>)> {
    stdout
        .lines()
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 6 {
                return None;
            }
            let mount = cols[5..].join(" ");
            if !mounts.contains(&mount.as_str()) {
                return None;
            }
            let usage = cols[4];
            if usage == "-" || cols[1] == "0" {
                return None;
            }
            let parsed = usage
                .trim_end_matches('%')
                .parse::<f64>()
                .map_err(|_| format!("unexpected inode usage '{usage}'"));
            Some((mount, parsed))
        })
        .collect()
}
