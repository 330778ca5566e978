use sysinfo::System;

use crate::domain::entities::host::{HostInfo, UNKNOWN};

/// Host identity from `sysinfo`; any part the OS does not report is `unknown`.
#[must_use]
pub fn detect_host() -> HostInfo {
    let or_unknown = |value: Option<String>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string())
    };
    HostInfo {
        hostname: or_unknown(System::host_name()),
        os: or_unknown(System::long_os_version()),
        kernel: or_unknown(System::kernel_version()),
        arch: or_unknown(Some(System::cpu_arch())),
    }
}
