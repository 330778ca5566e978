mod command;
mod journal;

pub mod load;
pub mod memory;
pub mod network;
pub mod process;
pub mod security_log;
pub mod services;
pub mod storage;
pub mod system_log;

use std::sync::Arc;

use crate::application::config::ProbeSettings;
use crate::domain::ports::probe::Probe;
use crate::domain::value_objects::RunMode;

pub use load::LoadProbe;
pub use memory::MemoryProbe;
pub use network::NetworkProbe;
pub use process::ProcessProbe;
pub use security_log::SecurityLogProbe;
pub use services::ServicesProbe;
pub use storage::StorageProbe;
pub use system_log::SystemLogProbe;

/// Probes for `mode`, in declared order. Quick mode keeps the cheap local
/// probes (sysinfo, plus `df` for inodes) and leaves out the network,
/// journal and service-manager ones.
#[must_use]
pub fn build_probes(mode: RunMode, settings: &ProbeSettings) -> Vec<Arc<dyn Probe>> {
    match mode {
        RunMode::Quick => vec![
            Arc::new(LoadProbe),
            Arc::new(MemoryProbe),
            Arc::new(StorageProbe),
            Arc::new(ProcessProbe),
        ],
        RunMode::Full => vec![
            Arc::new(LoadProbe),
            Arc::new(MemoryProbe),
            Arc::new(StorageProbe),
            Arc::new(NetworkProbe),
            Arc::new(ProcessProbe),
            Arc::new(SystemLogProbe::new(settings.syslog_window)),
            Arc::new(ServicesProbe::new(
                settings.critical_services.clone(),
                settings.service_ports.clone(),
            )),
            Arc::new(SecurityLogProbe::new(settings.security_window)),
        ],
    }
}
