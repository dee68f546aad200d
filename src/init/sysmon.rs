use std::time::Duration;

use super::daemon::Daemon;
use crate::kernel::syscall::SysApi;

/// System monitoring daemon: periodically collects and logs memory usage.
pub struct MonitoringDaemon;

impl MonitoringDaemon {
    pub fn new() -> Self {
        MonitoringDaemon
    }
}

impl Default for MonitoringDaemon {
    fn default() -> Self {
        Self::new()
    }
}

impl Daemon for MonitoringDaemon {
    fn name(&self) -> &str {
        "sysmon"
    }

    fn do_work(&mut self, sys: &dyn SysApi) {
        let info = sys.get_sys_info();
        let percent = if info.total_memory > 0 {
            info.used_memory as f64 / info.total_memory as f64 * 100.0
        } else {
            0.0
        };
        log::info!(
            "System stats: Memory {}/{} bytes ({:.2}% used)",
            info.used_memory,
            info.total_memory,
            percent
        );
    }

    fn work_interval(&self) -> Duration {
        Duration::from_secs(10)
    }
}
