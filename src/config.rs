use std::path::PathBuf;

use crate::sched::Algorithm;

/// Default memory pool capacity (1 MiB).
pub const DEFAULT_MEMORY_SIZE: usize = 1024 * 1024;

/// Startup configuration consumed by the kernel.
///
/// Filled in by the CLI layer in `main.rs`; every field has a default so
/// tests can build a kernel with `Config::default()` and tweak what they
/// need.
#[derive(Debug, Clone)]
pub struct Config {
    /// Mirror informational logs to the console; without it only warnings
    /// and errors are shown.
    pub verbose: bool,
    /// Memory pool capacity in bytes.
    pub memory_size: usize,
    /// Minimum log level for the logger backend.
    pub log_level: log::LevelFilter,
    /// Scheduling discipline selected at boot.
    pub scheduler_algorithm: Algorithm,
    /// CPU cycles consumed per scheduler tick.
    pub cycles_per_tick: u32,
    /// Real-time milliseconds between scheduler ticks.
    pub tick_interval_ms: u64,
    /// Directory snapshot blobs are written to.
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            verbose: false,
            memory_size: DEFAULT_MEMORY_SIZE,
            log_level: log::LevelFilter::Info,
            scheduler_algorithm: Algorithm::Fcfs,
            cycles_per_tick: 1,
            tick_interval_ms: 100,
            data_dir: PathBuf::from("data"),
        }
    }
}
