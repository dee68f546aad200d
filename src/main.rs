use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use nucleos::kernel::interrupt;
use nucleos::kernel::syscall::KernelSysApi;
use nucleos::init::Init;
use nucleos::sched::Algorithm;
use nucleos::{logger, Config, Kernel};

/// A user-space simulation of a single-node OS kernel.
#[derive(Parser, Debug)]
#[command(name = "nucleos", version, about)]
struct Cli {
    /// Mirror log output to the console
    #[arg(short, long)]
    verbose: bool,

    /// Memory pool capacity in bytes
    #[arg(long, default_value_t = nucleos::config::DEFAULT_MEMORY_SIZE)]
    memory_size: usize,

    /// Minimum log level (trace|debug|info|warn|error|off)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Scheduling algorithm (fcfs|roundrobin|priority)
    #[arg(long, default_value = "fcfs")]
    algorithm: String,

    /// Round-Robin quantum in cycles
    #[arg(long, default_value_t = 5)]
    quantum: u32,

    /// CPU cycles consumed per scheduler tick
    #[arg(long, default_value_t = 1)]
    cycles_per_tick: u32,

    /// Milliseconds between scheduler ticks
    #[arg(long, default_value_t = 100)]
    tick_interval_ms: u64,

    /// Directory snapshots are stored in
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let log_level = match logger::parse_level(&cli.log_level) {
        Some(level) => level,
        None => {
            eprintln!("Unknown log level: {}", cli.log_level);
            std::process::exit(1);
        }
    };
    let algorithm = match Algorithm::parse(&cli.algorithm, cli.quantum) {
        Some(algorithm) => algorithm,
        None => {
            eprintln!("Unknown scheduling algorithm: {}", cli.algorithm);
            std::process::exit(1);
        }
    };

    let config = Config {
        verbose: cli.verbose,
        memory_size: cli.memory_size,
        log_level,
        scheduler_algorithm: algorithm,
        cycles_per_tick: cli.cycles_per_tick,
        tick_interval_ms: cli.tick_interval_ms,
        data_dir: cli.data_dir,
    };

    logger::init(config.log_level, config.verbose);
    interrupt::install();

    log::info!("Starting nucleos OS simulator");
    log::info!(
        "Memory size: {} bytes ({} KB)",
        config.memory_size,
        config.memory_size / 1024
    );

    let kernel = Kernel::new(&config);
    kernel.boot();

    let sys = Arc::new(KernelSysApi::new(kernel.clone()));
    let init = Init::new(kernel.clone(), sys);
    init.run();

    kernel.request_shutdown();
    kernel.join();
    log::info!("Shutdown complete");
}
