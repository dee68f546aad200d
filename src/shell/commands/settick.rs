use crate::kernel::syscall::SysApi;

/// settick <ms> — real-time interval between scheduler ticks.
pub fn run(sys: &dyn SysApi, args: &str) -> String {
    let value = args.trim();
    match value.parse::<u64>() {
        Ok(ms) if sys.set_scheduler_tick_interval_ms(ms) => {
            format!("Tick interval set to {} ms", ms)
        }
        _ => format!("settick: invalid interval: {}", value),
    }
}
