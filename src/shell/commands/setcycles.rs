use crate::kernel::syscall::SysApi;

/// setcycles <n> — CPU cycles consumed per scheduler tick.
pub fn run(sys: &dyn SysApi, args: &str) -> String {
    let value = args.trim();
    match value.parse::<u32>() {
        Ok(n) if sys.set_scheduler_cycles_per_interval(n) => {
            format!("Cycles per tick set to {}", n)
        }
        _ => format!("setcycles: invalid cycle count: {}", value),
    }
}
