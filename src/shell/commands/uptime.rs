use crate::kernel::syscall::SysApi;

/// uptime — elapsed virtual time in scheduler ticks.
pub fn run(sys: &dyn SysApi, _args: &str) -> String {
    format!("up {} ticks", sys.system_ticks())
}
