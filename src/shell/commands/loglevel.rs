use crate::kernel::syscall::SysApi;
use crate::logger;

/// loglevel [level] — show or change the minimum log level.
pub fn run(sys: &dyn SysApi, args: &str) -> String {
    let value = args.trim();
    if value.is_empty() {
        return format!("Log level: {}", sys.log_level());
    }
    match logger::parse_level(value) {
        Some(level) => {
            sys.set_log_level(level);
            format!("Log level set to {}", level)
        }
        None => format!("loglevel: unknown level: {}", value),
    }
}
