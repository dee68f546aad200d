use std::fmt::Write;

use crate::kernel::syscall::SysApi;

const BAR_WIDTH: usize = 40;

/// meminfo — memory pool usage with a bar.
pub fn run(sys: &dyn SysApi, _args: &str) -> String {
    let info = sys.get_sys_info();
    let free = info.total_memory - info.used_memory;
    let percent = if info.total_memory > 0 {
        info.used_memory as f64 / info.total_memory as f64 * 100.0
    } else {
        0.0
    };

    let filled = (percent / 100.0 * BAR_WIDTH as f64).round() as usize;
    let bar: String = "#".repeat(filled) + &"-".repeat(BAR_WIDTH - filled.min(BAR_WIDTH));

    let mut out = String::new();
    let _ = writeln!(out, "Total:  {} bytes", info.total_memory);
    let _ = writeln!(out, "Used:   {} bytes ({:.2}%)", info.used_memory, percent);
    let _ = writeln!(out, "Free:   {} bytes", free);
    let _ = write!(out, "[{}]", bar);
    out
}
