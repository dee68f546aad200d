use std::fmt::Write;

use crate::kernel::syscall::SysApi;

/// ps — list live processes.
pub fn run(sys: &dyn SysApi, _args: &str) -> String {
    let list = sys.process_list();
    if list.is_empty() {
        return String::from("No processes");
    }

    let mut out = String::new();
    let _ = writeln!(out, "{:>5}  {:<16} {:<11} {:>4}  {:>9}", "PID", "NAME", "STATE", "PRIO", "REMAINING");
    for p in list {
        let name = if p.persistent {
            format!("[{}]", p.name)
        } else {
            p.name.clone()
        };
        let _ = writeln!(
            out,
            "{:>5}  {:<16} {:<11} {:>4}  {:>9}",
            p.pid.0, name, p.state.as_str(), p.priority, p.remaining_cycles
        );
    }
    out.trim_end().to_string()
}
