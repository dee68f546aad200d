use crate::kernel::syscall::SysApi;
use crate::process::{Pid, SIGTERM};

/// kill [-signal] <pid> — send a signal to a process (default TERM).
pub fn run(sys: &dyn SysApi, args: &str) -> String {
    let mut parts = args.split_whitespace();
    let first = match parts.next() {
        Some(first) => first,
        None => return String::from("kill: usage: kill [-signal] <pid>"),
    };

    let (signal, pid_str) = if let Some(sig) = first.strip_prefix('-') {
        let pid_str = match parts.next() {
            Some(p) => p,
            None => return String::from("kill: usage: kill [-signal] <pid>"),
        };
        match sig.parse::<i32>() {
            Ok(n) => (n, pid_str),
            Err(_) => return format!("kill: invalid signal: {}", sig),
        }
    } else {
        (SIGTERM, first)
    };

    let pid = match pid_str.parse::<u32>() {
        Ok(n) => Pid(n),
        Err(_) => return format!("kill: invalid pid: {}", pid_str),
    };
    if pid.0 == 0 {
        return String::from("kill: cannot signal kernel (pid 0)");
    }

    match sys.send_signal(pid, signal) {
        Ok(()) => format!("Sent signal {} to process {}", signal, pid),
        Err(_) => format!("kill: no such process: {}", pid),
    }
}
