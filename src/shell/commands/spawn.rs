use crate::kernel::syscall::SysApi;

/// spawn <name> <cycles> <memory> [priority] [&] — submit a process.
///
/// Without a trailing `&` the shell blocks on `wait_for_process`, so the
/// session keeps its sequential feel while the scheduler does the actual
/// ordering. Ctrl+C abandons the wait; the process keeps running.
pub fn run(sys: &dyn SysApi, args: &str) -> String {
    let mut parts: Vec<&str> = args.split_whitespace().collect();
    let background = parts.last() == Some(&"&");
    if background {
        parts.pop();
    }

    if parts.len() < 3 {
        return String::from("spawn: usage: spawn <name> <cycles> <memory> [priority] [&]");
    }

    let name = parts[0];
    let cycles = match parts[1].parse::<u32>() {
        Ok(n) if n >= 1 => n,
        _ => return format!("spawn: invalid cycle count: {}", parts[1]),
    };
    let memory = match parts[2].parse::<usize>() {
        Ok(n) => n,
        Err(_) => return format!("spawn: invalid memory size: {}", parts[2]),
    };
    let priority = match parts.get(3) {
        Some(p) => match p.parse::<i32>() {
            Ok(n) => n,
            Err(_) => return format!("spawn: invalid priority: {}", p),
        },
        None => 0,
    };

    let pid = match sys.fork(name, cycles, memory, priority, false) {
        Some(pid) => pid,
        None => return String::from("spawn: failed to submit process"),
    };

    if background {
        return format!("[{}] started in background", pid);
    }

    if sys.wait_for_process(pid) {
        format!("[{}] {} completed", pid, name)
    } else {
        format!("[{}] {} interrupted", pid, name)
    }
}
