use crate::kernel::syscall::SysApi;

/// setsched <fcfs|roundrobin|priority> [quantum] — switch the scheduling
/// algorithm; takes effect on the next tick.
pub fn run(sys: &dyn SysApi, args: &str) -> String {
    let mut parts = args.split_whitespace();
    let name = match parts.next() {
        Some(name) => name,
        None => return String::from("setsched: usage: setsched <fcfs|roundrobin|priority> [quantum]"),
    };
    let quantum = match parts.next() {
        Some(q) => match q.parse::<u32>() {
            Ok(n) if n >= 1 => n,
            _ => return format!("setsched: invalid quantum: {}", q),
        },
        None => 5,
    };

    if sys.set_scheduling_algorithm(name, quantum) {
        format!("Scheduler algorithm set to {}", name)
    } else {
        format!("setsched: unknown algorithm: {}", name)
    }
}
