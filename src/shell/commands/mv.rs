use crate::kernel::syscall::{status_str, SysApi};

/// mv <src> <dest> — move or rename a file.
pub fn run(sys: &dyn SysApi, args: &str) -> String {
    let mut parts = args.split_whitespace();
    let (src, dest) = match (parts.next(), parts.next()) {
        (Some(src), Some(dest)) => (src, dest),
        _ => return String::from("mv: usage: mv <source> <destination>"),
    };
    let result = sys.move_file(src, dest);
    match result {
        Ok(()) => String::new(),
        Err(_) => format!("mv: {}", status_str(&result)),
    }
}
