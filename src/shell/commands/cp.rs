use crate::kernel::syscall::{status_str, SysApi};

/// cp <src> <dest> — copy a file. Copying onto an existing directory
/// places the copy inside it.
pub fn run(sys: &dyn SysApi, args: &str) -> String {
    let mut parts = args.split_whitespace();
    let (src, dest) = match (parts.next(), parts.next()) {
        (Some(src), Some(dest)) => (src, dest),
        _ => return String::from("cp: usage: cp <source> <destination>"),
    };
    let result = sys.copy_file(src, dest);
    match result {
        Ok(()) => String::new(),
        Err(_) => format!("cp: {}", status_str(&result)),
    }
}
