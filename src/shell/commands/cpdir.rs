use crate::kernel::syscall::{status_str, SysApi};

/// cpdir <src> <dest> — copy a directory tree.
pub fn run(sys: &dyn SysApi, args: &str) -> String {
    let mut parts = args.split_whitespace();
    let (src, dest) = match (parts.next(), parts.next()) {
        (Some(src), Some(dest)) => (src, dest),
        _ => return String::from("cpdir: usage: cpdir <source> <destination>"),
    };
    let result = sys.copy_dir(src, dest);
    match result {
        Ok(()) => String::new(),
        Err(_) => format!("cpdir: {}", status_str(&result)),
    }
}
