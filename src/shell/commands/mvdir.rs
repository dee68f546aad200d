use crate::kernel::syscall::{status_str, SysApi, SysError};

/// mvdir <src> <dest> — move a directory tree. Moving a directory into
/// itself is rejected.
pub fn run(sys: &dyn SysApi, args: &str) -> String {
    let mut parts = args.split_whitespace();
    let (src, dest) = match (parts.next(), parts.next()) {
        (Some(src), Some(dest)) => (src, dest),
        _ => return String::from("mvdir: usage: mvdir <source> <destination>"),
    };
    let result = sys.move_dir(src, dest);
    match result {
        Ok(()) => String::new(),
        Err(SysError::InvalidArgument) => format!(
            "mvdir: cannot move '{}' to a subdirectory of itself, '{}'",
            src, dest
        ),
        Err(_) => format!("mvdir: {}", status_str(&result)),
    }
}
