use crate::kernel::syscall::{status_str, SysApi};

/// mkdir <path> — create a directory.
pub fn run(sys: &dyn SysApi, args: &str) -> String {
    let path = args.trim();
    if path.is_empty() {
        return String::from("mkdir: usage: mkdir <directory>");
    }
    let result = sys.make_dir(path);
    match result {
        Ok(()) => format!("Created directory: {}", path),
        Err(_) => format!("mkdir: {}: {}", path, status_str(&result)),
    }
}
