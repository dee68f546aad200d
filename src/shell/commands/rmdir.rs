use crate::kernel::syscall::{status_str, SysApi};

/// rmdir <path> — remove a directory tree.
pub fn run(sys: &dyn SysApi, args: &str) -> String {
    let path = args.trim();
    if path.is_empty() {
        return String::from("rmdir: usage: rmdir <directory>");
    }
    let result = sys.remove_dir(path);
    match result {
        Ok(()) => format!("Removed directory: {}", path),
        Err(_) => format!("rmdir: {}: {}", path, status_str(&result)),
    }
}
