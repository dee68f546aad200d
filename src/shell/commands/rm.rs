use crate::kernel::syscall::{status_str, SysApi};

/// rm <file> — delete a file.
pub fn run(sys: &dyn SysApi, args: &str) -> String {
    let path = args.trim();
    if path.is_empty() {
        return String::from("rm: usage: rm <filename>");
    }
    let result = sys.delete_file(path);
    match result {
        Ok(()) => String::new(),
        Err(_) => format!("rm: {}: {}", path, status_str(&result)),
    }
}
