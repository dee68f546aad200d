use crate::kernel::syscall::{status_str, SysApi};

/// touch <file> — create a file, or refresh its timestamp if present.
pub fn run(sys: &dyn SysApi, args: &str) -> String {
    let path = args.trim();
    if path.is_empty() {
        return String::from("touch: usage: touch <filename>");
    }
    let result = sys.touch_file(path);
    match result {
        Ok(()) => String::new(),
        Err(_) => format!("touch: {}: {}", path, status_str(&result)),
    }
}
