use crate::kernel::syscall::{status_str, SysApi};

/// write <file> <content> — replace a file's contents.
pub fn run(sys: &dyn SysApi, args: &str) -> String {
    let (path, content) = match args.split_once(char::is_whitespace) {
        Some((path, content)) => (path, content),
        None => return String::from("write: usage: write <filename> <content>"),
    };
    let result = sys.write_file(path, content);
    match result {
        Ok(()) => format!("Wrote to file: {}", path),
        Err(_) => format!("write: {}: {}", path, status_str(&result)),
    }
}
