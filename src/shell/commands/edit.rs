use crate::kernel::syscall::{status_str, SysApi};

/// edit <file> <content> — append a line to a file.
pub fn run(sys: &dyn SysApi, args: &str) -> String {
    let (path, content) = match args.split_once(char::is_whitespace) {
        Some((path, content)) => (path, content),
        None => return String::from("edit: usage: edit <filename> <content>"),
    };
    let suffix = format!("{}\n", content);
    let result = sys.edit_file(path, &suffix);
    match result {
        Ok(()) => format!("Appended to file: {}", path),
        Err(_) => format!("edit: {}: {}", path, status_str(&result)),
    }
}
