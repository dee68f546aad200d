use crate::kernel::syscall::SysApi;

/// cat <file> — print a file's contents.
pub fn run(sys: &dyn SysApi, args: &str) -> String {
    let path = args.trim();
    if path.is_empty() {
        return String::from("cat: usage: cat <filename>");
    }
    match sys.read_file(path) {
        // The stored body carries its own trailing newline; the shell
        // adds one per output, so trim it here.
        Ok(content) => content.trim_end_matches('\n').to_string(),
        Err(e) => format!("cat: {}: {}", path, e),
    }
}
