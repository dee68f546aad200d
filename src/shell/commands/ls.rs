use crate::kernel::syscall::SysApi;

/// ls [path] — list a directory, subdirectories first.
pub fn run(sys: &dyn SysApi, args: &str) -> String {
    let path = args.trim();
    match sys.list_dir(path) {
        Ok(entries) => {
            if entries.is_empty() {
                String::from("(empty)")
            } else {
                entries.join("\n")
            }
        }
        Err(e) => format!("ls: {}: {}", path, e),
    }
}
