use crate::kernel::syscall::{status_str, SysApi};

/// load <name> — replace the filesystem with a snapshot.
pub fn run(sys: &dyn SysApi, args: &str) -> String {
    let name = args.trim();
    if name.is_empty() {
        return String::from("load: usage: load <name>");
    }
    let result = sys.load_from_disk(name);
    match result {
        Ok(()) => format!("Storage loaded from '{}'", name),
        Err(_) => format!("load: {}: {}", name, status_str(&result)),
    }
}
