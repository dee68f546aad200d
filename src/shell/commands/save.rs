use crate::kernel::syscall::{status_str, SysApi};

/// save <name> — snapshot the filesystem to the data directory.
pub fn run(sys: &dyn SysApi, args: &str) -> String {
    let name = args.trim();
    if name.is_empty() {
        return String::from("save: usage: save <name>");
    }
    let result = sys.save_to_disk(name);
    match result {
        Ok(()) => format!("Storage saved as '{}'", name),
        Err(_) => format!("save: {}", status_str(&result)),
    }
}
