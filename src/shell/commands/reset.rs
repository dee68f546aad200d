use crate::kernel::syscall::{status_str, SysApi};

/// reset — discard the whole filesystem tree.
pub fn run(sys: &dyn SysApi, _args: &str) -> String {
    let result = sys.reset_storage();
    match result {
        Ok(()) => String::from("Storage reset"),
        Err(_) => format!("reset: {}", status_str(&result)),
    }
}
