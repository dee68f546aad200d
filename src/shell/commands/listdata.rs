use crate::kernel::syscall::{SysApi, SysError};

/// listdata — list saved snapshots.
pub fn run(sys: &dyn SysApi, _args: &str) -> String {
    match sys.list_data_files() {
        Ok(names) => names.join("\n"),
        Err(SysError::NotFound) => String::from("No saved data files"),
        Err(e) => format!("listdata: {}", e),
    }
}
