use crate::kernel::syscall::{SysApi, SysError};

/// cd <path> — change the working directory.
pub fn run(sys: &dyn SysApi, args: &str) -> String {
    let target = args.trim();
    if target.is_empty() {
        return String::from("cd: usage: cd <directory>");
    }

    match sys.change_dir(target) {
        Ok(()) => String::new(),
        Err(SysError::AtRoot) => String::from("Already at root folder."),
        Err(SysError::NotFound) => format!("cd: {}: No such directory", target),
        Err(e) => format!("cd: {}: {}", target, e),
    }
}
