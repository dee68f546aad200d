use crate::kernel::syscall::SysApi;

/// echo [text] — print the arguments back.
pub fn run(_sys: &dyn SysApi, args: &str) -> String {
    args.to_string()
}
