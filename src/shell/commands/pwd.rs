use crate::kernel::syscall::SysApi;

/// pwd — print the working directory.
pub fn run(sys: &dyn SysApi, _args: &str) -> String {
    sys.get_working_dir()
}
