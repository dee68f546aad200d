use crate::kernel::syscall::SysApi;

/// quit — request an orderly kernel shutdown.
pub fn run(sys: &dyn SysApi, _args: &str) -> String {
    sys.request_shutdown();
    String::from("Shutting down kernel. Goodbye!")
}
