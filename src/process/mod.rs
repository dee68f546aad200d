pub mod process;
pub mod table;

pub use self::process::{
    CompletionGate, Pid, Process, ProcessState, SIGCONT, SIGKILL, SIGSTOP, SIGTERM,
};
pub use self::table::{ProcessInfo, ProcessTable};
