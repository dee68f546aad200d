pub mod commands;

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::kernel::interrupt;
use crate::kernel::syscall::SysApi;
use crate::process::Pid;

/// The interactive shell: a read-line loop over the command dispatcher.
///
/// Every command goes through the syscall facade; the shell never touches
/// kernel tables directly. Commands that submit work follow up with
/// `wait_for_process`, which keeps the session looking sequential while
/// the scheduler decides the actual execution order.
pub struct Shell {
    sys: Arc<dyn SysApi>,
    shell_pid: Pid,
    stop: Arc<AtomicBool>,
}

impl Shell {
    pub fn new(sys: Arc<dyn SysApi>, shell_pid: Pid, stop: Arc<AtomicBool>) -> Self {
        Shell {
            sys,
            shell_pid,
            stop,
        }
    }

    /// Run the session until the user quits, the kernel shuts down, or
    /// the shell process is killed.
    pub fn run(&self) {
        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();

        loop {
            if self.stop.load(Ordering::SeqCst) || !self.sys.is_running() {
                break;
            }
            // A Ctrl+C from a previous command is spent; start clean.
            interrupt::clear();

            print!("{}$ ", self.sys.get_working_dir());
            let _ = io::stdout().flush();

            let line = match lines.next() {
                Some(Ok(line)) => line,
                Some(Err(_)) | None => {
                    // EOF: treat like quit
                    self.sys.request_shutdown();
                    break;
                }
            };

            if self.stop.load(Ordering::SeqCst) {
                break;
            }
            if !self.sys.process_exists(self.shell_pid) {
                log::warn!(
                    "Shell process (PID={}) was killed - shutting down terminal",
                    self.shell_pid
                );
                break;
            }

            let output = dispatch(self.sys.as_ref(), &line);
            if !output.is_empty() {
                println!("{}", output);
            }
        }
    }
}

/// Tokenize a line on whitespace and route it to a command. Returns the
/// command output (possibly empty).
pub fn dispatch(sys: &dyn SysApi, input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let (cmd, args) = match trimmed.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (trimmed, ""),
    };

    match cmd {
        "help" => commands::help::run(sys, args),
        "echo" => commands::echo::run(sys, args),
        "pwd" => commands::pwd::run(sys, args),
        "ls" => commands::ls::run(sys, args),
        "cd" => commands::cd::run(sys, args),
        "mkdir" => commands::mkdir::run(sys, args),
        "rmdir" => commands::rmdir::run(sys, args),
        "touch" => commands::touch::run(sys, args),
        "rm" => commands::rm::run(sys, args),
        "cat" => commands::cat::run(sys, args),
        "write" => commands::write::run(sys, args),
        "edit" => commands::edit::run(sys, args),
        "cp" => commands::cp::run(sys, args),
        "mv" => commands::mv::run(sys, args),
        "cpdir" => commands::cpdir::run(sys, args),
        "mvdir" => commands::mvdir::run(sys, args),
        "ps" => commands::ps::run(sys, args),
        "kill" => commands::kill::run(sys, args),
        "spawn" => commands::spawn::run(sys, args),
        "meminfo" => commands::meminfo::run(sys, args),
        "uptime" => commands::uptime::run(sys, args),
        "save" => commands::save::run(sys, args),
        "load" => commands::load::run(sys, args),
        "listdata" => commands::listdata::run(sys, args),
        "reset" => commands::reset::run(sys, args),
        "setsched" => commands::setsched::run(sys, args),
        "setcycles" => commands::setcycles::run(sys, args),
        "settick" => commands::settick::run(sys, args),
        "loglevel" => commands::loglevel::run(sys, args),
        "quit" | "exit" => commands::quit::run(sys, args),
        _ => format!("{}: command not found", cmd),
    }
}
