pub mod daemon;
pub mod sysmon;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::kernel::syscall::SysApi;
use crate::kernel::Kernel;
use crate::process::{Pid, SIGKILL, SIGTERM};
use crate::shell::Shell;
use self::daemon::{available_daemons, create_daemon, DaemonHandle};

/// State shared between init and the kernel's signal/shutdown hooks.
struct InitShared {
    daemons: Mutex<Vec<DaemonHandle>>,
    shell_pid: Mutex<Option<Pid>>,
    /// Cue for the interactive loop to wind down.
    shell_stop: Arc<AtomicBool>,
}

/// The PID-1 supervisor: starts the system daemons, owns the shell
/// process, forwards signals, and orchestrates orderly shutdown.
pub struct Init {
    kernel: Kernel,
    sys: Arc<dyn SysApi>,
    shared: Arc<InitShared>,
}

impl Init {
    pub fn new(kernel: Kernel, sys: Arc<dyn SysApi>) -> Self {
        Init {
            kernel,
            sys,
            shared: Arc::new(InitShared {
                daemons: Mutex::new(Vec::new()),
                shell_pid: Mutex::new(None),
                shell_stop: Arc::new(AtomicBool::new(false)),
            }),
        }
    }

    /// Run the init process: become PID 1, bring up daemons and the
    /// shell, block until the interactive session ends, then tear
    /// everything down again.
    pub fn run(&self) {
        log::info!("Init process (PID 1) starting...");

        let init_pid = match self.sys.fork("init", 1, 0, 1, true) {
            Some(pid) => pid,
            None => {
                log::error!("Failed to create init process");
                return;
            }
        };

        self.install_hooks();

        if !self.start_daemons() {
            log::error!("Failed to start system daemons - aborting init");
            self.stop_daemons();
            return;
        }

        log::info!("Waiting for system initialization...");
        self.sys.wait_for_process(init_pid);

        self.run_shell();

        self.stop_daemons();

        // Retire init's own persistent process.
        let _ = self.sys.send_signal(init_pid, SIGTERM);
        self.sys.reap(init_pid);

        log::info!("Init process shutdown complete");
    }

    fn install_hooks(&self) {
        // Signals landing in the process table are forwarded to the
        // matching daemon thread, or stop the shell when they kill it.
        let shared = Arc::clone(&self.shared);
        self.kernel.set_signal_hook(Box::new(move |pid, signal| {
            let shell_pid = *shared.shell_pid.lock();
            if shell_pid == Some(pid) && (signal == SIGKILL || signal == SIGTERM) {
                log::warn!(
                    "Shell process (PID={}) terminated by signal {} - shutting down terminal",
                    pid,
                    signal
                );
                shared.shell_stop.store(true, Ordering::SeqCst);
                return;
            }
            for handle in shared.daemons.lock().iter() {
                if handle.pid() == pid {
                    handle.handle_signal(signal);
                    return;
                }
            }
        }));

        // The kernel's shutdown event is init's cue to end the session.
        let shared = Arc::clone(&self.shared);
        self.kernel.set_shutdown_hook(Box::new(move || {
            log::info!("Received shutdown signal from kernel (SIGTERM)");
            shared.shell_stop.store(true, Ordering::SeqCst);
        }));

        // Command lines posted to the kernel queue run through the same
        // dispatcher the interactive shell uses.
        let sys = Arc::clone(&self.sys);
        self.kernel.set_command_hook(Box::new(move |line| {
            let output = crate::shell::dispatch(sys.as_ref(), line);
            if !output.is_empty() {
                log::info!("[kernel-cmd] {}", output);
            }
        }));
    }

    /// Fork every registered daemon as a persistent process and start its
    /// worker thread. False if any daemon failed to start.
    fn start_daemons(&self) -> bool {
        for name in available_daemons() {
            let daemon = match create_daemon(name) {
                Some(d) => d,
                None => {
                    log::error!("Unknown daemon: {}", name);
                    return false;
                }
            };
            let cycles = daemon.work_cycles();
            let pid = match self.sys.fork(name, cycles, 0, 0, true) {
                Some(pid) => pid,
                None => {
                    log::error!("Failed to fork daemon process '{}'", name);
                    return false;
                }
            };
            let handle = DaemonHandle::spawn(daemon, pid, Arc::clone(&self.sys));
            log::info!("Started daemon '{}' (PID={})", name, pid);
            self.shared.daemons.lock().push(handle);
        }
        true
    }

    /// Signal every daemon, join its worker thread, and reap its process.
    fn stop_daemons(&self) {
        // Signals are sent without holding the registry lock; the kernel's
        // signal hook takes it again to forward the signal.
        let pids: Vec<Pid> = self.shared.daemons.lock().iter().map(|h| h.pid()).collect();
        for pid in pids {
            let _ = self.sys.send_signal(pid, SIGTERM);
        }

        let mut daemons = std::mem::take(&mut *self.shared.daemons.lock());
        for handle in daemons.iter_mut() {
            handle.stop();
            handle.join();
            self.sys.reap(handle.pid());
            log::info!("Daemon '{}' stopped", handle.name());
        }
    }

    /// Fork the shell process and run the interactive session until it
    /// ends or the shell process is killed.
    fn run_shell(&self) {
        log::info!("Starting shell service...");
        let shell_pid = match self.sys.fork("sh", 1, 0, 1, true) {
            Some(pid) => pid,
            None => {
                log::error!("Failed to create shell process");
                return;
            }
        };
        *self.shared.shell_pid.lock() = Some(shell_pid);
        log::info!("Shell process created (PID={})", shell_pid);

        let shell = Shell::new(
            Arc::clone(&self.sys),
            shell_pid,
            Arc::clone(&self.shared.shell_stop),
        );
        shell.run();

        // Shell session over: retire the shell process if it is still
        // around.
        if self.sys.process_exists(shell_pid) {
            let _ = self.sys.send_signal(shell_pid, SIGTERM);
            self.sys.reap(shell_pid);
        }
        *self.shared.shell_pid.lock() = None;
        log::info!("Shell service terminated");
    }
}
