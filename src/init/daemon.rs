use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::kernel::syscall::SysApi;
use crate::process::{Pid, SIGCONT, SIGKILL, SIGSTOP, SIGTERM};

/// A long-running background service, similar to a systemd unit.
///
/// Each daemon is backed by a persistent kernel process and a worker
/// thread. The thread sleeps for the work interval, buys CPU time from the
/// scheduler with `add_cpu_work`, and then performs one work cycle.
pub trait Daemon: Send {
    fn name(&self) -> &str;

    /// One work cycle, invoked after the scheduler has granted CPU time.
    fn do_work(&mut self, sys: &dyn SysApi);

    /// CPU cycles requested per work cycle.
    fn work_cycles(&self) -> u32 {
        5
    }

    /// Real-time pause between work cycles.
    fn work_interval(&self) -> Duration {
        Duration::from_secs(10)
    }
}

/// Running daemon: its PID, its control flags, and its worker thread.
pub struct DaemonHandle {
    name: String,
    pid: Pid,
    running: Arc<AtomicBool>,
    suspended: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl DaemonHandle {
    /// Spawn the worker thread for `daemon`, already forked as `pid`.
    pub fn spawn(mut daemon: Box<dyn Daemon>, pid: Pid, sys: Arc<dyn SysApi>) -> Self {
        let name = daemon.name().to_string();
        let running = Arc::new(AtomicBool::new(true));
        let suspended = Arc::new(AtomicBool::new(false));

        let thread_running = Arc::clone(&running);
        let thread_suspended = Arc::clone(&suspended);
        let thread_name = name.clone();
        let thread = thread::Builder::new()
            .name(format!("daemon-{}", name))
            .spawn(move || {
                log::info!("[{}] daemon started (PID={})", thread_name, pid);
                while thread_running.load(Ordering::SeqCst) {
                    // Sleep in short steps so stop requests are noticed
                    // promptly.
                    let interval = daemon.work_interval();
                    let mut slept = Duration::ZERO;
                    while slept < interval && thread_running.load(Ordering::SeqCst) {
                        let step = Duration::from_millis(50).min(interval - slept);
                        thread::sleep(step);
                        slept += step;
                    }
                    if !thread_running.load(Ordering::SeqCst) {
                        break;
                    }
                    if thread_suspended.load(Ordering::SeqCst) {
                        continue;
                    }

                    sys.add_cpu_work(pid, daemon.work_cycles());
                    daemon.do_work(sys.as_ref());
                }
                log::info!("[{}] daemon stopped", thread_name);
            })
            .ok();

        DaemonHandle {
            name,
            pid,
            running,
            suspended,
            thread,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// React to a signal forwarded by init.
    pub fn handle_signal(&self, signal: i32) {
        log::info!("[{}] received signal {}", self.name, signal);
        match signal {
            SIGKILL | SIGTERM => {
                log::info!("[{}] termination signal received, stopping daemon", self.name);
                self.running.store(false, Ordering::SeqCst);
            }
            SIGSTOP => {
                log::info!("[{}] suspending daemon operations", self.name);
                self.suspended.store(true, Ordering::SeqCst);
            }
            SIGCONT => {
                log::info!("[{}] resuming daemon operations", self.name);
                self.suspended.store(false, Ordering::SeqCst);
            }
            _ => {
                log::warn!("[{}] unknown signal {}", self.name, signal);
            }
        }
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Factory table mapping daemon names to constructors.
pub fn create_daemon(name: &str) -> Option<Box<dyn Daemon>> {
    match name {
        "sysmon" => Some(Box::new(super::sysmon::MonitoringDaemon::new())),
        _ => None,
    }
}

/// Names of every daemon init should start.
pub fn available_daemons() -> Vec<&'static str> {
    vec!["sysmon"]
}
