pub mod interrupt;
pub mod syscall;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::config::Config;
use crate::fs::{FsError, FsTree};
use crate::memory::{MemToken, MemoryPool};
use crate::process::{CompletionGate, Pid, ProcessInfo, ProcessTable};
use crate::sched::{Algorithm, CpuScheduler, TickResult};
use self::syscall::{SysError, SysInfo, SysResult};

/// Events carried by the kernel queue.
#[derive(Debug)]
pub enum KernelEvent {
    /// A command line submitted for background execution.
    Command(String),
    /// Orderly shutdown request.
    Shutdown,
}

type CommandHook = Box<dyn Fn(&str) + Send>;
type ShutdownHook = Box<dyn Fn() + Send>;
type SignalHook = Box<dyn Fn(Pid, i32) + Send>;

struct EventQueue {
    queue: Mutex<VecDeque<KernelEvent>>,
    cv: Condvar,
}

impl EventQueue {
    fn new() -> Self {
        EventQueue {
            queue: Mutex::new(VecDeque::new()),
            cv: Condvar::new(),
        }
    }

    fn push(&self, event: KernelEvent) {
        self.queue.lock().push_back(event);
        self.cv.notify_one();
    }

    fn pop_timeout(&self, timeout: Duration) -> Option<KernelEvent> {
        let mut queue = self.queue.lock();
        if queue.is_empty() {
            self.cv.wait_for(&mut queue, timeout);
        }
        queue.pop_front()
    }
}

/// How long the tick loop keeps draining after a shutdown request before
/// it gives up on stragglers.
const DRAIN_DEADLINE: Duration = Duration::from_secs(5);

struct KernelInner {
    table: Mutex<ProcessTable>,
    sched: Mutex<CpuScheduler>,
    pool: Mutex<MemoryPool>,
    fs: Mutex<FsTree>,
    events: EventQueue,
    /// PIDs whose burst reached zero, recorded by the scheduler's
    /// completion hook and routed to the process table outside the
    /// scheduler lock. Shared with the hook closure, so it must not hold
    /// the kernel itself alive.
    completions: Arc<Mutex<VecDeque<Pid>>>,
    running: AtomicBool,
    draining: AtomicBool,
    tick_thread: Mutex<Option<JoinHandle<()>>>,
    command_hook: Mutex<Option<CommandHook>>,
    shutdown_hook: Mutex<Option<ShutdownHook>>,
    signal_hook: Mutex<Option<SignalHook>>,
}

/// The kernel context: one object owning every subsystem, shared by
/// reference counting. Cloning is cheap and hands out the same kernel.
///
/// Lock order across subsystems is process table -> scheduler -> memory
/// pool; the filesystem has its own coarse lock and only ever nests the
/// pool inside it.
#[derive(Clone)]
pub struct Kernel {
    inner: Arc<KernelInner>,
}

impl Kernel {
    pub fn new(config: &Config) -> Self {
        let kernel = Kernel {
            inner: Arc::new(KernelInner {
                table: Mutex::new(ProcessTable::new()),
                sched: Mutex::new(CpuScheduler::new(
                    config.scheduler_algorithm,
                    config.cycles_per_tick,
                    config.tick_interval_ms,
                )),
                pool: Mutex::new(MemoryPool::new(config.memory_size)),
                fs: Mutex::new(FsTree::new(config.data_dir.clone())),
                events: EventQueue::new(),
                completions: Arc::new(Mutex::new(VecDeque::new())),
                running: AtomicBool::new(false),
                draining: AtomicBool::new(false),
                tick_thread: Mutex::new(None),
                command_hook: Mutex::new(None),
                shutdown_hook: Mutex::new(None),
                signal_hook: Mutex::new(None),
            }),
        };

        // Wire the one-way completion callback: the scheduler records the
        // PID, the tick loop routes it into the process table once the
        // scheduler lock is released.
        let completions = Arc::clone(&kernel.inner.completions);
        kernel
            .inner
            .sched
            .lock()
            .set_completion_hook(Box::new(move |pid| {
                completions.lock().push_back(pid);
            }));

        kernel
    }

    /// Start the tick loop thread. The kernel runs until a shutdown
    /// request has finished draining.
    pub fn boot(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            log::warn!("Kernel already booted");
            return;
        }
        self.inner.draining.store(false, Ordering::SeqCst);

        let inner = Arc::clone(&self.inner);
        let handle = thread::Builder::new()
            .name("kernel-tick".into())
            .spawn(move || run_event_loop(&inner))
            .ok();
        *self.inner.tick_thread.lock() = handle;
        log::info!("Kernel booted");
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Queue a command line for the event loop.
    pub fn submit_command(&self, line: &str) {
        self.inner.events.push(KernelEvent::Command(line.to_string()));
    }

    /// Begin an orderly shutdown: init is signaled, every process drains
    /// through ZOMBIE, the tick loop exits once no work remains.
    pub fn request_shutdown(&self) {
        self.inner.events.push(KernelEvent::Shutdown);
    }

    /// Wait for the tick loop to finish.
    pub fn join(&self) {
        let handle = self.inner.tick_thread.lock().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    /// Hook invoked for `KernelEvent::Command` lines.
    pub fn set_command_hook(&self, hook: CommandHook) {
        *self.inner.command_hook.lock() = Some(hook);
    }

    /// Hook invoked once when shutdown begins (init's cue to stop the
    /// shell and daemons).
    pub fn set_shutdown_hook(&self, hook: ShutdownHook) {
        *self.inner.shutdown_hook.lock() = Some(hook);
    }

    /// Hook invoked after a signal lands in the process table, so init can
    /// forward it to daemon threads and the shell.
    pub fn set_signal_hook(&self, hook: SignalHook) {
        *self.inner.signal_hook.lock() = Some(hook);
    }

    // ---- subsystem access used by the syscall facade ----

    pub(crate) fn with_fs<T>(
        &self,
        f: impl FnOnce(&mut FsTree, &mut MemoryPool) -> Result<T, FsError>,
    ) -> Result<T, FsError> {
        let mut fs = self.inner.fs.lock();
        let mut pool = self.inner.pool.lock();
        f(&mut fs, &mut pool)
    }

    pub(crate) fn submit(
        &self,
        name: &str,
        cycles: u32,
        memory: usize,
        priority: i32,
        persistent: bool,
    ) -> Option<Pid> {
        let mut table = self.inner.table.lock();
        let mut sched = self.inner.sched.lock();
        let mut pool = self.inner.pool.lock();
        table.submit(&mut sched, &mut pool, name, cycles, memory, priority, persistent)
    }

    pub(crate) fn send_signal(&self, pid: Pid, signal: i32) -> SysResult {
        let delivered = {
            let mut table = self.inner.table.lock();
            let mut sched = self.inner.sched.lock();
            let mut pool = self.inner.pool.lock();
            table.send_signal(&mut sched, &mut pool, pid, signal)
        };
        if !delivered {
            return Err(SysError::NotFound);
        }
        if let Some(hook) = &*self.inner.signal_hook.lock() {
            hook(pid, signal);
        }
        Ok(())
    }

    pub(crate) fn exit(&self, pid: Pid, code: i32) -> bool {
        let mut table = self.inner.table.lock();
        let mut sched = self.inner.sched.lock();
        let mut pool = self.inner.pool.lock();
        table.exit(&mut sched, &mut pool, pid, code)
    }

    pub(crate) fn reap(&self, pid: Pid) -> bool {
        self.inner.table.lock().reap(pid)
    }

    pub(crate) fn gate(&self, pid: Pid) -> Option<Arc<CompletionGate>> {
        self.inner.table.lock().gate(pid)
    }

    pub(crate) fn process_exists(&self, pid: Pid) -> bool {
        self.inner.table.lock().exists(pid)
    }

    pub(crate) fn process_list(&self) -> Vec<ProcessInfo> {
        self.inner.table.lock().snapshot()
    }

    pub(crate) fn add_cpu_work(&self, pid: Pid, cycles: u32) -> bool {
        let mut table = self.inner.table.lock();
        let mut sched = self.inner.sched.lock();
        table.add_cpu_work(&mut sched, pid, cycles)
    }

    pub(crate) fn allocate_memory(&self, size: usize, owner: Pid) -> Option<MemToken> {
        self.inner.pool.lock().allocate(size, owner)
    }

    pub(crate) fn deallocate_memory(&self, token: MemToken) -> bool {
        self.inner.pool.lock().deallocate(token)
    }

    pub(crate) fn sys_info(&self) -> SysInfo {
        let pool = self.inner.pool.lock();
        SysInfo {
            total_memory: pool.total(),
            used_memory: pool.used(),
        }
    }

    pub(crate) fn set_algorithm(&self, algorithm: Algorithm) {
        self.inner.sched.lock().set_algorithm(algorithm);
    }

    pub(crate) fn set_cycles_per_tick(&self, cycles: u32) {
        self.inner.sched.lock().set_cycles_per_tick(cycles);
    }

    pub(crate) fn set_tick_interval_ms(&self, ms: u64) {
        self.inner.sched.lock().set_tick_interval_ms(ms);
    }

    pub(crate) fn system_ticks(&self) -> u64 {
        self.inner.sched.lock().system_tick()
    }

    pub fn has_work(&self) -> bool {
        self.inner.sched.lock().has_work()
    }

    /// Advance the virtual clock one tick and run all resulting
    /// bookkeeping. Exposed so tests can drive the kernel without the
    /// real-time loop.
    pub fn tick_once(&self) -> TickResult {
        let (previous, result) = {
            let mut sched = self.inner.sched.lock();
            let previous = sched.current_pid();
            (previous, sched.tick())
        };

        {
            let mut table = self.inner.table.lock();
            table.note_dispatch(previous, result.current);
            if let Some(current) = result.current {
                table.update_remaining(current, result.remaining_cycles);
            }
        }

        // Route completions recorded by the scheduler hook.
        loop {
            let pid = match self.inner.completions.lock().pop_front() {
                Some(pid) => pid,
                None => break,
            };
            let mut table = self.inner.table.lock();
            let mut sched = self.inner.sched.lock();
            let mut pool = self.inner.pool.lock();
            table.on_scheduler_complete(&mut sched, &mut pool, pid);
        }

        result
    }
}

/// The kernel event loop: tick at the configured cadence while work
/// remains, drain command and shutdown events in between.
fn run_event_loop(inner: &Arc<KernelInner>) {
    log::info!("Kernel event loop started");
    let kernel = Kernel {
        inner: Arc::clone(inner),
    };
    let mut drain_started = None;

    while inner.running.load(Ordering::SeqCst) {
        let interval = inner.sched.lock().tick_interval_ms();
        match inner.events.pop_timeout(Duration::from_millis(interval)) {
            Some(KernelEvent::Command(line)) => {
                log::debug!("Kernel event: command '{}'", line);
                if let Some(hook) = &*inner.command_hook.lock() {
                    hook(&line);
                }
            }
            Some(KernelEvent::Shutdown) => {
                log::info!("Kernel event: shutdown");
                inner.draining.store(true, Ordering::SeqCst);
                drain_started = Some(std::time::Instant::now());
                if let Some(hook) = &*inner.shutdown_hook.lock() {
                    hook();
                }
            }
            None => {}
        }

        if kernel.has_work() {
            kernel.tick_once();
        }

        if inner.draining.load(Ordering::SeqCst) {
            let deadline_passed = drain_started
                .map(|t| t.elapsed() > DRAIN_DEADLINE)
                .unwrap_or(false);
            if !kernel.has_work() || deadline_passed {
                if deadline_passed {
                    log::warn!("Shutdown drain deadline reached with work remaining");
                }
                inner.running.store(false, Ordering::SeqCst);
            }
        }
    }
    log::info!("Kernel event loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{ProcessState, SIGTERM};

    fn test_kernel() -> Kernel {
        let config = Config {
            memory_size: 4096,
            tick_interval_ms: 1,
            ..Config::default()
        };
        Kernel::new(&config)
    }

    #[test]
    fn tick_once_runs_submitted_work_to_completion() {
        let kernel = test_kernel();
        let pid = kernel.submit("job", 3, 128, 1, false).unwrap();

        assert!(kernel.has_work());
        for _ in 0..3 {
            kernel.tick_once();
        }
        assert!(!kernel.process_exists(pid));
        assert_eq!(kernel.sys_info().used_memory, 0);
    }

    #[test]
    fn dispatch_marks_processes_running() {
        let kernel = test_kernel();
        let pid = kernel.submit("job", 5, 0, 1, false).unwrap();
        kernel.tick_once();

        let list = kernel.process_list();
        let info = list.iter().find(|p| p.pid == pid).unwrap();
        assert_eq!(info.state, ProcessState::Running);
    }

    #[test]
    fn persistent_processes_survive_completion() {
        let kernel = test_kernel();
        let pid = kernel.submit("daemon", 2, 0, 1, true).unwrap();

        for _ in 0..6 {
            kernel.tick_once();
        }
        assert!(kernel.process_exists(pid));
        assert!(kernel.has_work());
    }

    #[test]
    fn event_loop_completes_work_and_signals_waiters() {
        let kernel = test_kernel();
        kernel.boot();

        let pid = kernel.submit("job", 3, 64, 1, false).unwrap();
        let gate = kernel.gate(pid).unwrap();
        assert!(gate.wait(|| false));
        assert!(!kernel.process_exists(pid));

        kernel.request_shutdown();
        kernel.join();
        assert!(!kernel.is_running());
    }

    #[test]
    fn command_events_reach_the_hook() {
        use std::sync::mpsc;

        let kernel = test_kernel();
        let (tx, rx) = mpsc::channel();
        kernel.set_command_hook(Box::new(move |line| {
            let _ = tx.send(line.to_string());
        }));
        kernel.boot();

        kernel.submit_command("echo hi");
        let line = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(line, "echo hi");

        kernel.request_shutdown();
        kernel.join();
    }

    #[test]
    fn killed_process_unblocks_waiter_with_false() {
        let kernel = test_kernel();
        kernel.boot();

        // a long job that will not finish on its own soon
        let pid = kernel.submit("long", 100_000, 0, 1, false).unwrap();
        let gate = kernel.gate(pid).unwrap();

        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.wait(|| false))
        };
        thread::sleep(Duration::from_millis(20));
        kernel.send_signal(pid, SIGTERM).unwrap();

        assert!(!waiter.join().unwrap());
        kernel.request_shutdown();
        kernel.join();
    }
}
