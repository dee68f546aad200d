use std::sync::Arc;

use super::process::{CompletionGate, Pid, Process, ProcessState, SIGCONT, SIGKILL, SIGSTOP, SIGTERM};
use crate::memory::MemoryPool;
use crate::sched::CpuScheduler;

/// By-value view of a process record, for `ps` and tests.
#[derive(Debug, Clone)]
pub struct ProcessInfo {
    pub pid: Pid,
    pub name: String,
    pub state: ProcessState,
    pub priority: i32,
    pub remaining_cycles: u32,
    pub memory: usize,
    pub persistent: bool,
}

/// Owns every live process record and enforces the state machine.
///
/// The table drives the scheduler (enqueue/suspend/remove) and the memory
/// pool (allocate on submit, free on termination); the scheduler calls back
/// in through `on_scheduler_complete` when a burst reaches zero. Callers
/// pass the scheduler and pool in explicitly so the lock order stays
/// process table -> scheduler -> memory pool throughout the kernel.
pub struct ProcessTable {
    next_pid: u32,
    table: Vec<Process>,
}

impl ProcessTable {
    pub fn new() -> Self {
        ProcessTable {
            next_pid: 1, // 0 is reserved for the kernel
            table: Vec::new(),
        }
    }

    fn find(&self, pid: Pid) -> Option<&Process> {
        self.table.iter().find(|p| p.pid == pid)
    }

    fn find_mut(&mut self, pid: Pid) -> Option<&mut Process> {
        self.table.iter_mut().find(|p| p.pid == pid)
    }

    pub fn exists(&self, pid: Pid) -> bool {
        self.find(pid).is_some()
    }

    pub fn state(&self, pid: Pid) -> Option<ProcessState> {
        self.find(pid).map(|p| p.state())
    }

    pub fn is_persistent(&self, pid: Pid) -> bool {
        self.find(pid).map(|p| p.persistent).unwrap_or(false)
    }

    /// Completion gate of a live process, for the wait/reap rendezvous.
    pub fn gate(&self, pid: Pid) -> Option<Arc<CompletionGate>> {
        self.find(pid).map(|p| Arc::clone(&p.gate))
    }

    /// Create a process, back it with pool memory, and hand it to the
    /// scheduler. Returns None on invalid parameters.
    ///
    /// A failed memory allocation does not cancel the submit: the PID is
    /// live and scheduled, the record just owns no block. The pool has
    /// already logged the failure; we add a warning with the PID.
    pub fn submit(
        &mut self,
        sched: &mut CpuScheduler,
        pool: &mut MemoryPool,
        name: &str,
        cycles: u32,
        memory: usize,
        priority: i32,
        persistent: bool,
    ) -> Option<Pid> {
        if name.is_empty() || cycles < 1 {
            log::error!(
                "Invalid process parameters: name={:?}, cycles={}, memory={}",
                name,
                cycles,
                memory
            );
            return None;
        }

        let pid = Pid(self.next_pid);
        self.next_pid += 1;

        let mut process = Process::new(name, pid, cycles, memory, priority, Pid(0));
        process.persistent = persistent;
        if !process.make_ready() {
            log::error!("Failed to initialize process '{}'", name);
            return None;
        }

        process.memory_token = pool.allocate(memory, pid);
        if process.memory_token.is_none() {
            log::warn!("Process '{}' (PID={}) submitted without memory backing", name, pid);
        }

        self.table.push(process);
        sched.enqueue(pid, cycles, priority);

        log::info!(
            "Submitted process '{}' (PID={}, cycles={}, priority={})",
            name,
            pid,
            cycles,
            priority
        );
        Some(pid)
    }

    /// Route a signal number to the state machine. False when the PID is
    /// unknown; unrecognized signals are logged and otherwise ignored.
    pub fn send_signal(
        &mut self,
        sched: &mut CpuScheduler,
        pool: &mut MemoryPool,
        pid: Pid,
        signal: i32,
    ) -> bool {
        let name = match self.find(pid) {
            Some(p) => p.name.clone(),
            None => {
                log::warn!("Cannot send signal to PID {}: not found", pid);
                return false;
            }
        };
        log::info!("Sending signal {} to process '{}' (PID={})", signal, name, pid);

        match signal {
            SIGSTOP => self.suspend_process(sched, pid),
            SIGCONT => self.resume_process(sched, pid),
            SIGKILL | SIGTERM => {
                log::info!("Terminating process '{}' (PID={})", name, pid);
                self.terminate(sched, pool, pid);
                true
            }
            _ => {
                log::warn!("Signal {} not implemented", signal);
                true
            }
        }
    }

    /// Shared TERM/KILL/exit bookkeeping: out of the scheduler, memory
    /// freed, record becomes a ZOMBIE awaiting reap.
    fn terminate(&mut self, sched: &mut CpuScheduler, pool: &mut MemoryPool, pid: Pid) {
        sched.remove(pid);
        pool.free_owner(pid);
        if let Some(process) = self.find_mut(pid) {
            process.memory_token = None;
            process.make_zombie();
            process.gate.signal(false);
        }
    }

    /// Voluntary termination. The waiter outcome reflects the exit code.
    pub fn exit(
        &mut self,
        sched: &mut CpuScheduler,
        pool: &mut MemoryPool,
        pid: Pid,
        code: i32,
    ) -> bool {
        let process = match self.find(pid) {
            Some(p) => p,
            None => return false,
        };
        log::info!("Process '{}' (PID={}) exiting with code {}", process.name, pid, code);

        sched.remove(pid);
        pool.free_owner(pid);
        if let Some(process) = self.find_mut(pid) {
            process.memory_token = None;
            process.make_zombie();
            process.gate.signal(code == 0);
        }
        true
    }

    /// ZOMBIE -> TERMINATED; the record is removed and the PID retired.
    pub fn reap(&mut self, pid: Pid) -> bool {
        match self.find_mut(pid) {
            Some(process) => {
                if !process.reap() {
                    return false;
                }
                self.table.retain(|p| p.pid != pid);
                log::info!("Reaped process {}", pid);
                true
            }
            None => false,
        }
    }

    pub fn suspend_process(&mut self, sched: &mut CpuScheduler, pid: Pid) -> bool {
        match self.find_mut(pid) {
            Some(process) => {
                sched.suspend(pid);
                process.suspend()
            }
            None => {
                log::error!("Cannot suspend process: PID {} not found", pid);
                false
            }
        }
    }

    pub fn resume_process(&mut self, sched: &mut CpuScheduler, pid: Pid) -> bool {
        match self.find_mut(pid) {
            Some(process) => {
                sched.resume(pid);
                process.resume()
            }
            None => {
                log::error!("Cannot resume process: PID {} not found", pid);
                false
            }
        }
    }

    /// Invoked when the scheduler reports a burst reaching zero.
    ///
    /// Persistent processes get their budget refilled and go straight back
    /// to READY; everything else is unwound completely - the kernel reaps
    /// non-persistent processes itself in this simulation.
    pub fn on_scheduler_complete(
        &mut self,
        sched: &mut CpuScheduler,
        pool: &mut MemoryPool,
        pid: Pid,
    ) {
        let (name, persistent, cycles, priority) = match self.find(pid) {
            Some(p) => (p.name.clone(), p.persistent, p.cycles, p.priority),
            None => return,
        };

        if persistent {
            log::debug!(
                "Persistent process '{}' (PID={}) cycle completed, keeping alive",
                name,
                pid
            );
            if let Some(process) = self.find_mut(pid) {
                process.remaining_cycles = cycles;
                if process.state() == ProcessState::Running {
                    process.preempt();
                }
                process.gate.signal(true);
            }
            sched.enqueue(pid, cycles, priority);
            return;
        }

        log::info!("Process '{}' (PID={}) completed", name, pid);
        pool.free_owner(pid);
        if let Some(process) = self.find_mut(pid) {
            process.memory_token = None;
            process.gate.signal(true);
            process.make_zombie();
            process.reap();
        }
        self.table.retain(|p| p.pid != pid);
    }

    /// Grant extra CPU cycles to a live, non-zombie process.
    pub fn add_cpu_work(&mut self, sched: &mut CpuScheduler, pid: Pid, cycles: u32) -> bool {
        let (state, priority) = match self.find(pid) {
            Some(p) => (p.state(), p.priority),
            None => return false,
        };
        if state == ProcessState::Zombie || state == ProcessState::Terminated {
            return false;
        }

        if let Some(process) = self.find_mut(pid) {
            process.remaining_cycles += cycles;
        }
        if !sched.add_burst(pid, cycles) {
            let remaining = self.find(pid).map(|p| p.remaining_cycles).unwrap_or(cycles);
            sched.enqueue(pid, remaining, priority);
        }
        true
    }

    /// Mirror a scheduler dispatch into the state machine: the preempted
    /// process drops back to READY, the dispatched one becomes RUNNING.
    pub fn note_dispatch(&mut self, previous: Option<Pid>, current: Option<Pid>) {
        if previous == current {
            return;
        }
        if let Some(prev) = previous {
            if let Some(p) = self.find_mut(prev) {
                if p.state() == ProcessState::Running {
                    p.preempt();
                }
            }
        }
        if let Some(cur) = current {
            if let Some(p) = self.find_mut(cur) {
                if p.state() == ProcessState::Ready {
                    p.start();
                }
            }
        }
    }

    /// Keep the record's remaining-cycles in step with the scheduler.
    pub fn update_remaining(&mut self, pid: Pid, remaining: u32) {
        if let Some(p) = self.find_mut(pid) {
            p.remaining_cycles = remaining;
        }
    }

    /// By-value copy of every live record, for display.
    pub fn snapshot(&self) -> Vec<ProcessInfo> {
        self.table
            .iter()
            .map(|p| ProcessInfo {
                pid: p.pid,
                name: p.name.clone(),
                state: p.state(),
                priority: p.priority,
                remaining_cycles: p.remaining_cycles,
                memory: p.memory,
                persistent: p.persistent,
            })
            .collect()
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sched::Algorithm;

    fn setup() -> (ProcessTable, CpuScheduler, MemoryPool) {
        (
            ProcessTable::new(),
            CpuScheduler::new(Algorithm::Fcfs, 1, 100),
            MemoryPool::new(4096),
        )
    }

    #[test]
    fn submit_assigns_distinct_pids_and_backs_memory() {
        let (mut table, mut sched, mut pool) = setup();
        let a = table.submit(&mut sched, &mut pool, "a", 10, 512, 5, false).unwrap();
        let b = table.submit(&mut sched, &mut pool, "b", 20, 256, 10, false).unwrap();

        assert_ne!(a, b);
        assert_eq!(pool.used(), 768);
        assert_eq!(table.snapshot().len(), 2);
        assert!(sched.has_task(a) && sched.has_task(b));
    }

    #[test]
    fn submit_rejects_invalid_parameters() {
        let (mut table, mut sched, mut pool) = setup();
        assert!(table.submit(&mut sched, &mut pool, "", 10, 0, 0, false).is_none());
        assert!(table.submit(&mut sched, &mut pool, "p", 0, 0, 0, false).is_none());
    }

    #[test]
    fn submit_survives_memory_exhaustion() {
        let (mut table, mut sched, mut pool) = setup();
        let pid = table
            .submit(&mut sched, &mut pool, "hungry", 10, 1 << 20, 0, false)
            .unwrap();
        // PID is live and scheduled even though no block backs it
        assert!(table.exists(pid));
        assert!(sched.has_task(pid));
        assert_eq!(pool.used(), 0);
    }

    #[test]
    fn term_signal_makes_a_zombie_and_frees_memory() {
        let (mut table, mut sched, mut pool) = setup();
        let pid = table.submit(&mut sched, &mut pool, "p", 10, 256, 1, false).unwrap();

        assert!(table.send_signal(&mut sched, &mut pool, pid, SIGTERM));
        assert_eq!(table.state(pid), Some(ProcessState::Zombie));
        assert_eq!(pool.used(), 0);
        assert!(!sched.has_task(pid));
        // record remains until reaped
        assert_eq!(table.snapshot().len(), 1);

        assert!(table.reap(pid));
        assert!(table.snapshot().is_empty());
    }

    #[test]
    fn stop_and_cont_move_between_stopped_and_ready() {
        let (mut table, mut sched, mut pool) = setup();
        let pid = table.submit(&mut sched, &mut pool, "p", 10, 0, 1, false).unwrap();

        assert!(table.send_signal(&mut sched, &mut pool, pid, SIGSTOP));
        assert_eq!(table.state(pid), Some(ProcessState::Stopped));

        assert!(table.send_signal(&mut sched, &mut pool, pid, SIGCONT));
        assert_eq!(table.state(pid), Some(ProcessState::Ready));
    }

    #[test]
    fn unknown_signal_is_recorded_only() {
        let (mut table, mut sched, mut pool) = setup();
        let pid = table.submit(&mut sched, &mut pool, "p", 10, 0, 1, false).unwrap();
        assert!(table.send_signal(&mut sched, &mut pool, pid, 1));
        assert_eq!(table.state(pid), Some(ProcessState::Ready));
    }

    #[test]
    fn signal_to_unknown_pid_reports_not_found() {
        let (mut table, mut sched, mut pool) = setup();
        assert!(!table.send_signal(&mut sched, &mut pool, Pid(99), SIGTERM));
    }

    #[test]
    fn reap_requires_zombie_state() {
        let (mut table, mut sched, mut pool) = setup();
        let pid = table.submit(&mut sched, &mut pool, "p", 10, 0, 1, false).unwrap();
        assert!(!table.reap(pid));
        assert!(table.exists(pid));
    }

    #[test]
    fn completion_reaps_non_persistent_processes() {
        let (mut table, mut sched, mut pool) = setup();
        let pid = table.submit(&mut sched, &mut pool, "p", 2, 128, 1, false).unwrap();
        let gate = table.gate(pid).unwrap();

        sched.tick();
        let result = sched.tick();
        assert_eq!(result.completed, Some(pid));

        table.on_scheduler_complete(&mut sched, &mut pool, pid);
        assert!(!table.exists(pid));
        assert_eq!(pool.used(), 0);
        assert!(gate.wait(|| false));
    }

    #[test]
    fn completion_refills_persistent_processes() {
        let (mut table, mut sched, mut pool) = setup();
        let pid = table.submit(&mut sched, &mut pool, "init", 2, 0, 1, true).unwrap();

        sched.tick();
        let result = sched.tick();
        assert_eq!(result.completed, Some(pid));

        table.on_scheduler_complete(&mut sched, &mut pool, pid);
        assert!(table.exists(pid));
        assert_eq!(table.state(pid), Some(ProcessState::Ready));
        assert!(sched.has_task(pid));
        assert_eq!(sched.remaining_cycles(pid), Some(2));
    }

    #[test]
    fn add_cpu_work_tops_up_burst() {
        let (mut table, mut sched, mut pool) = setup();
        let pid = table.submit(&mut sched, &mut pool, "d", 1, 0, 1, true).unwrap();
        assert!(table.add_cpu_work(&mut sched, pid, 4));
        assert_eq!(sched.remaining_cycles(pid), Some(5));
        assert!(!table.add_cpu_work(&mut sched, Pid(42), 4));
    }

    #[test]
    fn dispatch_notes_update_states() {
        let (mut table, mut sched, mut pool) = setup();
        let a = table.submit(&mut sched, &mut pool, "a", 5, 0, 1, false).unwrap();
        let b = table.submit(&mut sched, &mut pool, "b", 5, 0, 1, false).unwrap();

        table.note_dispatch(None, Some(a));
        assert_eq!(table.state(a), Some(ProcessState::Running));

        table.note_dispatch(Some(a), Some(b));
        assert_eq!(table.state(a), Some(ProcessState::Ready));
        assert_eq!(table.state(b), Some(ProcessState::Running));
    }
}
