use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::memory::MemToken;

/// Unique process identifier. PID 0 is reserved for the kernel, PID 1 for
/// init; user PIDs count up from there and are never reused while a record
/// exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub const SIGKILL: i32 = 9;
pub const SIGTERM: i32 = 15;
pub const SIGCONT: i32 = 18;
pub const SIGSTOP: i32 = 19;

/// The seven-state process lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    New,
    Ready,
    Running,
    Waiting,
    Stopped,
    Zombie,
    Terminated,
}

impl ProcessState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessState::New => "NEW",
            ProcessState::Ready => "READY",
            ProcessState::Running => "RUNNING",
            ProcessState::Waiting => "WAITING",
            ProcessState::Stopped => "STOPPED",
            ProcessState::Zombie => "ZOMBIE",
            ProcessState::Terminated => "TERMINATED",
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-process completion rendezvous.
///
/// Shell threads block here after a submit; the kernel tick loop signals
/// the gate when the scheduler reports completion (or the process is
/// killed). The outcome sticks: the first signal wins and later waiters
/// return immediately.
pub struct CompletionGate {
    outcome: Mutex<Option<bool>>,
    cv: Condvar,
}

impl CompletionGate {
    pub fn new() -> Self {
        CompletionGate {
            outcome: Mutex::new(None),
            cv: Condvar::new(),
        }
    }

    /// Record the outcome (`true` = completed normally) and wake waiters.
    pub fn signal(&self, completed: bool) {
        let mut outcome = self.outcome.lock();
        if outcome.is_none() {
            *outcome = Some(completed);
        }
        self.cv.notify_all();
    }

    /// Block until the gate is signaled or `interrupted()` turns true.
    /// Returns false when interrupted before completion.
    pub fn wait(&self, interrupted: impl Fn() -> bool) -> bool {
        let mut outcome = self.outcome.lock();
        loop {
            if let Some(completed) = *outcome {
                return completed;
            }
            if interrupted() {
                return false;
            }
            // Short timeout so the interrupt flag is observed promptly.
            self.cv.wait_for(&mut outcome, Duration::from_millis(50));
        }
    }
}

impl Default for CompletionGate {
    fn default() -> Self {
        Self::new()
    }
}

/// One process table record.
pub struct Process {
    pub pid: Pid,
    pub name: String,
    /// CPU cycles requested at submit (the refill budget for persistent
    /// processes).
    pub cycles: u32,
    pub memory: usize,
    pub priority: i32,
    pub parent_pid: Pid,
    pub remaining_cycles: u32,
    pub persistent: bool,
    pub memory_token: Option<MemToken>,
    pub gate: Arc<CompletionGate>,
    state: ProcessState,
}

impl Process {
    pub fn new(
        name: &str,
        pid: Pid,
        cycles: u32,
        memory: usize,
        priority: i32,
        parent_pid: Pid,
    ) -> Self {
        Process {
            pid,
            name: name.to_string(),
            cycles,
            memory,
            priority,
            parent_pid,
            remaining_cycles: cycles,
            persistent: false,
            memory_token: None,
            gate: Arc::new(CompletionGate::new()),
            state: ProcessState::New,
        }
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    // State transitions. Each validates the legal-successor set and logs a
    // rejected transition rather than panicking.

    /// NEW / WAITING -> READY
    pub fn make_ready(&mut self) -> bool {
        if self.state != ProcessState::New && self.state != ProcessState::Waiting {
            log::error!("PID {}: cannot transition to READY from {}", self.pid, self.state);
            return false;
        }
        self.state = ProcessState::Ready;
        log::debug!("PID {}: state {}", self.pid, self.state);
        true
    }

    /// READY -> RUNNING (scheduler dispatch)
    pub fn start(&mut self) -> bool {
        if self.state != ProcessState::Ready {
            log::error!("PID {}: cannot start from {} state", self.pid, self.state);
            return false;
        }
        self.state = ProcessState::Running;
        log::debug!("PID {}: state {}", self.pid, self.state);
        true
    }

    /// RUNNING -> READY (quantum or priority preemption)
    pub fn preempt(&mut self) -> bool {
        if self.state != ProcessState::Running {
            log::error!("PID {}: cannot preempt from {} state", self.pid, self.state);
            return false;
        }
        self.state = ProcessState::Ready;
        log::debug!("PID {}: state {}", self.pid, self.state);
        true
    }

    /// RUNNING -> WAITING (voluntary block)
    pub fn block(&mut self) -> bool {
        if self.state != ProcessState::Running {
            log::error!("PID {}: cannot wait, not in RUNNING state", self.pid);
            return false;
        }
        self.state = ProcessState::Waiting;
        log::debug!("PID {}: state {}", self.pid, self.state);
        true
    }

    /// RUNNING / READY -> STOPPED (SIGSTOP)
    pub fn suspend(&mut self) -> bool {
        if self.state != ProcessState::Running && self.state != ProcessState::Ready {
            log::error!("PID {}: cannot suspend from {} state", self.pid, self.state);
            return false;
        }
        let prev = self.state;
        self.state = ProcessState::Stopped;
        log::info!("PID {}: suspended from {}", self.pid, prev);
        true
    }

    /// STOPPED -> READY (SIGCONT)
    pub fn resume(&mut self) -> bool {
        if self.state != ProcessState::Stopped {
            log::error!("PID {}: cannot resume, not in STOPPED state", self.pid);
            return false;
        }
        self.state = ProcessState::Ready;
        log::info!("PID {}: resumed to READY", self.pid);
        true
    }

    /// any non-ZOMBIE -> ZOMBIE (exit or fatal signal)
    pub fn make_zombie(&mut self) -> bool {
        if self.state == ProcessState::Zombie {
            log::warn!("PID {}: already a zombie", self.pid);
            return false;
        }
        self.state = ProcessState::Zombie;
        log::debug!("PID {}: state {}", self.pid, self.state);
        true
    }

    /// ZOMBIE -> TERMINATED (reaped by parent)
    pub fn reap(&mut self) -> bool {
        if self.state != ProcessState::Zombie {
            log::error!("PID {}: cannot reap, not in ZOMBIE state", self.pid);
            return false;
        }
        self.state = ProcessState::Terminated;
        log::debug!("PID {}: state {}", self.pid, self.state);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_follows_legal_transitions() {
        let mut p = Process::new("t", Pid(7), 5, 0, 1, Pid(0));
        assert_eq!(p.state(), ProcessState::New);
        assert!(p.make_ready());
        assert!(p.start());
        assert!(p.preempt());
        assert!(p.start());
        assert!(p.block());
        assert!(p.make_ready());
        assert!(p.make_zombie());
        assert!(p.reap());
        assert_eq!(p.state(), ProcessState::Terminated);
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        let mut p = Process::new("t", Pid(7), 5, 0, 1, Pid(0));
        assert!(!p.start()); // NEW cannot run directly
        assert!(!p.resume()); // not stopped
        p.make_ready();
        assert!(!p.block()); // not running
        assert!(p.suspend()); // READY -> STOPPED is legal
        assert!(!p.suspend()); // already stopped
        assert!(p.resume());
    }

    #[test]
    fn zombie_is_terminal_until_reaped() {
        let mut p = Process::new("t", Pid(7), 5, 0, 1, Pid(0));
        p.make_ready();
        assert!(p.make_zombie());
        assert!(!p.make_zombie());
        assert!(!p.make_ready());
        assert!(p.reap());
    }

    #[test]
    fn gate_returns_recorded_outcome() {
        let gate = CompletionGate::new();
        gate.signal(true);
        assert!(gate.wait(|| false));
        // first outcome sticks
        gate.signal(false);
        assert!(gate.wait(|| false));
    }

    #[test]
    fn gate_observes_interrupt() {
        let gate = CompletionGate::new();
        assert!(!gate.wait(|| true));
    }
}
