pub mod algorithm;
pub mod task;

use std::collections::VecDeque;

pub use self::algorithm::Algorithm;
pub use self::task::ScheduledTask;

use crate::process::Pid;

/// Outcome of one scheduler tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickResult {
    /// A process finished during this tick.
    pub completed: Option<Pid>,
    /// The process holding the CPU at the end of the tick (None = idle).
    pub current: Option<Pid>,
    /// Cycles left for the current process.
    pub remaining_cycles: u32,
    /// Did a context switch occur?
    pub context_switch: bool,
    /// No process ran at any point during the tick.
    pub idle: bool,
}

type CompletionHook = Box<dyn FnMut(Pid) + Send>;

/// Virtual-clock CPU scheduler.
///
/// Each `tick()` consumes `cycles_per_tick` cycles. The ready queue keeps
/// insertion order; the suspended list and the task table are scrubbed
/// eagerly but the queue itself is not - a selection that hits a stale PID
/// just skips it.
pub struct CpuScheduler {
    system_tick: u64,
    current: Option<Pid>,
    /// Cycles consumed within the current time slice.
    current_slice: u32,

    algorithm: Algorithm,
    cycles_per_tick: u32,
    tick_interval_ms: u64,

    tasks: Vec<ScheduledTask>,
    ready: VecDeque<Pid>,
    suspended: Vec<Pid>,

    on_complete: Option<CompletionHook>,
}

impl CpuScheduler {
    pub fn new(algorithm: Algorithm, cycles_per_tick: u32, tick_interval_ms: u64) -> Self {
        CpuScheduler {
            system_tick: 0,
            current: None,
            current_slice: 0,
            algorithm,
            cycles_per_tick: cycles_per_tick.max(1),
            tick_interval_ms: tick_interval_ms.max(1),
            tasks: Vec::new(),
            ready: VecDeque::new(),
            suspended: Vec::new(),
            on_complete: None,
        }
    }

    /// One-way callback into the process layer, installed at wiring time.
    pub fn set_completion_hook(&mut self, hook: CompletionHook) {
        self.on_complete = Some(hook);
    }

    // ---- configuration (takes effect on the next tick) ----

    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        self.algorithm = algorithm;
        log::info!("Algorithm set to: {}", algorithm);
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn set_cycles_per_tick(&mut self, cycles: u32) {
        self.cycles_per_tick = cycles.max(1);
        log::info!("Cycles per tick set to: {}", self.cycles_per_tick);
    }

    pub fn cycles_per_tick(&self) -> u32 {
        self.cycles_per_tick
    }

    pub fn set_tick_interval_ms(&mut self, ms: u64) {
        self.tick_interval_ms = ms.max(1);
        log::info!("Tick interval set to: {} ms", self.tick_interval_ms);
    }

    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms
    }

    // ---- state queries ----

    pub fn current_pid(&self) -> Option<Pid> {
        self.current
    }

    pub fn system_tick(&self) -> u64 {
        self.system_tick
    }

    pub fn ready_count(&self) -> usize {
        self.ready.len()
    }

    pub fn has_task(&self, pid: Pid) -> bool {
        self.find(pid).is_some()
    }

    pub fn remaining_cycles(&self, pid: Pid) -> Option<u32> {
        self.find(pid).map(|t| t.burst)
    }

    /// Work remains while something holds the CPU or waits for it.
    pub fn has_work(&self) -> bool {
        self.current.is_some() || !self.ready.is_empty()
    }

    fn find(&self, pid: Pid) -> Option<&ScheduledTask> {
        self.tasks.iter().find(|t| t.pid == pid)
    }

    fn find_mut(&mut self, pid: Pid) -> Option<&mut ScheduledTask> {
        self.tasks.iter_mut().find(|t| t.pid == pid)
    }

    fn is_suspended(&self, pid: Pid) -> bool {
        self.suspended.contains(&pid)
    }

    // ---- queue management ----

    /// Add a process to the ready queue. Duplicates are ignored with a
    /// warning.
    pub fn enqueue(&mut self, pid: Pid, burst: u32, priority: i32) {
        if self.find(pid).is_some() {
            log::warn!("Process {} already in scheduler", pid);
            return;
        }
        self.tasks
            .push(ScheduledTask::new(pid, self.system_tick, burst, priority));
        self.ready.push_back(pid);
        log::info!("Enqueued process {} (burst={}, priority={})", pid, burst, priority);
    }

    /// Top up a live task's burst (daemons buying CPU time for a work
    /// cycle). False if the task is unknown.
    pub fn add_burst(&mut self, pid: Pid, cycles: u32) -> bool {
        match self.find_mut(pid) {
            Some(task) => {
                task.burst += cycles;
                true
            }
            None => false,
        }
    }

    /// Remove a process (killed or reaped). The ready queue is not
    /// scrubbed; a later selection skips missing tasks.
    pub fn remove(&mut self, pid: Pid) {
        if self.current == Some(pid) {
            self.current = None;
            self.current_slice = 0;
        }
        self.tasks.retain(|t| t.pid != pid);
        self.suspended.retain(|p| *p != pid);
        log::info!("Removed process {} from scheduler queue", pid);
    }

    /// Take a process off the CPU / out of the ready set (SIGSTOP).
    pub fn suspend(&mut self, pid: Pid) {
        if self.current == Some(pid) {
            self.suspended.push(pid);
            self.current = None;
            self.current_slice = 0;
            log::info!("Suspended running process {}", pid);
        } else if !self.is_suspended(pid) {
            self.suspended.push(pid);
            log::info!("Suspended process {}", pid);
        }
    }

    /// Put a suspended process back on the tail of the ready queue
    /// (SIGCONT).
    pub fn resume(&mut self, pid: Pid) {
        if let Some(pos) = self.suspended.iter().position(|p| *p == pid) {
            self.suspended.remove(pos);
            self.ready.push_back(pid);
            log::info!("Resumed process {}", pid);
        }
    }

    // ---- tick engine ----

    /// Advance the virtual clock by one tick (`cycles_per_tick` cycles).
    pub fn tick(&mut self) -> TickResult {
        let mut result = TickResult {
            idle: true,
            ..TickResult::default()
        };

        for _ in 0..self.cycles_per_tick {
            self.system_tick += 1;

            // Round-Robin quantum boundary: hand the CPU over before the
            // next cycle is consumed, but only if someone is waiting.
            if let Algorithm::RoundRobin { quantum } = self.algorithm {
                if let Some(pid) = self.current {
                    if self.current_slice >= quantum {
                        if !self.ready.is_empty() {
                            self.preempt_current();
                            if let Some(next) = self.select_next() {
                                self.dispatch(next);
                                result.context_switch = true;
                            }
                        } else {
                            self.current_slice = 0;
                            log::debug!(
                                "Process {} quantum expired, continuing (no other processes)",
                                pid
                            );
                        }
                    }
                }
            }

            // Dispatch from idle; this is not counted as a context switch.
            if self.current.is_none() {
                if let Some(next) = self.select_next() {
                    self.dispatch(next);
                }
            }

            let pid = match self.current {
                Some(pid) => pid,
                None => continue, // idle cycle
            };

            result.idle = false;
            result.current = Some(pid);

            let (burst, priority) = match self.find_mut(pid) {
                Some(task) => {
                    task.burst = task.burst.saturating_sub(1);
                    (task.burst, task.priority)
                }
                None => {
                    // Task table inconsistency: drop the stale current and
                    // pick again next cycle.
                    log::debug!("Current process {} missing from task table", pid);
                    self.current = None;
                    continue;
                }
            };
            self.current_slice += 1;
            result.remaining_cycles = burst;

            log::debug!(
                "Process {} executed 1 cycle (remaining={}, slice={})",
                pid,
                burst,
                self.current_slice
            );

            if burst == 0 {
                result.completed = Some(pid);
                self.complete(pid);
            } else if self.algorithm == Algorithm::Priority
                && self.higher_priority_ready(priority)
            {
                // A more urgent process became ready: hand over
                // immediately, mid-tick.
                self.preempt_current();
                if let Some(next) = self.select_next() {
                    self.dispatch(next);
                    result.context_switch = true;
                    result.current = Some(next);
                    result.remaining_cycles = self.find(next).map(|t| t.burst).unwrap_or(0);
                }
            }
        }

        result
    }

    /// True when a runnable queued process outranks the current priority.
    fn higher_priority_ready(&self, current_priority: i32) -> bool {
        self.ready.iter().any(|pid| {
            !self.is_suspended(*pid)
                && self
                    .find(*pid)
                    .map(|t| t.priority > current_priority)
                    .unwrap_or(false)
        })
    }

    /// Pop the next runnable PID, skipping suspended and stale entries.
    /// Under Priority, scan every queued candidate for the highest number.
    fn select_next(&mut self) -> Option<Pid> {
        while let Some(pid) = self.ready.pop_front() {
            if self.is_suspended(pid) || self.find(pid).is_none() {
                continue;
            }

            if self.algorithm != Algorithm::Priority {
                return Some(pid);
            }

            // Priority: collect the remaining runnable candidates and pick
            // the best; ties keep insertion order because only a strictly
            // greater priority replaces the front-most candidate.
            let mut candidates = vec![pid];
            while let Some(other) = self.ready.pop_front() {
                if !self.is_suspended(other) && self.find(other).is_some() {
                    candidates.push(other);
                }
            }

            let mut best = candidates[0];
            let mut best_priority = self.find(best).map(|t| t.priority).unwrap_or(i32::MIN);
            for cand in &candidates[1..] {
                let priority = self.find(*cand).map(|t| t.priority).unwrap_or(i32::MIN);
                if priority > best_priority {
                    best = *cand;
                    best_priority = priority;
                }
            }

            for cand in candidates {
                if cand != best {
                    self.ready.push_back(cand);
                }
            }
            return Some(best);
        }
        None
    }

    fn dispatch(&mut self, pid: Pid) {
        self.current = Some(pid);
        self.current_slice = 0;
        if let Some(task) = self.find(pid) {
            log::debug!("Selected process {} for execution (burst={})", pid, task.burst);
        }
    }

    fn preempt_current(&mut self) {
        if let Some(pid) = self.current {
            if self.find(pid).map(|t| t.burst > 0).unwrap_or(false) {
                self.ready.push_back(pid);
                log::debug!(
                    "Preempted process {} (remaining={})",
                    pid,
                    self.find(pid).map(|t| t.burst).unwrap_or(0)
                );
            }
        }
        self.current = None;
        self.current_slice = 0;
    }

    /// Finish the current process: stamp its metrics, fire the completion
    /// hook, drop the task.
    fn complete(&mut self, pid: Pid) {
        let tick = self.system_tick;
        if let Some(task) = self.find_mut(pid) {
            task.completion_tick = tick;
            task.turnaround_ticks = tick - task.arrival_tick;
            log::info!(
                "Process {} completed at tick {} (turnaround={} ticks)",
                pid,
                task.completion_tick,
                task.turnaround_ticks
            );
        }

        if let Some(hook) = self.on_complete.as_mut() {
            hook(pid);
        }

        self.tasks.retain(|t| t.pid != pid);
        self.current = None;
        self.current_slice = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fcfs() -> CpuScheduler {
        CpuScheduler::new(Algorithm::Fcfs, 1, 100)
    }

    #[test]
    fn enqueue_adds_to_ready_queue() {
        let mut sched = fcfs();
        sched.enqueue(Pid(1), 5, 1);
        assert_eq!(sched.ready_count(), 1);
        assert!(sched.has_work());
    }

    #[test]
    fn duplicate_enqueue_is_ignored() {
        let mut sched = fcfs();
        sched.enqueue(Pid(1), 5, 1);
        sched.enqueue(Pid(1), 9, 9);
        assert_eq!(sched.ready_count(), 1);
        assert_eq!(sched.remaining_cycles(Pid(1)), Some(5));
    }

    #[test]
    fn tick_starts_execution() {
        let mut sched = fcfs();
        sched.enqueue(Pid(1), 1, 1);

        let r = sched.tick();
        assert_eq!(sched.ready_count(), 0);
        assert_eq!(r.current, Some(Pid(1)));
        assert!(!r.idle);
    }

    #[test]
    fn process_completes_after_enough_cycles() {
        let mut sched = fcfs();
        sched.enqueue(Pid(1), 3, 1);

        let r1 = sched.tick();
        assert!(r1.completed.is_none());
        assert_eq!(r1.remaining_cycles, 2);

        let r2 = sched.tick();
        assert!(r2.completed.is_none());
        assert_eq!(r2.remaining_cycles, 1);

        let r3 = sched.tick();
        assert_eq!(r3.completed, Some(Pid(1)));
        assert!(!sched.has_task(Pid(1)));
    }

    #[test]
    fn fcfs_executes_in_arrival_order() {
        let mut sched = fcfs();
        sched.enqueue(Pid(1), 2, 1);
        sched.enqueue(Pid(2), 2, 5); // higher priority but later; FCFS ignores it

        let r1 = sched.tick();
        assert_eq!(r1.current, Some(Pid(1)));

        let r2 = sched.tick();
        assert_eq!(r2.completed, Some(Pid(1)));

        let r3 = sched.tick();
        assert_eq!(r3.current, Some(Pid(2)));
    }

    #[test]
    fn round_robin_preempts_after_quantum() {
        let mut sched = CpuScheduler::new(Algorithm::RoundRobin { quantum: 2 }, 1, 100);
        sched.enqueue(Pid(1), 5, 1);
        sched.enqueue(Pid(2), 5, 1);

        let r1 = sched.tick();
        assert_eq!(r1.current, Some(Pid(1)));
        // dispatch from idle is not a context switch
        assert!(!r1.context_switch);

        let r2 = sched.tick();
        assert_eq!(r2.current, Some(Pid(1)));
        assert!(!r2.context_switch);

        let r3 = sched.tick();
        assert_eq!(r3.current, Some(Pid(2)));
        assert!(r3.context_switch);
    }

    #[test]
    fn round_robin_alone_keeps_the_cpu() {
        let mut sched = CpuScheduler::new(Algorithm::RoundRobin { quantum: 2 }, 1, 100);
        sched.enqueue(Pid(1), 6, 1);

        for _ in 0..5 {
            let r = sched.tick();
            assert_eq!(r.current, Some(Pid(1)));
        }
        let last = sched.tick();
        assert_eq!(last.completed, Some(Pid(1)));
    }

    #[test]
    fn priority_preempts_lower_priority() {
        let mut sched = CpuScheduler::new(Algorithm::Priority, 1, 100);
        sched.enqueue(Pid(1), 10, 1); // low priority

        sched.tick();
        assert_eq!(sched.current_pid(), Some(Pid(1)));

        sched.enqueue(Pid(2), 2, 10); // higher number = more urgent

        let r = sched.tick();
        assert_eq!(r.current, Some(Pid(2)));
        assert!(r.context_switch);
    }

    #[test]
    fn priority_ties_break_by_insertion_order() {
        let mut sched = CpuScheduler::new(Algorithm::Priority, 1, 100);
        sched.enqueue(Pid(1), 2, 5);
        sched.enqueue(Pid(2), 2, 5);

        let r = sched.tick();
        assert_eq!(r.current, Some(Pid(1)));
    }

    #[test]
    fn cycles_per_tick_affects_progress() {
        let mut sched = CpuScheduler::new(Algorithm::Fcfs, 3, 100);
        sched.enqueue(Pid(1), 6, 1);

        let r1 = sched.tick();
        assert_eq!(r1.remaining_cycles, 3);

        let r2 = sched.tick();
        assert_eq!(r2.completed, Some(Pid(1)));
    }

    #[test]
    fn suspend_and_resume() {
        let mut sched = fcfs();
        sched.enqueue(Pid(1), 10, 1);
        sched.tick();

        sched.suspend(Pid(1));
        assert_eq!(sched.current_pid(), None);
        let idle = sched.tick();
        assert!(idle.idle);

        sched.resume(Pid(1));
        sched.tick();
        assert_eq!(sched.current_pid(), Some(Pid(1)));
    }

    #[test]
    fn stale_ready_entries_are_skipped() {
        let mut sched = fcfs();
        sched.enqueue(Pid(1), 5, 1);
        sched.enqueue(Pid(2), 5, 1);
        sched.remove(Pid(1)); // stays in the ready queue, but has no task

        let r = sched.tick();
        assert_eq!(r.current, Some(Pid(2)));
    }

    #[test]
    fn completion_hook_fires() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;

        let mut sched = fcfs();
        let seen = Arc::new(AtomicU32::new(0));
        let seen2 = Arc::clone(&seen);
        sched.set_completion_hook(Box::new(move |pid| {
            seen2.store(pid.0, Ordering::SeqCst);
        }));

        sched.enqueue(Pid(9), 1, 1);
        sched.tick();
        assert_eq!(seen.load(Ordering::SeqCst), 9);
    }

    #[test]
    fn idle_tick_reports_idle() {
        let mut sched = fcfs();
        let r = sched.tick();
        assert!(r.idle);
        assert_eq!(r.current, None);
        assert!(!sched.has_work());
    }
}
