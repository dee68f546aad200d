use std::fmt;

/// Scheduling discipline, selected at boot and switchable at runtime.
///
/// A tagged variant rather than a trait object: selection and preemption
/// are small pure functions branching on the tag, and Round-Robin carries
/// its quantum with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// First come, first served; no preemption while cycles remain.
    Fcfs,
    /// Time-slice preemption after `quantum` consecutive cycles, but only
    /// when another process is waiting.
    RoundRobin { quantum: u32 },
    /// Highest priority number runs; preempted the moment a strictly
    /// higher-priority process becomes ready.
    Priority,
}

impl Algorithm {
    /// Parse a user-facing algorithm name. `quantum` only matters for
    /// Round-Robin and is clamped to at least one cycle.
    pub fn parse(name: &str, quantum: u32) -> Option<Algorithm> {
        match name.to_ascii_lowercase().as_str() {
            "fcfs" => Some(Algorithm::Fcfs),
            "roundrobin" | "rr" => Some(Algorithm::RoundRobin {
                quantum: quantum.max(1),
            }),
            "priority" => Some(Algorithm::Priority),
            _ => None,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Algorithm::Fcfs => write!(f, "FCFS"),
            Algorithm::RoundRobin { quantum } => write!(f, "RoundRobin (quantum={})", quantum),
            Algorithm::Priority => write!(f, "Priority"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!(Algorithm::parse("FCFS", 0), Some(Algorithm::Fcfs));
        assert_eq!(
            Algorithm::parse("roundrobin", 4),
            Some(Algorithm::RoundRobin { quantum: 4 })
        );
        assert_eq!(Algorithm::parse("rr", 0), Some(Algorithm::RoundRobin { quantum: 1 }));
        assert_eq!(Algorithm::parse("Priority", 0), Some(Algorithm::Priority));
        assert_eq!(Algorithm::parse("lottery", 0), None);
    }
}
