use std::collections::HashMap;

use crate::process::Pid;

/// Opaque handle identifying one allocation in the pool.
///
/// Callers never see the buffer behind a token: the filesystem stores
/// tokens, reads copy the bytes out, writes replace the whole allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemToken(u64);

struct Allocation {
    size: usize,
    owner: Pid,
    data: Vec<u8>,
}

/// Fixed-capacity byte allocator with per-process accounting.
///
/// Invariant: the sum of all live allocation sizes equals `used()` and
/// never exceeds `total()`. The pool does not relocate or compact.
pub struct MemoryPool {
    total: usize,
    used: usize,
    next_token: u64,
    allocations: HashMap<MemToken, Allocation>,
}

impl MemoryPool {
    pub fn new(total: usize) -> Self {
        log::info!("Memory pool initialized with {} KB", total / 1024);
        MemoryPool {
            total,
            used: 0,
            next_token: 1,
            allocations: HashMap::new(),
        }
    }

    /// Allocate `size` zeroed bytes owned by `owner`.
    ///
    /// Returns `None` iff the request would push usage past capacity.
    pub fn allocate(&mut self, size: usize, owner: Pid) -> Option<MemToken> {
        if self.used + size > self.total {
            log::error!("Out of memory: requested {} bytes ({} free)", size, self.free());
            return None;
        }

        let token = MemToken(self.next_token);
        self.next_token += 1;

        self.allocations.insert(token, Allocation {
            size,
            owner,
            data: vec![0u8; size],
        });
        self.used += size;

        log::debug!("Allocated {} bytes for process {}", size, owner.0);
        Some(token)
    }

    /// Release one allocation. False if the token is unknown.
    pub fn deallocate(&mut self, token: MemToken) -> bool {
        match self.allocations.remove(&token) {
            Some(alloc) => {
                self.used -= alloc.size;
                log::debug!("Deallocated {} bytes", alloc.size);
                true
            }
            None => {
                log::error!("Attempt to deallocate untracked memory");
                false
            }
        }
    }

    /// Release every allocation owned by `pid`. Returns the bytes freed.
    pub fn free_owner(&mut self, pid: Pid) -> usize {
        let mut freed = 0;
        self.allocations.retain(|_, alloc| {
            if alloc.owner == pid {
                freed += alloc.size;
                false
            } else {
                true
            }
        });
        self.used -= freed;
        if freed > 0 {
            log::info!("Freed {} bytes for process {}", freed, pid.0);
        }
        freed
    }

    /// Copy bytes into the buffer behind `token`. The copy is clamped to
    /// the allocation size. False if the token is unknown.
    pub fn write(&mut self, token: MemToken, bytes: &[u8]) -> bool {
        match self.allocations.get_mut(&token) {
            Some(alloc) => {
                let n = bytes.len().min(alloc.size);
                alloc.data[..n].copy_from_slice(&bytes[..n]);
                true
            }
            None => false,
        }
    }

    /// Copy the buffer behind `token` out. None if the token is unknown.
    pub fn read(&self, token: MemToken) -> Option<Vec<u8>> {
        self.allocations.get(&token).map(|alloc| alloc.data.clone())
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn free(&self) -> usize {
        self.total - self.used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_tracks_usage() {
        let mut pool = MemoryPool::new(1024);
        let tok = pool.allocate(256, Pid(1)).unwrap();
        assert_eq!(pool.used(), 256);
        assert_eq!(pool.free(), 768);

        assert!(pool.deallocate(tok));
        assert_eq!(pool.used(), 0);
    }

    #[test]
    fn allocate_fails_when_exhausted() {
        let mut pool = MemoryPool::new(512);
        assert!(pool.allocate(512, Pid(1)).is_some());
        assert!(pool.allocate(1, Pid(2)).is_none());
        assert_eq!(pool.used(), 512);
    }

    #[test]
    fn deallocate_unknown_token_is_an_error() {
        let mut pool = MemoryPool::new(512);
        let tok = pool.allocate(16, Pid(1)).unwrap();
        assert!(pool.deallocate(tok));
        assert!(!pool.deallocate(tok));
    }

    #[test]
    fn free_owner_releases_everything_for_that_pid() {
        let mut pool = MemoryPool::new(1024);
        let a = pool.allocate(100, Pid(1)).unwrap();
        let b = pool.allocate(200, Pid(1)).unwrap();
        let other = pool.allocate(50, Pid(2)).unwrap();

        assert_eq!(pool.free_owner(Pid(1)), 300);
        assert_eq!(pool.used(), 50);
        // no record remains for the freed owner's tokens
        assert!(!pool.deallocate(a));
        assert!(!pool.deallocate(b));
        assert!(pool.deallocate(other));
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut pool = MemoryPool::new(64);
        let tok = pool.allocate(5, Pid(0)).unwrap();
        assert!(pool.write(tok, b"hello"));
        assert_eq!(pool.read(tok).unwrap(), b"hello");
    }
}
