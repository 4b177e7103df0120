//! Item id allocation with timed reuse quarantine.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Default number of allocatable ids.
pub const ID_POOL_CAPACITY: usize = 32 * 1024;

/// Default quarantine window before a freed id may be reallocated.
///
/// Must outlast any unacknowledged packet that might still reference the
/// id; reusing one sooner would let a stale in-flight packet alias a new,
/// unrelated item.
pub const QUARANTINE_WINDOW: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Free,
    Allocated,
    Quarantined,
}

/// Allocator for small integer item ids.
///
/// Freed ids pass through a FIFO quarantine tagged with a deadline instead
/// of returning to the free list immediately; expired entries are swept back
/// opportunistically on every allocation. Exhaustion is reported as `None`,
/// never a panic: it indicates an id leak or load beyond design limits.
#[derive(Debug)]
pub struct IdPool {
    states: Vec<SlotState>,
    free: Vec<u16>,
    quarantine: VecDeque<(u16, Instant)>,
    window: Duration,
}

impl IdPool {
    /// Creates a pool with [`ID_POOL_CAPACITY`] slots and the default window.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(ID_POOL_CAPACITY)
    }

    /// Creates a pool with an explicit slot count (at most `u16::MAX + 1`).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(usize::from(u16::MAX) + 1);
        Self {
            states: vec![SlotState::Free; capacity],
            // Allocate low ids first.
            free: (0..capacity).rev().map(|id| id as u16).collect(),
            quarantine: VecDeque::new(),
            window: QUARANTINE_WINDOW,
        }
    }

    /// Overrides the quarantine window; mainly for tests and tools.
    #[must_use]
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Returns the slot count.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.states.len()
    }

    /// Returns the number of currently allocated ids.
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.states
            .iter()
            .filter(|&&state| state == SlotState::Allocated)
            .count()
    }

    /// Returns the number of ids waiting out their quarantine.
    #[must_use]
    pub fn quarantined(&self) -> usize {
        self.quarantine.len()
    }

    /// Allocates an id, sweeping expired quarantine entries first.
    ///
    /// Returns `None` (logged) when every id is allocated or quarantined.
    pub fn new_id(&mut self) -> Option<u16> {
        self.new_id_at(Instant::now())
    }

    /// [`new_id`](Self::new_id) with an explicit clock, for deterministic tests.
    pub fn new_id_at(&mut self, now: Instant) -> Option<u16> {
        self.sweep(now);
        match self.free.pop() {
            Some(id) => {
                self.states[usize::from(id)] = SlotState::Allocated;
                Some(id)
            }
            None => {
                log::warn!(
                    "id pool exhausted: {} slots allocated or quarantined",
                    self.capacity()
                );
                None
            }
        }
    }

    /// Releases an id into quarantine.
    ///
    /// Out-of-range and double frees are ignored with a log line; they
    /// indicate a caller bug but must not corrupt the pool.
    pub fn free_id(&mut self, id: u16) {
        self.free_id_at(id, Instant::now());
    }

    /// [`free_id`](Self::free_id) with an explicit clock.
    pub fn free_id_at(&mut self, id: u16, now: Instant) {
        let Some(state) = self.states.get_mut(usize::from(id)) else {
            log::warn!("freeing id {id} outside pool capacity");
            return;
        };
        if *state != SlotState::Allocated {
            log::warn!("freeing id {id} that is not allocated");
            return;
        }
        *state = SlotState::Quarantined;
        self.quarantine.push_back((id, now + self.window));
    }

    /// Moves quarantine entries whose deadline has passed back to the free
    /// list. Entries are deadline-ordered, so this stops at the first one
    /// still pending.
    pub fn sweep(&mut self, now: Instant) {
        while self
            .quarantine
            .front()
            .is_some_and(|&(_, deadline)| deadline <= now)
        {
            if let Some((id, _)) = self.quarantine.pop_front() {
                self.states[usize::from(id)] = SlotState::Free;
                self.free.push(id);
            }
        }
    }
}

impl Default for IdPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_low_ids_first() {
        let mut pool = IdPool::with_capacity(4);
        assert_eq!(pool.new_id(), Some(0));
        assert_eq!(pool.new_id(), Some(1));
        assert_eq!(pool.allocated(), 2);
    }

    #[test]
    fn exhaustion_returns_none() {
        let mut pool = IdPool::with_capacity(2);
        assert!(pool.new_id().is_some());
        assert!(pool.new_id().is_some());
        assert_eq!(pool.new_id(), None);
    }

    #[test]
    fn freed_id_is_quarantined_not_reusable() {
        let start = Instant::now();
        let mut pool = IdPool::with_capacity(1);
        let id = pool.new_id_at(start).unwrap();
        pool.free_id_at(id, start);

        // Inside the window the id stays off the free list.
        assert_eq!(pool.new_id_at(start + Duration::from_secs(1)), None);
        assert_eq!(pool.quarantined(), 1);

        // Past the deadline the opportunistic sweep recycles it.
        let later = start + QUARANTINE_WINDOW + Duration::from_millis(1);
        assert_eq!(pool.new_id_at(later), Some(id));
        assert_eq!(pool.quarantined(), 0);
    }

    #[test]
    fn custom_window() {
        let start = Instant::now();
        let mut pool = IdPool::with_capacity(1).with_window(Duration::from_millis(10));
        let id = pool.new_id_at(start).unwrap();
        pool.free_id_at(id, start);
        assert_eq!(pool.new_id_at(start + Duration::from_millis(5)), None);
        assert_eq!(pool.new_id_at(start + Duration::from_millis(11)), Some(id));
    }

    #[test]
    fn sweep_preserves_fifo_order() {
        let start = Instant::now();
        let mut pool = IdPool::with_capacity(3).with_window(Duration::from_secs(1));
        let a = pool.new_id_at(start).unwrap();
        let b = pool.new_id_at(start).unwrap();
        pool.free_id_at(a, start);
        pool.free_id_at(b, start + Duration::from_millis(500));

        // Only the first entry's deadline has passed.
        pool.sweep(start + Duration::from_millis(1100));
        assert_eq!(pool.quarantined(), 1);
        assert_eq!(pool.new_id_at(start + Duration::from_millis(1100)), Some(a));
    }

    #[test]
    fn double_free_is_ignored() {
        let mut pool = IdPool::with_capacity(2);
        let id = pool.new_id().unwrap();
        pool.free_id(id);
        pool.free_id(id);
        assert_eq!(pool.quarantined(), 1);
    }

    #[test]
    fn out_of_range_free_is_ignored() {
        let mut pool = IdPool::with_capacity(2);
        pool.free_id(999);
        assert_eq!(pool.quarantined(), 0);
    }

    #[test]
    fn default_capacity() {
        let pool = IdPool::new();
        assert_eq!(pool.capacity(), ID_POOL_CAPACITY);
    }
}
