//! Per-peer snapshot history for baseline selection.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use crate::error::{CodecError, CodecResult};
use crate::snapshot::Snapshot;
use crate::types::Tick;

/// Default ring capacity; at typical tick rates this covers a couple of
/// seconds of unacknowledged snapshots.
pub const DEFAULT_HISTORY_CAPACITY: usize = 64;

/// A fixed-capacity ring of `(tick, snapshot)` entries for one peer.
///
/// Ticks are strictly increasing. Entries older than the peer's newest
/// acknowledged tick can never serve as a baseline again and are evicted on
/// acknowledgment; when the ring is full (a peer that stopped acking), the
/// oldest entry is evicted regardless, which may force a later full resync.
#[derive(Debug)]
pub struct SnapshotHistory {
    entries: VecDeque<(Tick, Snapshot)>,
    capacity: NonZeroUsize,
    acknowledged: Option<Tick>,
}

impl SnapshotHistory {
    /// Creates a history with [`DEFAULT_HISTORY_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        const DEFAULT: NonZeroUsize = match NonZeroUsize::new(DEFAULT_HISTORY_CAPACITY) {
            Some(capacity) => capacity,
            None => NonZeroUsize::MIN,
        };
        Self::with_capacity(DEFAULT)
    }

    /// Creates a history with an explicit capacity.
    #[must_use]
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.get()),
            capacity,
            acknowledged: None,
        }
    }

    /// Returns the ring capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Returns the number of resident entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no snapshots are resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the peer's newest acknowledged tick, if any.
    #[must_use]
    pub fn acknowledged(&self) -> Option<Tick> {
        self.acknowledged
    }

    /// Records a snapshot for a tick.
    ///
    /// Evicts the oldest entry when the ring is full.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::OutOfOrderTick`] if `tick` is not newer than
    /// the newest recorded tick.
    pub fn record(&mut self, tick: Tick, snapshot: Snapshot) -> CodecResult<()> {
        if let Some(&(last, _)) = self.entries.back() {
            if tick <= last {
                return Err(CodecError::OutOfOrderTick { last, new: tick });
            }
        }
        if self.entries.len() == self.capacity.get() {
            if let Some((evicted, _)) = self.entries.pop_front() {
                log::debug!("history full, evicting tick {}", evicted.raw());
            }
        }
        self.entries.push_back((tick, snapshot));
        Ok(())
    }

    /// Notes that the peer acknowledged `tick` and evicts entries strictly
    /// older than it. Acknowledgments that do not move forward are ignored.
    ///
    /// Returns `true` if the acknowledged tick advanced.
    pub fn acknowledge(&mut self, tick: Tick) -> bool {
        if self.acknowledged.is_some_and(|acked| tick <= acked) {
            return false;
        }
        self.acknowledged = Some(tick);
        while self
            .entries
            .front()
            .is_some_and(|&(front, _)| front < tick)
        {
            self.entries.pop_front();
        }
        true
    }

    /// Returns the snapshot for an exact tick, if resident.
    #[must_use]
    pub fn get(&self, tick: Tick) -> Option<&Snapshot> {
        self.entries
            .iter()
            .find(|(t, _)| *t == tick)
            .map(|(_, snapshot)| snapshot)
    }

    /// Returns the acknowledged baseline, if still resident.
    ///
    /// `None` with a recorded acknowledgment means the baseline was evicted
    /// and the caller must fall back to a full snapshot.
    #[must_use]
    pub fn baseline(&self) -> Option<(Tick, &Snapshot)> {
        let acked = self.acknowledged?;
        self.get(acked).map(|snapshot| (acked, snapshot))
    }

    /// Returns the newest recorded entry.
    #[must_use]
    pub fn newest(&self) -> Option<(Tick, &Snapshot)> {
        self.entries.back().map(|(tick, snapshot)| (*tick, snapshot))
    }

    /// Iterates entries from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Tick, &Snapshot)> {
        self.entries.iter().map(|(tick, snapshot)| (*tick, snapshot))
    }
}

impl Default for SnapshotHistory {
    fn default() -> Self {
        Self::new()
    }
}
