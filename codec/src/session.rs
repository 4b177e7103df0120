//! Server and client channel facades over diff, pack, and compress.

use std::num::NonZeroUsize;

use directory::{directory_hash, Directory};
use entropy::Huffman;

use crate::delta::{apply_with_stats, decode_change_list, diff, encode_change_list, ApplyStats};
use crate::error::{CodecError, CodecResult, LimitKind};
use crate::history::SnapshotHistory;
use crate::limits::CodecLimits;
use crate::snapshot::Snapshot;
use crate::types::Tick;

/// Worst-case entropy expansion factors for buffer sizing.
///
/// The shortest code is one bit, so decompression emits at most eight
/// symbols per input byte; rare symbols compress to a few bytes each.
const MAX_DECOMPRESS_RATIO: usize = 8;
const MAX_COMPRESS_RATIO: usize = 4;

/// What a produced payload carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// Delta against an acknowledged baseline.
    Delta,
    /// Full snapshot against the empty baseline.
    Full,
}

/// Server-side per-peer channel.
///
/// Owns the peer's snapshot history and turns each tick's snapshot into a
/// compressed payload: diff against the newest acknowledged baseline,
/// varint-encode, entropy-compress. Falls back to a full snapshot before
/// the first acknowledgment or when the acked baseline was evicted.
#[derive(Debug, Default)]
pub struct PeerChannel {
    history: SnapshotHistory,
    resyncs: u64,
}

impl PeerChannel {
    /// Creates a channel with the default history capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a channel with an explicit history capacity.
    #[must_use]
    pub fn with_history_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            history: SnapshotHistory::with_capacity(capacity),
            resyncs: 0,
        }
    }

    /// Forwards a transport-level acknowledgment for `tick`.
    ///
    /// Returns `true` if the acknowledged tick advanced.
    pub fn acknowledge(&mut self, tick: Tick) -> bool {
        self.history.acknowledge(tick)
    }

    /// Number of forced full resyncs caused by baseline eviction.
    ///
    /// A rising counter costs bandwidth, not correctness; it usually means
    /// the peer stopped acknowledging.
    #[must_use]
    pub fn resyncs(&self) -> u64 {
        self.resyncs
    }

    /// Returns the peer's history, mainly for diagnostics.
    #[must_use]
    pub fn history(&self) -> &SnapshotHistory {
        &self.history
    }

    /// Encodes one tick's snapshot for this peer, appending the compressed
    /// payload to `out`, and records the snapshot as a future baseline.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::OutOfOrderTick`] if `tick` is not newer than
    /// the previously encoded tick, or an entropy error if the payload does
    /// not fit the sized buffer.
    pub fn encode_tick(
        &mut self,
        directory: &Directory,
        tick: Tick,
        snapshot: &Snapshot,
        out: &mut Vec<u8>,
    ) -> CodecResult<PayloadKind> {
        let acked = self.history.acknowledged();
        let (change, kind) = match self.history.baseline() {
            Some((from_tick, from)) => (
                diff(Some(from), snapshot, from_tick, tick),
                PayloadKind::Delta,
            ),
            None => {
                if let Some(acked) = acked {
                    self.resyncs += 1;
                    log::info!(
                        "baseline tick {} evicted, forcing full resync at tick {}",
                        acked.raw(),
                        tick.raw()
                    );
                }
                (diff(None, snapshot, Tick::NONE, tick), PayloadKind::Full)
            }
        };

        let bytes = encode_change_list(directory_hash(directory), &change);
        let mut compressed = vec![0u8; bytes.len() * MAX_COMPRESS_RATIO + 16];
        let len = Huffman::global().compress(&bytes, &mut compressed)?;
        compressed.truncate(len);

        self.history.record(tick, snapshot.clone())?;
        out.extend_from_slice(&compressed);
        Ok(kind)
    }
}

/// Client-side channel.
///
/// Decompresses and decodes incoming payloads, applies them against its own
/// history, and tracks per-type traffic. The caller acknowledges
/// [`latest`](Self::latest) back to the server through the transport.
#[derive(Debug, Default)]
pub struct ClientChannel {
    history: SnapshotHistory,
    limits: CodecLimits,
    stats: ApplyStats,
}

impl ClientChannel {
    /// Creates a channel with default limits and history capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a channel with explicit decode limits.
    #[must_use]
    pub fn with_limits(limits: CodecLimits) -> Self {
        Self {
            history: SnapshotHistory::new(),
            limits,
            stats: ApplyStats::default(),
        }
    }

    /// Decompresses, decodes, and applies one payload, storing the result
    /// as the new authoritative state.
    ///
    /// Returns the applied tick on success; fetch the state via
    /// [`latest`](Self::latest).
    ///
    /// # Errors
    ///
    /// Framing and entropy errors void the packet. [`CodecError::StaleTick`]
    /// rejects reordered payloads without touching state.
    /// [`CodecError::MissingBaseline`] and [`CodecError::MissingItem`] signal
    /// desync; the caller should stop acknowledging so the server resyncs.
    pub fn apply_payload(&mut self, directory: &Directory, payload: &[u8]) -> CodecResult<Tick> {
        let buffer_len = (payload.len() * MAX_DECOMPRESS_RATIO + 64)
            .min(self.limits.max_payload_bytes);
        let mut decompressed = vec![0u8; buffer_len];
        let len = match Huffman::global().decompress(payload, &mut decompressed) {
            Ok(len) => len,
            Err(entropy::EntropyError::OutputOverrun { .. })
                if buffer_len == self.limits.max_payload_bytes =>
            {
                return Err(CodecError::LimitExceeded {
                    kind: LimitKind::PayloadBytes,
                    limit: self.limits.max_payload_bytes,
                    actual: buffer_len + 1,
                });
            }
            Err(err) => return Err(err.into()),
        };

        let change = decode_change_list(&decompressed[..len], directory, &self.limits)?;

        if let Some((latest, _)) = self.history.newest() {
            if change.to_tick <= latest {
                return Err(CodecError::StaleTick {
                    latest,
                    received: change.to_tick,
                });
            }
        }

        let next = if change.from_tick.is_none() {
            apply_with_stats(Snapshot::empty(), &change, &mut self.stats)?
        } else {
            let Some(baseline) = self.history.get(change.from_tick) else {
                return Err(CodecError::MissingBaseline {
                    tick: change.from_tick,
                });
            };
            apply_with_stats(baseline, &change, &mut self.stats)?
        };

        let tick = change.to_tick;
        self.history.record(tick, next)?;
        Ok(tick)
    }

    /// Returns the newest applied snapshot; the tick to acknowledge.
    #[must_use]
    pub fn latest(&self) -> Option<(Tick, &Snapshot)> {
        self.history.newest()
    }

    /// Per-type traffic accounting across all applied payloads.
    #[must_use]
    pub fn stats(&self) -> &ApplyStats {
        &self.stats
    }
}
