//! Snapshot delta synchronization for the snapnet codec.
//!
//! This is the main codec crate. It ties together `packer`, `entropy`, and
//! `directory` to provide the full pipeline: build a per-tick snapshot, diff
//! it against the baseline a peer has acknowledged, serialize and compress
//! the change-list, and reconstruct snapshots on the receiving side.
//!
//! # Features
//!
//! - Immutable snapshot stores with a single-use builder
//! - Change-list computation and application with desync detection
//! - Per-peer baseline history with ack-driven eviction
//! - Item id allocation with timed reuse quarantine
//! - Server/client channel facades over the whole pipeline
//!
//! # Design Principles
//!
//! - **Correctness first** - All invariants are documented and tested.
//! - **Recoverable failures** - Malformed or stale packets void themselves;
//!   nothing in this crate panics on wire input.
//! - **Deterministic** - Same inputs produce same outputs.

mod delta;
mod error;
mod history;
mod idpool;
mod limits;
mod session;
mod snapshot;
mod types;

pub use delta::{
    apply, apply_with_stats, decode_change_list, diff, encode_change_list, ApplyStats,
    ChangeList, FieldPatch, ItemPatch, ItemPayload, TypeStats,
};
pub use directory::{Directory, ItemDef, ItemId, ItemKey, TypeId};
pub use error::{CodecError, CodecResult, LimitKind};
pub use history::{SnapshotHistory, DEFAULT_HISTORY_CAPACITY};
pub use idpool::{IdPool, ID_POOL_CAPACITY, QUARANTINE_WINDOW};
pub use limits::CodecLimits;
pub use session::{ClientChannel, PayloadKind, PeerChannel};
pub use snapshot::{Snapshot, SnapshotBuilder, MAX_SNAPSHOT_ITEMS, MAX_SNAPSHOT_SIZE};
pub use types::Tick;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = Tick::new(0);
        let _ = CodecLimits::default();
        let _ = SnapshotHistory::new();
        let _ = IdPool::new();
        let _: CodecResult<()> = Ok(());
        assert_eq!(MAX_SNAPSHOT_ITEMS, 1024);
        assert_eq!(MAX_SNAPSHOT_SIZE, 64 * 1024);
    }

    #[test]
    fn empty_snapshot_is_shared() {
        let a = Snapshot::empty() as *const Snapshot;
        let b = Snapshot::empty() as *const Snapshot;
        assert_eq!(a, b);
    }
}
