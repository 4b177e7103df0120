//! Error types for codec operations.

use std::fmt;

use directory::{ItemKey, TypeId};

use crate::Tick;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding, decoding, or applying deltas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Varint framing error.
    Pack(packer::PackError),

    /// Entropy coding error.
    Entropy(entropy::EntropyError),

    /// Payload was produced against a different item directory.
    DirectoryMismatch { expected: u64, found: u64 },

    /// Item type is not in the directory.
    UnknownType { type_id: TypeId },

    /// Item payload length does not match the directory's field count.
    FieldCountMismatch {
        type_id: TypeId,
        expected: usize,
        found: usize,
    },

    /// A patch addresses a field past the item's end.
    FieldIndexOutOfRange {
        key: ItemKey,
        index: usize,
        len: usize,
    },

    /// A removed or changed entry references a key absent from the baseline.
    ///
    /// This is the desync signal: the peers disagree about the baseline and
    /// the only safe recovery is a full resync.
    MissingItem { key: ItemKey },

    /// The same key appears twice in a snapshot or change-list.
    DuplicateItem { key: ItemKey },

    /// Snapshot items are not sorted by key.
    OutOfOrderKeys { previous: ItemKey, current: ItemKey },

    /// A decode-side limit was exceeded.
    LimitExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },

    /// Snapshot ticks must be strictly increasing.
    OutOfOrderTick { last: Tick, new: Tick },

    /// Payload targets a tick at or before the newest applied one.
    StaleTick { latest: Tick, received: Tick },

    /// Payload names a baseline tick that is not in history.
    MissingBaseline { tick: Tick },

    /// Bytes remained after the change-list was fully parsed.
    TrailingData { remaining: usize },
}

/// Specific limit that was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Items,
    SnapshotBytes,
    Removed,
    Added,
    Changed,
    FieldsPerItem,
    PayloadBytes,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pack(e) => write!(f, "framing error: {e}"),
            Self::Entropy(e) => write!(f, "entropy error: {e}"),
            Self::DirectoryMismatch { expected, found } => {
                write!(
                    f,
                    "directory hash mismatch: expected 0x{expected:016X}, found 0x{found:016X}"
                )
            }
            Self::UnknownType { type_id } => write!(f, "unknown {type_id}"),
            Self::FieldCountMismatch {
                type_id,
                expected,
                found,
            } => {
                write!(f, "{type_id} expects {expected} fields, got {found}")
            }
            Self::FieldIndexOutOfRange { key, index, len } => {
                write!(f, "field index {index} out of range for {key} ({len} fields)")
            }
            Self::MissingItem { key } => {
                write!(f, "item {key} not in baseline")
            }
            Self::DuplicateItem { key } => write!(f, "duplicate item {key}"),
            Self::OutOfOrderKeys { previous, current } => {
                write!(f, "items out of order: {previous} then {current}")
            }
            Self::LimitExceeded {
                kind,
                limit,
                actual,
            } => {
                write!(f, "{kind} limit exceeded: {actual} > {limit}")
            }
            Self::OutOfOrderTick { last, new } => {
                write!(
                    f,
                    "tick {} recorded after tick {}",
                    new.raw(),
                    last.raw()
                )
            }
            Self::StaleTick { latest, received } => {
                write!(
                    f,
                    "stale payload for tick {} (latest is {})",
                    received.raw(),
                    latest.raw()
                )
            }
            Self::MissingBaseline { tick } => {
                write!(f, "baseline tick {} not in history", tick.raw())
            }
            Self::TrailingData { remaining } => {
                write!(f, "{remaining} trailing bytes after change-list")
            }
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Items => "item count",
            Self::SnapshotBytes => "snapshot bytes",
            Self::Removed => "removed entries",
            Self::Added => "added entries",
            Self::Changed => "changed entries",
            Self::FieldsPerItem => "fields per item",
            Self::PayloadBytes => "payload bytes",
        };
        write!(f, "{name}")
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Pack(e) => Some(e),
            Self::Entropy(e) => Some(e),
            _ => None,
        }
    }
}

impl From<packer::PackError> for CodecError {
    fn from(err: packer::PackError) -> Self {
        Self::Pack(err)
    }
}

impl From<entropy::EntropyError> for CodecError {
    fn from(err: entropy::EntropyError) -> Self {
        Self::Entropy(err)
    }
}
