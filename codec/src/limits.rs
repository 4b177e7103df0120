//! Limits for codec-level decoding.

use crate::snapshot::{MAX_SNAPSHOT_ITEMS, MAX_SNAPSHOT_SIZE};

/// Decode-side limits enforced before any allocation sized by wire counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecLimits {
    /// Maximum number of items in a snapshot.
    pub max_items: usize,
    /// Maximum serialized snapshot size in bytes.
    pub max_snapshot_bytes: usize,
    /// Maximum number of removed entries in a change-list.
    pub max_removed: usize,
    /// Maximum number of added items in a change-list.
    pub max_added: usize,
    /// Maximum number of changed items in a change-list.
    pub max_changed: usize,
    /// Maximum number of fields per item.
    pub max_fields_per_item: usize,
    /// Maximum decompressed payload size in bytes.
    pub max_payload_bytes: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_items: MAX_SNAPSHOT_ITEMS,
            max_snapshot_bytes: MAX_SNAPSHOT_SIZE,
            max_removed: MAX_SNAPSHOT_ITEMS,
            max_added: MAX_SNAPSHOT_ITEMS,
            max_changed: MAX_SNAPSHOT_ITEMS,
            max_fields_per_item: directory::MAX_FIELDS_PER_ITEM,
            max_payload_bytes: 2 * MAX_SNAPSHOT_SIZE,
        }
    }
}

impl CodecLimits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_items: 32,
            max_snapshot_bytes: 4096,
            max_removed: 32,
            max_added: 32,
            max_changed: 32,
            max_fields_per_item: 16,
            max_payload_bytes: 8192,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_items: usize::MAX,
            max_snapshot_bytes: usize::MAX,
            max_removed: usize::MAX,
            max_added: usize::MAX,
            max_changed: usize::MAX,
            max_fields_per_item: usize::MAX,
            max_payload_bytes: usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_match_snapshot_bounds() {
        let limits = CodecLimits::default();
        assert_eq!(limits.max_items, MAX_SNAPSHOT_ITEMS);
        assert_eq!(limits.max_snapshot_bytes, MAX_SNAPSHOT_SIZE);
        assert!(limits.max_payload_bytes >= limits.max_snapshot_bytes);
    }

    #[test]
    fn testing_limits_smaller() {
        let test_limits = CodecLimits::for_testing();
        let default_limits = CodecLimits::default();
        assert!(test_limits.max_items < default_limits.max_items);
        assert!(test_limits.max_payload_bytes < default_limits.max_payload_bytes);
    }

    #[test]
    fn unlimited_limits() {
        let limits = CodecLimits::unlimited();
        assert_eq!(limits.max_items, usize::MAX);
        assert_eq!(limits.max_payload_bytes, usize::MAX);
    }
}
