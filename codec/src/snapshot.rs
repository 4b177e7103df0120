//! Immutable per-tick snapshots and the builder that produces them.

use std::collections::HashSet;

use directory::{Directory, ItemKey};

use crate::error::{CodecError, CodecResult, LimitKind};

/// Hard cap on items per snapshot.
pub const MAX_SNAPSHOT_ITEMS: usize = 1024;

/// Hard cap on a snapshot's serialized size in bytes.
pub const MAX_SNAPSHOT_SIZE: usize = 64 * 1024;

/// Serialized bytes per item header: type, id, and field count.
const ITEM_HEADER_BYTES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ItemHeader {
    key: ItemKey,
    offset: usize,
    len: usize,
}

/// The complete state of one simulation tick: an ordered sequence of typed
/// items over a flat field blob.
///
/// Snapshots are immutable once built. Items are stored sorted by
/// [`ItemKey`] so diffing two snapshots is a linear merge-walk and lookup is
/// a binary search.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    headers: Vec<ItemHeader>,
    fields: Vec<i32>,
}

impl Snapshot {
    /// Returns the canonical empty snapshot, the baseline for full syncs.
    #[must_use]
    pub fn empty() -> &'static Self {
        static EMPTY: Snapshot = Snapshot {
            headers: Vec::new(),
            fields: Vec::new(),
        };
        &EMPTY
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Returns `true` if the snapshot has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Returns the item at `index`, if in range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<(ItemKey, &[i32])> {
        let header = self.headers.get(index)?;
        Some((header.key, &self.fields[header.offset..header.offset + header.len]))
    }

    /// Finds an item's fields by key via binary search.
    #[must_use]
    pub fn find(&self, key: ItemKey) -> Option<&[i32]> {
        let index = self
            .headers
            .binary_search_by(|header| header.key.cmp(&key))
            .ok()?;
        self.get(index).map(|(_, fields)| fields)
    }

    /// Iterates items in key order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (ItemKey, &[i32])> {
        self.headers
            .iter()
            .map(|header| (header.key, &self.fields[header.offset..header.offset + header.len]))
    }

    /// Returns the serialized size in bytes.
    #[must_use]
    pub fn serialized_size(&self) -> usize {
        self.headers.len() * ITEM_HEADER_BYTES + self.fields.len() * 4
    }

    /// Computes the diagnostic checksum: the wrapping u32 sum of all field
    /// values. Order-independent, so peers can compare without agreeing on
    /// anything beyond field contents.
    #[must_use]
    pub fn checksum(&self) -> u32 {
        self.fields
            .iter()
            .fold(0u32, |sum, &field| sum.wrapping_add(field as u32))
    }

    /// Validates snapshot invariants: sorted unique keys and both hard caps.
    ///
    /// Builders uphold these by construction; decode paths call this on
    /// reconstructed state before trusting it.
    pub fn validate(&self) -> CodecResult<()> {
        if self.headers.len() > MAX_SNAPSHOT_ITEMS {
            return Err(CodecError::LimitExceeded {
                kind: LimitKind::Items,
                limit: MAX_SNAPSHOT_ITEMS,
                actual: self.headers.len(),
            });
        }
        if self.serialized_size() > MAX_SNAPSHOT_SIZE {
            return Err(CodecError::LimitExceeded {
                kind: LimitKind::SnapshotBytes,
                limit: MAX_SNAPSHOT_SIZE,
                actual: self.serialized_size(),
            });
        }
        for pair in self.headers.windows(2) {
            if pair[0].key == pair[1].key {
                return Err(CodecError::DuplicateItem { key: pair[0].key });
            }
            if pair[0].key > pair[1].key {
                return Err(CodecError::OutOfOrderKeys {
                    previous: pair[0].key,
                    current: pair[1].key,
                });
            }
        }
        Ok(())
    }

    /// Builds a snapshot from owned items, sorting and validating.
    pub(crate) fn from_items(mut items: Vec<(ItemKey, Vec<i32>)>) -> CodecResult<Self> {
        items.sort_by_key(|(key, _)| *key);

        let mut headers = Vec::with_capacity(items.len());
        let mut fields = Vec::new();
        for (key, values) in items {
            headers.push(ItemHeader {
                key,
                offset: fields.len(),
                len: values.len(),
            });
            fields.extend_from_slice(&values);
        }

        let snapshot = Self { headers, fields };
        snapshot.validate()?;
        Ok(snapshot)
    }
}

/// Single-use accumulator the simulation writes one tick's items into.
///
/// Item sizes come from the directory; writes that would break a snapshot
/// invariant are refused with a log line rather than an error, since a
/// dropped item is a data-loss event for one tick, not a protocol failure.
#[derive(Debug)]
pub struct SnapshotBuilder<'d> {
    directory: &'d Directory,
    headers: Vec<ItemHeader>,
    fields: Vec<i32>,
    seen: HashSet<ItemKey>,
}

impl<'d> SnapshotBuilder<'d> {
    /// Creates a builder for one tick.
    #[must_use]
    pub fn new(directory: &'d Directory) -> Self {
        Self {
            directory,
            headers: Vec::new(),
            fields: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Returns the number of items added so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Returns `true` if no items were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Adds an item and returns its zeroed field buffer for the caller to
    /// fill, sized by the directory's definition of the type.
    ///
    /// Returns `None` (logged) if the type is unknown, the key is a
    /// duplicate, or either snapshot cap would be exceeded.
    pub fn new_item(&mut self, key: ItemKey) -> Option<&mut [i32]> {
        let Some(len) = self.directory.field_count(key.type_id) else {
            log::warn!("snapshot builder: dropping item {key}: type not in directory");
            return None;
        };
        if self.headers.len() == MAX_SNAPSHOT_ITEMS {
            log::warn!("snapshot builder: dropping item {key}: item cap reached");
            return None;
        }
        let next_size =
            (self.headers.len() + 1) * ITEM_HEADER_BYTES + (self.fields.len() + len) * 4;
        if next_size > MAX_SNAPSHOT_SIZE {
            log::warn!("snapshot builder: dropping item {key}: size cap reached");
            return None;
        }
        if !self.seen.insert(key) {
            log::warn!("snapshot builder: dropping item {key}: duplicate key");
            return None;
        }

        let offset = self.fields.len();
        self.fields.resize(offset + len, 0);
        self.headers.push(ItemHeader { key, offset, len });
        Some(&mut self.fields[offset..offset + len])
    }

    /// Finalizes into an immutable snapshot, sorting items by key.
    #[must_use]
    pub fn finish(mut self) -> Snapshot {
        self.headers.sort_by_key(|header| header.key);
        let snapshot = Snapshot {
            headers: self.headers,
            fields: self.fields,
        };
        debug_assert!(snapshot.validate().is_ok());
        snapshot
    }
}
