//! Change-list computation, application, and wire encoding.

use std::collections::{BTreeMap, HashMap, HashSet};

use directory::{directory_hash, Directory, ItemKey, TypeId};
use packer::{PackError, Packer, Unpacker};

use crate::error::{CodecError, CodecResult, LimitKind};
use crate::limits::CodecLimits;
use crate::snapshot::Snapshot;
use crate::types::Tick;

/// A full item carried by a change-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPayload {
    pub key: ItemKey,
    pub fields: Vec<i32>,
}

/// One overwritten field within a changed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPatch {
    pub index: usize,
    pub value: i32,
}

/// Sparse field overwrites for one item present in both snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPatch {
    pub key: ItemKey,
    pub fields: Vec<FieldPatch>,
}

/// The difference between two snapshots, meaningful only relative to its
/// `(from_tick, to_tick)` pair.
///
/// `from_tick` of [`Tick::NONE`] marks a full snapshot: everything is in
/// `added` and the baseline is the empty snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeList {
    pub from_tick: Tick,
    pub to_tick: Tick,
    pub removed: Vec<ItemKey>,
    pub added: Vec<ItemPayload>,
    pub changed: Vec<ItemPatch>,
}

impl ChangeList {
    /// Returns `true` if the change-list carries no changes.
    ///
    /// An empty change-list is still a valid payload: it tells the peer that
    /// `to_tick` equals the baseline.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty() && self.changed.is_empty()
    }

    /// Returns `true` if this is a full snapshot rather than a delta.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.from_tick.is_none()
    }
}

/// Per-type accounting of applied delta traffic.
///
/// Answers "which item types eat the bandwidth" without touching the hot
/// path; byte counts are decoded payload bytes, not compressed wire bytes.
#[derive(Debug, Clone, Default)]
pub struct ApplyStats {
    per_type: BTreeMap<TypeId, TypeStats>,
}

/// Counters for a single item type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeStats {
    pub updates: u64,
    pub bytes: u64,
}

impl ApplyStats {
    /// Returns counters for a type, if any were recorded.
    #[must_use]
    pub fn get(&self, type_id: TypeId) -> Option<TypeStats> {
        self.per_type.get(&type_id).copied()
    }

    /// Iterates counters in type order.
    pub fn iter(&self) -> impl Iterator<Item = (TypeId, TypeStats)> + '_ {
        self.per_type.iter().map(|(&id, &stats)| (id, stats))
    }

    fn record(&mut self, type_id: TypeId, bytes: usize) {
        let entry = self.per_type.entry(type_id).or_default();
        entry.updates += 1;
        entry.bytes += bytes as u64;
    }
}

/// Computes the change-list transforming `from` into `to`.
///
/// Both snapshots are sorted by key, so this is a single merge-walk. A
/// `None` baseline produces the full-snapshot fallback: every item added.
#[must_use]
pub fn diff(
    from: Option<&Snapshot>,
    to: &Snapshot,
    from_tick: Tick,
    to_tick: Tick,
) -> ChangeList {
    let empty = Snapshot::empty();
    let (from, from_tick) = match from {
        Some(snapshot) => (snapshot, from_tick),
        None => (empty, Tick::NONE),
    };

    let mut change = ChangeList {
        from_tick,
        to_tick,
        removed: Vec::new(),
        added: Vec::new(),
        changed: Vec::new(),
    };

    let mut old_index = 0;
    let mut new_index = 0;

    loop {
        match (from.get(old_index), to.get(new_index)) {
            (Some((old_key, old_fields)), Some((new_key, new_fields))) => {
                if old_key < new_key {
                    change.removed.push(old_key);
                    old_index += 1;
                } else if new_key < old_key {
                    change.added.push(ItemPayload {
                        key: new_key,
                        fields: new_fields.to_vec(),
                    });
                    new_index += 1;
                } else {
                    debug_assert_eq!(old_fields.len(), new_fields.len());
                    let fields: Vec<FieldPatch> = old_fields
                        .iter()
                        .zip(new_fields.iter())
                        .enumerate()
                        .filter(|(_, (old, new))| old != new)
                        .map(|(index, (_, &value))| FieldPatch { index, value })
                        .collect();
                    if !fields.is_empty() {
                        change.changed.push(ItemPatch {
                            key: new_key,
                            fields,
                        });
                    }
                    old_index += 1;
                    new_index += 1;
                }
            }
            (Some((old_key, _)), None) => {
                change.removed.push(old_key);
                old_index += 1;
            }
            (None, Some((new_key, new_fields))) => {
                change.added.push(ItemPayload {
                    key: new_key,
                    fields: new_fields.to_vec(),
                });
                new_index += 1;
            }
            (None, None) => break,
        }
    }

    change
}

/// Applies a change-list to its baseline, producing the target snapshot.
///
/// See [`apply_with_stats`] for the failure contract.
pub fn apply(from: &Snapshot, change: &ChangeList) -> CodecResult<Snapshot> {
    let mut stats = ApplyStats::default();
    apply_with_stats(from, change, &mut stats)
}

/// Applies a change-list, recording per-type traffic into `stats`.
///
/// # Errors
///
/// Fails with [`CodecError::MissingItem`] when a removed or changed key is
/// absent from the baseline (the desync signal), [`CodecError::DuplicateItem`]
/// for contradictory or repeated entries, [`CodecError::FieldIndexOutOfRange`]
/// for bad patches, and a limit error if the result would exceed snapshot
/// bounds.
pub fn apply_with_stats(
    from: &Snapshot,
    change: &ChangeList,
    stats: &mut ApplyStats,
) -> CodecResult<Snapshot> {
    let mut removed = HashSet::with_capacity(change.removed.len());
    for &key in &change.removed {
        if from.find(key).is_none() {
            return Err(CodecError::MissingItem { key });
        }
        if !removed.insert(key) {
            return Err(CodecError::DuplicateItem { key });
        }
    }

    let mut patches: HashMap<ItemKey, &ItemPatch> = HashMap::with_capacity(change.changed.len());
    for patch in &change.changed {
        if from.find(patch.key).is_none() || removed.contains(&patch.key) {
            return Err(CodecError::MissingItem { key: patch.key });
        }
        if patches.insert(patch.key, patch).is_some() {
            return Err(CodecError::DuplicateItem { key: patch.key });
        }
    }

    let mut items = Vec::with_capacity(from.len() + change.added.len());
    for (key, fields) in from.iter() {
        if removed.contains(&key) {
            continue;
        }
        let mut values = fields.to_vec();
        if let Some(patch) = patches.get(&key) {
            for &FieldPatch { index, value } in &patch.fields {
                let Some(slot) = values.get_mut(index) else {
                    return Err(CodecError::FieldIndexOutOfRange {
                        key,
                        index,
                        len: fields.len(),
                    });
                };
                *slot = value;
            }
            stats.record(key.type_id, patch.fields.len() * 4);
        }
        items.push((key, values));
    }

    for item in &change.added {
        if from.find(item.key).is_some() {
            return Err(CodecError::DuplicateItem { key: item.key });
        }
        stats.record(item.key.type_id, item.fields.len() * 4);
        items.push((item.key, item.fields.clone()));
    }

    Snapshot::from_items(items)
}

/// Serializes a change-list as a varint stream prefixed by the directory
/// hash and the tick pair. This is the uncompressed wire form; callers run
/// it through the entropy coder before transmission.
#[must_use]
pub fn encode_change_list(directory_hash: u64, change: &ChangeList) -> Vec<u8> {
    let mut packer = Packer::with_capacity(64);
    packer.put_uint(directory_hash as u32);
    packer.put_uint((directory_hash >> 32) as u32);
    packer.put_uint(change.from_tick.raw());
    packer.put_uint(change.to_tick.raw());

    packer.put_uint(change.removed.len() as u32);
    for key in &change.removed {
        put_key(&mut packer, *key);
    }

    packer.put_uint(change.added.len() as u32);
    for item in &change.added {
        put_key(&mut packer, item.key);
        packer.put_uint(item.fields.len() as u32);
        for &field in &item.fields {
            packer.put_int(field);
        }
    }

    packer.put_uint(change.changed.len() as u32);
    for patch in &change.changed {
        put_key(&mut packer, patch.key);
        packer.put_uint(patch.fields.len() as u32);
        for &FieldPatch { index, value } in &patch.fields {
            packer.put_uint(index as u32);
            packer.put_int(value);
        }
    }

    packer.finish()
}

/// Decodes a change-list, validating every count against `limits` before
/// allocating and every item against the directory.
pub fn decode_change_list(
    bytes: &[u8],
    directory: &Directory,
    limits: &CodecLimits,
) -> CodecResult<ChangeList> {
    let mut unpacker = Unpacker::new(bytes);

    let hash_low = unpacker.take_uint()?;
    let hash_high = unpacker.take_uint()?;
    let found = u64::from(hash_low) | (u64::from(hash_high) << 32);
    let expected = directory_hash(directory);
    if found != expected {
        return Err(CodecError::DirectoryMismatch { expected, found });
    }

    let from_tick = Tick::new(unpacker.take_uint()?);
    let to_tick = Tick::new(unpacker.take_uint()?);

    let removed_count = checked_count(unpacker.take_uint()?, limits.max_removed, LimitKind::Removed)?;
    let mut removed = Vec::with_capacity(removed_count);
    for _ in 0..removed_count {
        let key = take_key(&mut unpacker)?;
        known_type(directory, key.type_id)?;
        removed.push(key);
    }

    let added_count = checked_count(unpacker.take_uint()?, limits.max_added, LimitKind::Added)?;
    let mut added = Vec::with_capacity(added_count);
    for _ in 0..added_count {
        let key = take_key(&mut unpacker)?;
        let expected_fields = known_type(directory, key.type_id)?;
        let count = checked_count(
            unpacker.take_uint()?,
            limits.max_fields_per_item,
            LimitKind::FieldsPerItem,
        )?;
        if count != expected_fields {
            return Err(CodecError::FieldCountMismatch {
                type_id: key.type_id,
                expected: expected_fields,
                found: count,
            });
        }
        let mut fields = Vec::with_capacity(count);
        for _ in 0..count {
            fields.push(unpacker.take_int()?);
        }
        added.push(ItemPayload { key, fields });
    }

    let changed_count = checked_count(unpacker.take_uint()?, limits.max_changed, LimitKind::Changed)?;
    let mut changed = Vec::with_capacity(changed_count);
    for _ in 0..changed_count {
        let key = take_key(&mut unpacker)?;
        let field_count = known_type(directory, key.type_id)?;
        let count = checked_count(
            unpacker.take_uint()?,
            limits.max_fields_per_item,
            LimitKind::FieldsPerItem,
        )?;
        let mut fields = Vec::with_capacity(count);
        for _ in 0..count {
            let index = unpacker.take_uint()? as usize;
            let value = unpacker.take_int()?;
            if index >= field_count {
                return Err(CodecError::FieldIndexOutOfRange {
                    key,
                    index,
                    len: field_count,
                });
            }
            fields.push(FieldPatch { index, value });
        }
        changed.push(ItemPatch { key, fields });
    }

    if !unpacker.is_empty() {
        return Err(CodecError::TrailingData {
            remaining: unpacker.remaining(),
        });
    }

    Ok(ChangeList {
        from_tick,
        to_tick,
        removed,
        added,
        changed,
    })
}

fn put_key(packer: &mut Packer, key: ItemKey) {
    packer.put_uint(u32::from(key.type_id.get()));
    packer.put_uint(u32::from(key.item_id.get()));
}

fn take_key(unpacker: &mut Unpacker<'_>) -> CodecResult<ItemKey> {
    let offset = unpacker.position();
    let type_raw = unpacker.take_uint()?;
    let item_raw = unpacker.take_uint()?;
    match (u16::try_from(type_raw), u16::try_from(item_raw)) {
        (Ok(type_id), Ok(item_id)) => Ok(ItemKey::new(type_id, item_id)),
        _ => Err(CodecError::Pack(PackError::Malformed { offset })),
    }
}

fn known_type(directory: &Directory, type_id: TypeId) -> CodecResult<usize> {
    directory
        .field_count(type_id)
        .ok_or(CodecError::UnknownType { type_id })
}

fn checked_count(raw: u32, limit: usize, kind: LimitKind) -> CodecResult<usize> {
    let count = raw as usize;
    if count > limit {
        return Err(CodecError::LimitExceeded {
            kind,
            limit,
            actual: count,
        });
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotBuilder;
    use directory::ItemDef;

    fn test_directory() -> Directory {
        Directory::builder()
            .item(ItemDef::with_fields(TypeId(1), "character", &["x", "y", "team"]))
            .item(ItemDef::with_fields(TypeId(2), "pickup", &["x", "y"]))
            .build()
            .unwrap()
    }

    fn snapshot(directory: &Directory, items: &[(ItemKey, &[i32])]) -> Snapshot {
        let mut builder = SnapshotBuilder::new(directory);
        for (key, fields) in items {
            builder.new_item(*key).unwrap().copy_from_slice(fields);
        }
        builder.finish()
    }

    #[test]
    fn zero_delta() {
        let directory = test_directory();
        let state = snapshot(&directory, &[(ItemKey::new(1, 1), &[1, 2, 3])]);
        let change = diff(Some(&state), &state, Tick::new(1), Tick::new(2));
        assert!(change.is_empty());
        assert!(!change.is_full());

        let restored = apply(&state, &change).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn empty_baseline_adds_everything() {
        let directory = test_directory();
        let state = snapshot(
            &directory,
            &[
                (ItemKey::new(1, 1), &[1, 2, 3]),
                (ItemKey::new(2, 1), &[4, 5]),
            ],
        );
        let change = diff(None, &state, Tick::new(9), Tick::new(10));
        assert!(change.is_full());
        assert_eq!(change.from_tick, Tick::NONE);
        assert_eq!(change.added.len(), 2);
        assert!(change.removed.is_empty());
        assert!(change.changed.is_empty());

        let restored = apply(Snapshot::empty(), &change).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn diff_emits_sparse_patches() {
        let directory = test_directory();
        let from = snapshot(&directory, &[(ItemKey::new(1, 1), &[10, 20, 30])]);
        let to = snapshot(&directory, &[(ItemKey::new(1, 1), &[10, 99, 30])]);

        let change = diff(Some(&from), &to, Tick::new(1), Tick::new(2));
        assert_eq!(change.changed.len(), 1);
        assert_eq!(
            change.changed[0].fields,
            vec![FieldPatch {
                index: 1,
                value: 99
            }]
        );

        let restored = apply(&from, &change).unwrap();
        assert_eq!(restored, to);
    }

    #[test]
    fn diff_apply_inverse_with_all_kinds() {
        let directory = test_directory();
        let from = snapshot(
            &directory,
            &[
                (ItemKey::new(1, 1), &[1, 1, 1]),
                (ItemKey::new(1, 2), &[2, 2, 2]),
                (ItemKey::new(2, 1), &[3, 3]),
            ],
        );
        let to = snapshot(
            &directory,
            &[
                (ItemKey::new(1, 1), &[1, 9, 1]),
                (ItemKey::new(2, 1), &[3, 3]),
                (ItemKey::new(2, 2), &[7, 7]),
            ],
        );

        let change = diff(Some(&from), &to, Tick::new(5), Tick::new(6));
        assert_eq!(change.removed, vec![ItemKey::new(1, 2)]);
        assert_eq!(change.added.len(), 1);
        assert_eq!(change.changed.len(), 1);

        let restored = apply(&from, &change).unwrap();
        assert_eq!(restored, to);
        assert_eq!(restored.checksum(), to.checksum());
    }

    #[test]
    fn apply_rejects_removed_key_missing_from_baseline() {
        let directory = test_directory();
        let from = snapshot(&directory, &[(ItemKey::new(1, 1), &[0, 0, 0])]);
        let change = ChangeList {
            from_tick: Tick::new(1),
            to_tick: Tick::new(2),
            removed: vec![ItemKey::new(1, 9)],
            added: Vec::new(),
            changed: Vec::new(),
        };
        let err = apply(&from, &change).unwrap_err();
        assert_eq!(
            err,
            CodecError::MissingItem {
                key: ItemKey::new(1, 9)
            }
        );
    }

    #[test]
    fn apply_rejects_added_key_already_in_baseline() {
        let directory = test_directory();
        let from = snapshot(&directory, &[(ItemKey::new(1, 1), &[0, 0, 0])]);
        let change = ChangeList {
            from_tick: Tick::new(1),
            to_tick: Tick::new(2),
            removed: Vec::new(),
            added: vec![ItemPayload {
                key: ItemKey::new(1, 1),
                fields: vec![1, 2, 3],
            }],
            changed: Vec::new(),
        };
        let err = apply(&from, &change).unwrap_err();
        assert!(matches!(err, CodecError::DuplicateItem { .. }));
    }

    #[test]
    fn apply_rejects_patch_past_item_end() {
        let directory = test_directory();
        let from = snapshot(&directory, &[(ItemKey::new(2, 1), &[0, 0])]);
        let change = ChangeList {
            from_tick: Tick::new(1),
            to_tick: Tick::new(2),
            removed: Vec::new(),
            added: Vec::new(),
            changed: vec![ItemPatch {
                key: ItemKey::new(2, 1),
                fields: vec![FieldPatch { index: 2, value: 1 }],
            }],
        };
        let err = apply(&from, &change).unwrap_err();
        assert!(matches!(err, CodecError::FieldIndexOutOfRange { .. }));
    }

    #[test]
    fn apply_records_per_type_stats() {
        let directory = test_directory();
        let from = snapshot(&directory, &[(ItemKey::new(1, 1), &[0, 0, 0])]);
        let to = snapshot(
            &directory,
            &[
                (ItemKey::new(1, 1), &[1, 0, 0]),
                (ItemKey::new(2, 1), &[5, 5]),
            ],
        );
        let change = diff(Some(&from), &to, Tick::new(1), Tick::new(2));

        let mut stats = ApplyStats::default();
        apply_with_stats(&from, &change, &mut stats).unwrap();

        let characters = stats.get(TypeId(1)).unwrap();
        assert_eq!(characters.updates, 1);
        assert_eq!(characters.bytes, 4);
        let pickups = stats.get(TypeId(2)).unwrap();
        assert_eq!(pickups.updates, 1);
        assert_eq!(pickups.bytes, 8);
    }

    #[test]
    fn wire_roundtrip() {
        let directory = test_directory();
        let from = snapshot(&directory, &[(ItemKey::new(1, 1), &[1, 2, 3])]);
        let to = snapshot(
            &directory,
            &[
                (ItemKey::new(1, 1), &[1, -5, 3]),
                (ItemKey::new(2, 1), &[i32::MIN, i32::MAX]),
            ],
        );
        let change = diff(Some(&from), &to, Tick::new(3), Tick::new(4));

        let bytes = encode_change_list(directory_hash(&directory), &change);
        let decoded = decode_change_list(&bytes, &directory, &CodecLimits::default()).unwrap();
        assert_eq!(decoded, change);
    }

    #[test]
    fn decode_rejects_wrong_directory() {
        let directory = test_directory();
        let other = Directory::builder()
            .item(ItemDef::with_fields(TypeId(1), "character", &["x", "y", "armor"]))
            .build()
            .unwrap();
        let state = snapshot(&directory, &[(ItemKey::new(1, 1), &[1, 2, 3])]);
        let change = diff(None, &state, Tick::NONE, Tick::new(1));

        let bytes = encode_change_list(directory_hash(&directory), &change);
        let err = decode_change_list(&bytes, &other, &CodecLimits::default()).unwrap_err();
        assert!(matches!(err, CodecError::DirectoryMismatch { .. }));
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let directory = test_directory();
        let state = snapshot(&directory, &[(ItemKey::new(1, 1), &[1, 2, 3])]);
        let change = diff(None, &state, Tick::NONE, Tick::new(1));

        let mut bytes = encode_change_list(directory_hash(&directory), &change);
        bytes.push(0);
        let err = decode_change_list(&bytes, &directory, &CodecLimits::default()).unwrap_err();
        assert_eq!(err, CodecError::TrailingData { remaining: 1 });
    }

    #[test]
    fn decode_enforces_count_limits() {
        let directory = test_directory();
        let mut builder = SnapshotBuilder::new(&directory);
        for id in 0..40 {
            builder.new_item(ItemKey::new(1, id)).unwrap();
        }
        let state = builder.finish();
        let change = diff(None, &state, Tick::NONE, Tick::new(1));

        let bytes = encode_change_list(directory_hash(&directory), &change);
        let err =
            decode_change_list(&bytes, &directory, &CodecLimits::for_testing()).unwrap_err();
        assert!(matches!(
            err,
            CodecError::LimitExceeded {
                kind: LimitKind::Added,
                ..
            }
        ));
    }

    #[test]
    fn decode_rejects_unknown_type() {
        let directory = test_directory();
        let change = ChangeList {
            from_tick: Tick::NONE,
            to_tick: Tick::new(1),
            removed: Vec::new(),
            added: vec![ItemPayload {
                key: ItemKey::new(42, 0),
                fields: vec![1],
            }],
            changed: Vec::new(),
        };
        let bytes = encode_change_list(directory_hash(&directory), &change);
        let err = decode_change_list(&bytes, &directory, &CodecLimits::default()).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnknownType {
                type_id: TypeId(42)
            }
        );
    }

    #[test]
    fn decode_rejects_field_count_mismatch() {
        let directory = test_directory();
        let change = ChangeList {
            from_tick: Tick::NONE,
            to_tick: Tick::new(1),
            removed: Vec::new(),
            added: vec![ItemPayload {
                key: ItemKey::new(2, 0),
                // pickup has two fields
                fields: vec![1, 2, 3],
            }],
            changed: Vec::new(),
        };
        let bytes = encode_change_list(directory_hash(&directory), &change);
        let err = decode_change_list(&bytes, &directory, &CodecLimits::default()).unwrap_err();
        assert!(matches!(err, CodecError::FieldCountMismatch { .. }));
    }

    #[test]
    fn decode_rejects_truncated_stream() {
        let directory = test_directory();
        let state = snapshot(&directory, &[(ItemKey::new(1, 1), &[1, 2, 3])]);
        let change = diff(None, &state, Tick::NONE, Tick::new(1));

        let bytes = encode_change_list(directory_hash(&directory), &change);
        let err =
            decode_change_list(&bytes[..bytes.len() - 1], &directory, &CodecLimits::default())
                .unwrap_err();
        assert!(matches!(err, CodecError::Pack(_)));
    }
}
