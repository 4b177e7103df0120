use std::collections::BTreeMap;

use codec::{
    apply, decode_change_list, diff, encode_change_list, CodecLimits, ItemKey, Snapshot,
    SnapshotBuilder, Tick, TypeId,
};
use directory::{directory_hash, Directory, ItemDef};
use proptest::prelude::*;

fn test_directory() -> Directory {
    Directory::builder()
        .item(ItemDef::with_fields(TypeId(1), "character", &["x", "y", "team"]))
        .item(ItemDef::with_fields(TypeId(2), "pickup", &["x", "y"]))
        .build()
        .unwrap()
}

type Items = BTreeMap<(u8, u8), [i32; 3]>;

fn items_strategy() -> impl Strategy<Value = Items> {
    prop::collection::btree_map((1u8..=2, 0u8..16), any::<[i32; 3]>(), 0..24)
}

fn build_snapshot(directory: &Directory, items: &Items) -> Snapshot {
    let mut builder = SnapshotBuilder::new(directory);
    for (&(type_raw, id_raw), fields) in items {
        let key = ItemKey::new(u16::from(type_raw), u16::from(id_raw));
        let len = directory.field_count(key.type_id).unwrap();
        builder.new_item(key).unwrap().copy_from_slice(&fields[..len]);
    }
    builder.finish()
}

proptest! {
    #[test]
    fn prop_apply_inverts_diff(from_items in items_strategy(), to_items in items_strategy()) {
        let directory = test_directory();
        let from = build_snapshot(&directory, &from_items);
        let to = build_snapshot(&directory, &to_items);

        let change = diff(Some(&from), &to, Tick::new(1), Tick::new(2));
        let restored = apply(&from, &change).unwrap();
        prop_assert_eq!(restored.checksum(), to.checksum());
        prop_assert_eq!(restored, to);
    }

    #[test]
    fn prop_self_diff_is_empty(items in items_strategy()) {
        let directory = test_directory();
        let state = build_snapshot(&directory, &items);

        let change = diff(Some(&state), &state, Tick::new(1), Tick::new(2));
        prop_assert!(change.is_empty());
        prop_assert_eq!(apply(&state, &change).unwrap(), state);
    }

    #[test]
    fn prop_full_snapshot_from_empty(items in items_strategy()) {
        let directory = test_directory();
        let state = build_snapshot(&directory, &items);

        let change = diff(None, &state, Tick::new(99), Tick::new(100));
        prop_assert!(change.is_full());
        prop_assert_eq!(change.added.len(), state.len());
        prop_assert_eq!(apply(Snapshot::empty(), &change).unwrap(), state);
    }

    #[test]
    fn prop_wire_roundtrip(from_items in items_strategy(), to_items in items_strategy()) {
        let directory = test_directory();
        let from = build_snapshot(&directory, &from_items);
        let to = build_snapshot(&directory, &to_items);
        let change = diff(Some(&from), &to, Tick::new(1), Tick::new(2));

        let bytes = encode_change_list(directory_hash(&directory), &change);
        let decoded = decode_change_list(&bytes, &directory, &CodecLimits::default()).unwrap();
        prop_assert_eq!(decoded, change);
    }

    #[test]
    fn prop_decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let directory = test_directory();
        let _ = decode_change_list(&bytes, &directory, &CodecLimits::for_testing());
    }
}
