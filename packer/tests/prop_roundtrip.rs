use packer::{Packer, PackError, Unpacker, MAX_VARINT_BYTES};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Int(i32),
    UInt(u32),
    Raw(Vec<u8>),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<i32>().prop_map(Op::Int),
        any::<u32>().prop_map(Op::UInt),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Op::Raw),
    ]
}

proptest! {
    #[test]
    fn prop_roundtrip_ops(ops in prop::collection::vec(op_strategy(), 1..64)) {
        let mut packer = Packer::new();
        for op in &ops {
            match op {
                Op::Int(v) => packer.put_int(*v),
                Op::UInt(v) => packer.put_uint(*v),
                Op::Raw(bytes) => packer.put_raw(bytes),
            }
        }

        let bytes = packer.finish();
        let mut unpacker = Unpacker::new(&bytes);
        for op in &ops {
            match op {
                Op::Int(v) => prop_assert_eq!(unpacker.take_int().unwrap(), *v),
                Op::UInt(v) => prop_assert_eq!(unpacker.take_uint().unwrap(), *v),
                Op::Raw(expected) => {
                    prop_assert_eq!(unpacker.take_raw(expected.len()).unwrap(), expected.as_slice());
                }
            }
        }
        prop_assert!(unpacker.is_empty());
    }

    #[test]
    fn prop_single_int_length_bound(value in any::<i32>()) {
        let mut packer = Packer::new();
        packer.put_int(value);
        prop_assert!(packer.len() <= MAX_VARINT_BYTES);
    }

    #[test]
    fn prop_decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let mut unpacker = Unpacker::new(&bytes);
        loop {
            match unpacker.take_int() {
                Ok(_) => {}
                Err(PackError::EndOfBuffer { .. } | PackError::Malformed { .. }) => break,
            }
            if unpacker.is_empty() {
                break;
            }
        }
    }
}
