//! Deterministic directory hashing.

use blake3::Hasher;

use crate::Directory;

/// Computes a deterministic hash over a directory's full definition.
///
/// Both peers embed this in every payload; a mismatch means the catalogues
/// diverged and the payload cannot be interpreted. The hash covers type ids,
/// names, and field names in declaration order.
#[must_use]
pub fn directory_hash(directory: &Directory) -> u64 {
    let mut hasher = Hasher::new();
    write_u32(&mut hasher, directory.defs().len() as u32);

    for def in directory.defs() {
        write_u16(&mut hasher, def.type_id.get());
        write_str(&mut hasher, &def.name);
        write_u32(&mut hasher, def.fields.len() as u32);
        for field in &def.fields {
            write_str(&mut hasher, field);
        }
    }

    let hash = hasher.finalize();
    let bytes = hash.as_bytes();
    u64::from_le_bytes(bytes[0..8].try_into().unwrap())
}

fn write_str(hasher: &mut Hasher, value: &str) {
    write_u32(hasher, value.len() as u32);
    hasher.update(value.as_bytes());
}

fn write_u16(hasher: &mut Hasher, value: u16) {
    hasher.update(&value.to_le_bytes());
}

fn write_u32(hasher: &mut Hasher, value: u32) {
    hasher.update(&value.to_le_bytes());
}
