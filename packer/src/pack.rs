//! Byte-stream writer emitting variable-length integers.

use crate::zigzag;

/// A writer that accumulates varints and raw bytes into a growable buffer.
///
/// Call [`finish`](Self::finish) to take the final byte buffer.
#[derive(Debug, Default)]
pub struct Packer {
    bytes: Vec<u8>,
}

impl Packer {
    /// Creates a new empty `Packer`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `Packer` with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
        }
    }

    /// Returns the number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Writes a signed 32-bit value as a zigzag varint.
    pub fn put_int(&mut self, value: i32) {
        self.put_uint(zigzag(value));
    }

    /// Writes an unsigned 32-bit value as a varint.
    pub fn put_uint(&mut self, mut value: u32) {
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            self.bytes.push(byte);
            if value == 0 {
                break;
            }
        }
    }

    /// Writes raw bytes verbatim.
    pub fn put_raw(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    /// Finishes writing and returns the byte buffer.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }

    /// Finishes writing and appends to the provided buffer.
    pub fn finish_into(mut self, buf: &mut Vec<u8>) {
        buf.append(&mut self.bytes);
    }
}
