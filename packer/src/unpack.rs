//! Bounded reader for packed varint streams.

use crate::error::{PackError, PackResult};
use crate::{unzigzag, MAX_VARINT_BYTES};

/// A reader for packed varint streams.
///
/// All read operations are bounds-checked and return errors on failure.
/// The reader never panics on malformed input.
#[derive(Debug)]
pub struct Unpacker<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Unpacker<'a> {
    /// Creates a new `Unpacker` over a byte slice.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the number of bytes remaining to read.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns `true` if there are no more bytes to read.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Returns the current byte position.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Reads an unsigned 32-bit varint.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::EndOfBuffer`] on truncated input and
    /// [`PackError::Malformed`] if the encoding exceeds
    /// [`MAX_VARINT_BYTES`] or carries bits beyond the 32-bit domain.
    pub fn take_uint(&mut self) -> PackResult<u32> {
        let start = self.pos;
        let mut result = 0u32;
        for shift in (0..32).step_by(7) {
            let byte = self.take_byte()?;
            // The terminal byte of a maximum-length encoding has room for
            // four value bits; anything wider cannot come from a u32.
            if shift == 7 * (MAX_VARINT_BYTES - 1) && byte & 0xF0 != 0 {
                return Err(PackError::Malformed { offset: start });
            }
            result |= u32::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(PackError::Malformed { offset: start })
    }

    /// Reads a signed 32-bit zigzag varint.
    pub fn take_int(&mut self) -> PackResult<i32> {
        Ok(unzigzag(self.take_uint()?))
    }

    /// Reads `len` raw bytes verbatim.
    pub fn take_raw(&mut self, len: usize) -> PackResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(PackError::EndOfBuffer {
                requested: len,
                available: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn take_byte(&mut self) -> PackResult<u8> {
        if self.pos >= self.data.len() {
            return Err(PackError::EndOfBuffer {
                requested: 1,
                available: 0,
            });
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }
}
