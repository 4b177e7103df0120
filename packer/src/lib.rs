//! Variable-length integer packing primitives for the snapnet codec.
//!
//! This crate provides [`Packer`] and [`Unpacker`] for encoding and decoding
//! dense streams of sign-folded variable-length integers. It is the byte-level
//! foundation the delta codec serializes change-lists with.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Bounded operations** - All reads are bounds-checked.
//! - **No domain knowledge** - This crate knows nothing about snapshots,
//!   items, or ticks.
//! - **Explicit errors** - All failures return structured errors, never panic.
//!
//! # Wire format
//!
//! A signed 32-bit value is zigzag-folded to unsigned, then emitted seven bits
//! per byte, low bits first, with bit 7 of each byte as a continuation flag.
//! An encoded value is at most [`MAX_VARINT_BYTES`] bytes; the terminal byte
//! of a maximum-length encoding carries only four value bits, and a decoder
//! rejects anything longer or wider as malformed.
//!
//! # Example
//!
//! ```
//! use packer::{Packer, Unpacker};
//!
//! let mut packer = Packer::new();
//! packer.put_int(-300);
//! packer.put_int(42);
//!
//! let bytes = packer.finish();
//!
//! let mut unpacker = Unpacker::new(&bytes);
//! assert_eq!(unpacker.take_int().unwrap(), -300);
//! assert_eq!(unpacker.take_int().unwrap(), 42);
//! assert!(unpacker.is_empty());
//! ```

mod error;
mod pack;
mod unpack;

pub use error::{PackError, PackResult};
pub use pack::Packer;
pub use unpack::Unpacker;

/// Maximum encoded length of a single 32-bit varint.
pub const MAX_VARINT_BYTES: usize = 5;

/// Folds a signed value into an unsigned one so that small magnitudes of
/// either sign encode short.
#[must_use]
pub const fn zigzag(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Inverse of [`zigzag`].
#[must_use]
pub const fn unzigzag(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}
