//! Static-table entropy coding for the snapnet codec.
//!
//! This crate provides [`Huffman`], a prefix coder over a fixed, hand-tuned
//! byte frequency table. Both peers build the identical code from the same
//! table at startup; the table is never transmitted and never adapts, which
//! makes the stream a closed, versioned format: changing [`FREQUENCY_TABLE`]
//! breaks compatibility with every deployed peer.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Bounded operations** - Overrunning an output buffer is a hard error,
//!   never a silent truncation.
//! - **Read-only after construction** - The coder is immutable once built and
//!   safe to share across threads.
//!
//! # Wire format
//!
//! Codes are emitted least-significant-bit first into a little-endian bit
//! accumulator. Every stream ends with the dedicated EOF symbol followed by
//! one flush byte; unused high bits of that final byte are zero. Peers only
//! need the shared table and bit order to interoperate - the padding is never
//! examined past EOF.
//!
//! # Example
//!
//! ```
//! use entropy::Huffman;
//!
//! let coder = Huffman::global();
//! let mut compressed = [0u8; 64];
//! let len = coder.compress(b"hello", &mut compressed).unwrap();
//!
//! let mut restored = [0u8; 64];
//! let restored_len = coder.decompress(&compressed[..len], &mut restored).unwrap();
//! assert_eq!(&restored[..restored_len], b"hello");
//! ```

mod error;
mod huffman;
mod table;

pub use error::{EntropyError, EntropyResult};
pub use huffman::Huffman;
pub use table::FREQUENCY_TABLE;

/// Number of symbols in the code: 256 byte values plus EOF.
pub const MAX_SYMBOLS: usize = 257;

/// Index of the end-of-stream symbol.
pub const EOF_SYMBOL: usize = 256;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_roundtrip() {
        let coder = Huffman::global();
        let mut compressed = [0u8; 16];
        let len = coder.compress(&[], &mut compressed).unwrap();
        assert!(len > 0, "EOF symbol still produces output");

        let mut restored = [0u8; 16];
        let restored_len = coder.decompress(&compressed[..len], &mut restored).unwrap();
        assert_eq!(restored_len, 0);
    }

    #[test]
    fn single_byte_roundtrip() {
        let coder = Huffman::global();
        for byte in [0u8, 1, 0x7F, 0xFF] {
            let mut compressed = [0u8; 16];
            let len = coder.compress(&[byte], &mut compressed).unwrap();
            let mut restored = [0u8; 16];
            let restored_len = coder.decompress(&compressed[..len], &mut restored).unwrap();
            assert_eq!(&restored[..restored_len], &[byte]);
        }
    }

    #[test]
    fn all_byte_values_roundtrip() {
        let coder = Huffman::global();
        let input: Vec<u8> = (0..=255).collect();
        let mut compressed = vec![0u8; 2048];
        let len = coder.compress(&input, &mut compressed).unwrap();
        let mut restored = vec![0u8; 2048];
        let restored_len = coder.decompress(&compressed[..len], &mut restored).unwrap();
        assert_eq!(&restored[..restored_len], input.as_slice());
    }

    #[test]
    fn zeros_compress_well() {
        let coder = Huffman::global();
        let input = [0u8; 1024];
        let mut compressed = vec![0u8; 2048];
        let len = coder.compress(&input, &mut compressed).unwrap();
        assert!(len < input.len() / 4, "zero runs must compress, got {len}");
    }

    #[test]
    fn compatibility_vector() {
        // Wire-compatibility anchor: a 64-byte buffer whose first eight bytes
        // are 0..=7 (rest zero) compresses to exactly 15 bytes under the
        // shipped table. Any change here breaks deployed peers.
        let coder = Huffman::global();
        let mut input = [0u8; 64];
        for (i, byte) in input.iter_mut().take(8).enumerate() {
            *byte = i as u8;
        }
        let mut compressed = [0u8; 128];
        let len = coder.compress(&input, &mut compressed).unwrap();
        assert_eq!(len, 15);

        let mut restored = [0u8; 128];
        let restored_len = coder.decompress(&compressed[..len], &mut restored).unwrap();
        assert_eq!(&restored[..restored_len], &input);
    }

    #[test]
    fn global_is_shared() {
        let a = Huffman::global() as *const Huffman;
        let b = Huffman::global() as *const Huffman;
        assert_eq!(a, b);
    }
}
