//! Error types for packing operations.

use std::fmt;

/// Result type for packing operations.
pub type PackResult<T> = Result<T, PackError>;

/// Errors that can occur while decoding a packed stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackError {
    /// Attempted to read past the end of the buffer.
    EndOfBuffer {
        /// Number of bytes requested.
        requested: usize,
        /// Number of bytes available.
        available: usize,
    },

    /// A varint ran past its maximum length or carried overflow bits.
    Malformed {
        /// Byte offset of the start of the offending varint.
        offset: usize,
    },
}

impl fmt::Display for PackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndOfBuffer {
                requested,
                available,
            } => {
                write!(
                    f,
                    "attempted to read {requested} bytes but only {available} bytes available"
                )
            }
            Self::Malformed { offset } => {
                write!(f, "malformed varint at byte offset {offset}")
            }
        }
    }
}

impl std::error::Error for PackError {}
