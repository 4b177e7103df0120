//! Error types for entropy coding operations.

use std::fmt;

/// Errors that can occur while compressing or decompressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntropyError {
    /// The compressed stream ended before the EOF symbol was decoded.
    InputExhausted,
    /// The output buffer is too small for the result.
    OutputOverrun {
        /// Capacity of the buffer that overflowed.
        capacity: usize,
    },
}

impl fmt::Display for EntropyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputExhausted => {
                write!(f, "compressed stream ended before the EOF symbol")
            }
            Self::OutputOverrun { capacity } => {
                write!(f, "output buffer of {capacity} bytes is too small")
            }
        }
    }
}

impl std::error::Error for EntropyError {}

/// Result type for entropy coding operations.
pub type EntropyResult<T> = Result<T, EntropyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            EntropyError::InputExhausted.to_string(),
            "compressed stream ended before the EOF symbol"
        );
        assert_eq!(
            EntropyError::OutputOverrun { capacity: 8 }.to_string(),
            "output buffer of 8 bytes is too small"
        );
    }
}
