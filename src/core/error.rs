// Decoding errors for block archive data

use thiserror::Error;

/// Errors raised while decoding headers, transactions and digests
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The buffer ran out in the middle of a read
    #[error("unexpected end of buffer at offset {position}: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEndOfBuffer {
        position: usize,
        needed: usize,
        remaining: usize,
    },

    /// A variable-length integer does not fit into an exactly representable integer
    #[error("variable-length integer {0} is too large")]
    ValueTooLarge(u64),

    /// A digest was built from something other than 32 bytes
    #[error("invalid digest length: expected 32, got {0}")]
    InvalidLength(usize),

    /// A digest display string is not valid hex
    #[error("invalid hex string: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// A seek or rewind landed outside the buffer
    #[error("offset {offset} is outside of the buffer (length {len})")]
    SeekOutOfBounds { offset: isize, len: usize },
}
