//! Error types for PM1 embedding and extraction.

use std::fmt;
use thiserror::Error;

use stegano_genetic::GeneticError;

/// Result type alias for PM1 operations.
pub type Result<T> = std::result::Result<T, Pm1Error>;

/// Errors that can occur while embedding, extracting or optimizing.
#[derive(Error)]
pub enum Pm1Error {
    /// The permutation was read before `init()` was called.
    #[error("permutation is not initialized")]
    PermutationNotInitialized,

    /// `init()` was called on a permutation that is already initialized.
    #[error("permutation is already initialized")]
    PermutationAlreadyInitialized,

    /// A rank outside of `[0, size)` was requested from a permutation.
    #[error("permutation index {index} out of range for size {size}")]
    PermutationIndexOutOfRange { index: usize, size: usize },

    /// The cover ran out of usable coefficients before all bits were embedded.
    #[error("capacity exceeded: {required} bits required, {available} usable coefficients left")]
    CapacityExceeded { required: usize, available: usize },

    /// The stego image ran out of usable coefficients while reading (wrong key or no message).
    #[error("insufficient coefficients: {required} bits expected, {available} could be read")]
    InsufficientCoefficients { required: usize, available: usize },

    /// Message does not fit the 16-bit length field.
    #[error("message length {message_len} exceeds maximum of 65535 bytes")]
    MessageTooLong { message_len: usize },

    /// The plus-minus sequence does not match the number of bits to embed.
    #[error("plus-minus sequence has {actual} entries but {expected} are required")]
    SequenceLength { expected: usize, actual: usize },

    /// Coefficient data or quantization tables are inconsistent.
    #[error("invalid image: {reason}")]
    InvalidImage { reason: String },

    /// I/O error during bit operations.
    #[error("bit I/O error: {0}")]
    BitIo(#[from] std::io::Error),

    /// The genetic search failed.
    #[error("genetic search failed: {0}")]
    Genetic(#[from] GeneticError),
}

impl fmt::Debug for Pm1Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}
