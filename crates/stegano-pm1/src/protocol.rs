//! Bit-level rules shared by the embedder and the extractor.
//!
//! A stego image carries, in walk order:
//! 1. the 16-bit embedding seed, big-endian, walked with the key-derived seed
//! 2. the 16-bit message length in bytes, big-endian, walked with the embedding seed
//! 3. the message bytes, most significant bit first, continuing the second walk
//!
//! Each usable coefficient carries one bit, see [`carried_bit`].

use stegano_genetic::Chromosome;

/// Bits used to store the embedding seed.
pub const SEED_BITS: usize = 16;

/// Bits used to store the message length.
pub const LENGTH_BITS: usize = 16;

/// Longest message in bytes that fits the length field.
pub const MAX_MESSAGE_LEN: usize = u16::MAX as usize;

/// The bit a coefficient carries: the low bit of `v` for `v >= 0`, of `!v` otherwise.
///
/// Stepping a non-zero value by one in either direction always flips this bit,
/// except when stepping onto zero.
#[inline]
pub fn carried_bit(value: i16) -> bool {
    let magnitude = if value < 0 { !value } else { value };
    magnitude & 1 == 1
}

/// New value for a coefficient whose carried bit disagrees with `target`.
///
/// Moves by `+1` when `increment` is set, `-1` otherwise. Landing on zero is replaced
/// by `-1` for a target of 0 and `+1` for a target of 1.
#[inline]
pub fn perturb(value: i16, target: bool, increment: bool) -> i16 {
    let stepped = if increment {
        value.checked_add(1).unwrap_or(value - 1)
    } else {
        value.checked_sub(1).unwrap_or(value + 1)
    };
    match stepped {
        0 if target => 1,
        0 => -1,
        v => v,
    }
}

/// Supplies the direction of each ±1 change, indexed by running bit count.
pub trait PmSequence {
    /// Whether the change at bit `index` should increment the coefficient.
    fn increment_at(&self, index: usize) -> bool;

    /// Number of entries, `None` for sequences without a fixed length.
    fn len(&self) -> Option<usize> {
        None
    }
}

impl<T: PmSequence + ?Sized> PmSequence for &T {
    fn increment_at(&self, index: usize) -> bool {
        (**self).increment_at(index)
    }

    fn len(&self) -> Option<usize> {
        (**self).len()
    }
}

impl PmSequence for Chromosome {
    fn increment_at(&self, index: usize) -> bool {
        self.bit(index).unwrap_or(false)
    }

    fn len(&self) -> Option<usize> {
        Some(Chromosome::len(self))
    }
}

/// Always decrements. Used when only the number of changes matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysDecrement;

impl PmSequence for AlwaysDecrement {
    fn increment_at(&self, _index: usize) -> bool {
        false
    }
}

/// How the running bit index that addresses the PM sequence advances across phases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SequenceIndexing {
    /// One counter over the seed and the payload phase.
    #[default]
    Continuous,
    /// The counter restarts at zero for the payload phase.
    PerPhase,
}

/// Number of PM sequence entries a message of `message_len` bytes needs.
pub fn required_sequence_len(message_len: usize, indexing: SequenceIndexing) -> usize {
    let payload = LENGTH_BITS + message_len * 8;
    match indexing {
        SequenceIndexing::Continuous => SEED_BITS + payload,
        SequenceIndexing::PerPhase => payload.max(SEED_BITS),
    }
}
