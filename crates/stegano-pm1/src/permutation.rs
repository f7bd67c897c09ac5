//! Seeded permutation of the usable coefficients.
//!
//! The permutation decides WHERE the bits go: the same seed over the same number of
//! usable coefficients always yields the same visiting order.

use fastrand::Rng;

use crate::error::{Pm1Error, Result};

/// Pseudo-random bijection over `[0, size)`.
///
/// Construction is cheap; the shuffle only happens on [`Permutation::init`], which
/// may be called once.
#[derive(Debug, Clone)]
pub struct Permutation {
    size: usize,
    seed: u64,
    indices: Option<Vec<usize>>,
}

impl Permutation {
    pub fn new(size: usize, seed: u64) -> Self {
        Permutation {
            size,
            seed,
            indices: None,
        }
    }

    /// Creates and initializes a permutation in one go.
    pub fn seeded(size: usize, seed: u64) -> Self {
        let mut permutation = Self::new(size, seed);
        permutation.indices = Some(shuffle(size, seed));
        permutation
    }

    /// Shuffles the identity sequence. Fails on a second call.
    pub fn init(&mut self) -> Result<()> {
        if self.indices.is_some() {
            return Err(Pm1Error::PermutationAlreadyInitialized);
        }
        self.indices = Some(shuffle(self.size, self.seed));
        Ok(())
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.indices.is_some()
    }

    /// Index at rank `rank` of the shuffled sequence.
    pub fn get(&self, rank: usize) -> Result<usize> {
        self.as_slice()?
            .get(rank)
            .copied()
            .ok_or(Pm1Error::PermutationIndexOutOfRange {
                index: rank,
                size: self.size,
            })
    }

    /// The whole shuffled sequence, rank order.
    pub fn as_slice(&self) -> Result<&[usize]> {
        self.indices
            .as_deref()
            .ok_or(Pm1Error::PermutationNotInitialized)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

fn shuffle(size: usize, seed: u64) -> Vec<usize> {
    let mut rng = Rng::with_seed(seed);
    let mut indices: Vec<usize> = (0..size).collect();

    // Fisher-Yates shuffle
    for i in (1..size).rev() {
        let j = rng.usize(0..=i);
        indices.swap(i, j);
    }
    indices
}

/// Derives the walker seed from a passphrase.
///
/// 64-bit FNV-1a over the UTF-8 bytes of `key`.
pub fn seed_from_key(key: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    key.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}
