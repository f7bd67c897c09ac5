//! Fixed-length bit string that the genetic operators act on.

use std::fmt;
use std::hash::{Hash, Hasher};

use fastrand::Rng;

use crate::error::{GeneticError, Result};

/// A fixed-length sequence of bits together with the random source used to mutate it.
///
/// Equality and hashing only consider the bits, never the random source.
#[derive(Clone)]
pub struct Chromosome {
    bits: Vec<bool>,
    rng: Rng,
}

impl Chromosome {
    /// Creates a chromosome of `len` zero bits.
    pub fn new(len: usize, rng: Rng) -> Self {
        Self {
            bits: vec![false; len],
            rng,
        }
    }

    /// Creates a chromosome carrying the given bits.
    pub fn from_bits(bits: Vec<bool>, rng: Rng) -> Self {
        Self { bits, rng }
    }

    /// Creates a chromosome of `len` uniformly random bits.
    pub fn random(len: usize, rng: Rng) -> Self {
        let mut chromosome = Self::new(len, rng);
        chromosome.randomize();
        chromosome
    }

    /// Replaces every bit with a uniformly random one.
    pub fn randomize(&mut self) {
        for bit in self.bits.iter_mut() {
            *bit = self.rng.bool();
        }
    }

    /// Flips each bit independently with probability `rate`.
    pub fn mutate(&mut self, rate: f64) {
        for bit in self.bits.iter_mut() {
            if self.rng.f64() < rate {
                *bit = !*bit;
            }
        }
    }

    /// Swaps all bits at positions `>= index` between `a` and `b`.
    ///
    /// Without an index a point is drawn uniformly from `[0, len)` using `a`'s random source.
    pub fn crossover(a: &mut Chromosome, b: &mut Chromosome, index: Option<usize>) -> Result<()> {
        let len = a.len();
        if len != b.len() {
            return Err(GeneticError::ChromosomeLengthMismatch {
                left: len,
                right: b.len(),
            });
        }
        let index = match index {
            Some(index) => index,
            None if len > 0 => a.rng.usize(0..len),
            None => 0,
        };
        if index >= len {
            return Err(GeneticError::CrossoverIndexOutOfRange { index, len });
        }

        a.bits[index..].swap_with_slice(&mut b.bits[index..]);
        Ok(())
    }

    /// Number of bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Bit at `index`, `None` past the end.
    #[inline]
    pub fn bit(&self, index: usize) -> Option<bool> {
        self.bits.get(index).copied()
    }

    #[inline]
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Reads the leading 16 bits as an unsigned number, bit 0 being the most significant.
    ///
    /// Shorter chromosomes are padded with zero bits, longer ones are truncated.
    pub fn as_u16(&self) -> u16 {
        self.leading_bits(16) as u16
    }

    /// Reads the leading 64 bits as the raw representation of an `f64`.
    ///
    /// Uses the same bit order, padding and truncation as [`Chromosome::as_u16`].
    pub fn as_f64(&self) -> f64 {
        f64::from_bits(self.leading_bits(64))
    }

    fn leading_bits(&self, width: usize) -> u64 {
        (0..width).fold(0u64, |acc, i| {
            (acc << 1) | u64::from(self.bits.get(i).copied().unwrap_or(false))
        })
    }
}

impl PartialEq for Chromosome {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl Eq for Chromosome {}

impl Hash for Chromosome {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.hash(state);
    }
}

impl fmt::Debug for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Chromosome(")?;
        for bit in &self.bits {
            f.write_str(if *bit { "1" } else { "0" })?;
        }
        f.write_str(")")
    }
}
