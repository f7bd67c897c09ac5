//! PM1 Extractor - recovers a message from a stego image.

use std::ops::ControlFlow;

use bitstream_io::{BigEndian, BitWrite, BitWriter};

use crate::error::{Pm1Error, Result};
use crate::image::CoefficientAccessor;
use crate::permutation::seed_from_key;
use crate::protocol::{carried_bit, LENGTH_BITS, SEED_BITS};
use crate::walker::Walker;

/// Reads messages written by [`crate::Pm1Embedder`].
///
/// Needs no plus-minus sequence: only the carried bits matter.
#[derive(Debug, Default, Clone, Copy)]
pub struct Pm1Extractor;

impl Pm1Extractor {
    pub fn new() -> Self {
        Pm1Extractor
    }

    /// Extracts the message hidden under `key`.
    ///
    /// # Returns
    /// * `Ok(message)` the hidden bytes (possibly garbage for a wrong key)
    /// * `Err(Pm1Error::InsufficientCoefficients)` if the stego image ends before the
    ///   announced message does
    pub fn extract<A>(&self, stego: &A, key: &str) -> Result<Vec<u8>>
    where
        A: CoefficientAccessor + ?Sized,
    {
        let mut walker = Walker::new(stego, seed_from_key(key));

        let seed = read_bytes(&mut walker, SEED_BITS / 8)?;
        let seed = u16::from_be_bytes([seed[0], seed[1]]);
        walker.set_seed(u64::from(seed));

        let length = read_bytes(&mut walker, LENGTH_BITS / 8)?;
        let length = usize::from(u16::from_be_bytes([length[0], length[1]]));
        log::trace!("extracting {length} bytes with embedding seed {seed:#06x}");

        read_bytes(&mut walker, length)
    }
}

/// Reads `count` whole bytes, MSB first, from the next walked coefficients.
fn read_bytes<A>(walker: &mut Walker<'_, A>, count: usize) -> Result<Vec<u8>>
where
    A: CoefficientAccessor + ?Sized,
{
    let total = count * 8;
    let mut bytes = Vec::with_capacity(count);
    if total == 0 {
        return Ok(bytes);
    }

    let mut writer = BitWriter::endian(&mut bytes, BigEndian);
    let mut read = 0;
    let mut failure = None;
    let finished = walker
        .walk(|_, value| {
            if let Err(e) = writer.write_bit(carried_bit(value)) {
                failure = Some(e);
                return ControlFlow::Break(());
            }
            read += 1;
            if read == total {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?
        .is_break();
    drop(writer);

    if let Some(e) = failure {
        return Err(e.into());
    }
    if !finished {
        return Err(Pm1Error::InsufficientCoefficients {
            required: total,
            available: read,
        });
    }
    Ok(bytes)
}
