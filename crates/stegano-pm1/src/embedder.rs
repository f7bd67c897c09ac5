//! PM1 Embedder - hides a message in the usable coefficients of a cover.
//!
//! Every usable coefficient visited carries one bit. When the carried bit already
//! matches nothing happens, otherwise the coefficient moves by ±1 in the direction
//! the plus-minus sequence prescribes.

use std::ops::ControlFlow;

use bitstream_io::{BigEndian, BitRead, BitReader};

use crate::error::{Pm1Error, Result};
use crate::image::{CoefficientAccessor, CoverImage};
use crate::permutation::seed_from_key;
use crate::protocol::{
    carried_bit, perturb, required_sequence_len, PmSequence, SequenceIndexing, LENGTH_BITS,
};
use crate::request::EmbedRequest;
use crate::walker::Walker;

/// Embeds messages using a given plus-minus sequence.
#[derive(Debug, Clone, Default)]
pub struct Pm1Embedder<S> {
    sequence: S,
    indexing: SequenceIndexing,
}

/// Coefficient changes of one embedding, applied only once all bits fit.
#[derive(Debug, Default)]
struct Changes {
    record: bool,
    count: usize,
    edits: Vec<(usize, i16)>,
}

impl<S: PmSequence> Pm1Embedder<S> {
    pub fn new(sequence: S) -> Self {
        Pm1Embedder {
            sequence,
            indexing: SequenceIndexing::default(),
        }
    }

    pub fn with_indexing(mut self, indexing: SequenceIndexing) -> Self {
        self.indexing = indexing;
        self
    }

    #[inline]
    pub fn indexing(&self) -> SequenceIndexing {
        self.indexing
    }

    /// Embeds the request's message with embedding seed `seed`.
    ///
    /// # Returns
    /// * `Ok(image)` a modified copy of the cover
    /// * `Err(Pm1Error::CapacityExceeded)` if the cover runs out of usable coefficients
    /// * `Err(Pm1Error::SequenceLength)` if a fixed-length sequence does not match the message
    pub fn embed(&self, request: &EmbedRequest, seed: u16) -> Result<CoverImage> {
        let expected = required_sequence_len(request.message().len(), self.indexing);
        if let Some(actual) = self.sequence.len() {
            if actual != expected {
                return Err(Pm1Error::SequenceLength { expected, actual });
            }
        }

        let changes = self.run(request, seed, true)?;
        let mut stego = request.cover().clone();
        for &(position, value) in &changes.edits {
            stego.set_coefficient(position, value);
        }

        log::trace!(
            "embedded {} bytes with seed {seed:#06x}, {} coefficients changed",
            request.message().len(),
            changes.count
        );
        Ok(stego)
    }

    /// Number of coefficients that embedding with `seed` would change. Never writes.
    pub fn count_changes(&self, request: &EmbedRequest, seed: u16) -> Result<usize> {
        Ok(self.run(request, seed, false)?.count)
    }

    fn run(&self, request: &EmbedRequest, seed: u16, record: bool) -> Result<Changes> {
        let message = request.message();
        let length = u16::try_from(message.len()).map_err(|_| Pm1Error::MessageTooLong {
            message_len: message.len(),
        })?;

        let mut walker = Walker::new(request.cover(), seed_from_key(request.key()));
        let mut changes = Changes {
            record,
            ..Changes::default()
        };
        let mut bit_index = 0;

        self.embed_bits(&mut walker, &seed.to_be_bytes(), &mut bit_index, &mut changes)?;

        walker.set_seed(u64::from(seed));
        if self.indexing == SequenceIndexing::PerPhase {
            bit_index = 0;
        }

        let mut payload = Vec::with_capacity(LENGTH_BITS / 8 + message.len());
        payload.extend_from_slice(&length.to_be_bytes());
        payload.extend_from_slice(message);
        self.embed_bits(&mut walker, &payload, &mut bit_index, &mut changes)?;

        Ok(changes)
    }

    /// Walks until every bit of `bytes` is carried, MSB first.
    fn embed_bits(
        &self,
        walker: &mut Walker<'_, CoverImage>,
        bytes: &[u8],
        bit_index: &mut usize,
        changes: &mut Changes,
    ) -> Result<()> {
        let total = bytes.len() * 8;
        let mut reader = BitReader::endian(bytes, BigEndian);
        let mut embedded = 0;
        let mut failure = None;

        let finished = total == 0
            || walker
                .walk(|position, value| {
                    let bit = match reader.read_bit() {
                        Ok(bit) => bit,
                        Err(e) => {
                            failure = Some(e);
                            return ControlFlow::Break(());
                        }
                    };
                    if carried_bit(value) != bit {
                        changes.count += 1;
                        if changes.record {
                            let increment = self.sequence.increment_at(*bit_index);
                            changes.edits.push((position, perturb(value, bit, increment)));
                        }
                    }
                    *bit_index += 1;
                    embedded += 1;
                    if embedded == total {
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                })?
                .is_break();

        if let Some(e) = failure {
            return Err(e.into());
        }
        if !finished {
            return Err(Pm1Error::CapacityExceeded {
                required: total,
                available: embedded,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{Component, QuantTable};
    use crate::protocol::{AlwaysDecrement, SEED_BITS};
    use fastrand::Rng;
    use stegano_genetic::Chromosome;

    fn generate_test_cover(block_count: usize) -> CoverImage {
        let mut rng = Rng::with_seed(12345);
        let mut coefficients = Vec::with_capacity(block_count * 64);

        for _ in 0..block_count {
            coefficients.push(rng.i16(-500..500));
            for _ in 1..64 {
                let value = match rng.usize(0..10) {
                    0..=5 => 0,
                    6..=7 => rng.i16(-2..=2),
                    8 => rng.i16(-10..=10),
                    _ => rng.i16(-50..=50),
                };
                coefficients.push(value);
            }
        }
        let component =
            Component::new(block_count, 1, QuantTable::standard_luma(75), coefficients).unwrap();
        CoverImage::new(vec![component]).unwrap()
    }

    #[test]
    fn test_changes_stay_on_usable_positions() {
        let cover = generate_test_cover(50);
        let request = EmbedRequest::new(cover.clone(), b"Hello World".to_vec(), "key").unwrap();

        let stego = Pm1Embedder::new(AlwaysDecrement).embed(&request, 77).unwrap();

        let usable = cover.usable_coefficients();
        let mut changed = 0;
        for position in 0..cover.coefficient_count() {
            let (before, after) = (cover.coefficient(position), stego.coefficient(position));
            if before != after {
                changed += 1;
                assert!(
                    usable.binary_search(&position).is_ok(),
                    "position {position} is not usable"
                );
                assert_ne!(after, 0);
            }
        }
        assert!(changed > 0);
        assert_eq!(stego.usable_coefficients(), usable);
    }

    #[test]
    fn test_count_matches_real_changes() {
        let cover = generate_test_cover(50);
        let request = EmbedRequest::new(cover.clone(), b"count me".to_vec(), "key").unwrap();
        let embedder = Pm1Embedder::new(AlwaysDecrement);

        let counted = embedder.count_changes(&request, 1234).unwrap();
        let stego = embedder.embed(&request, 1234).unwrap();

        let changed = (0..cover.coefficient_count())
            .filter(|&p| cover.coefficient(p) != stego.coefficient(p))
            .count();
        assert_eq!(counted, changed);
    }

    #[test]
    fn test_counting_is_deterministic() {
        let request = EmbedRequest::new(generate_test_cover(50), b"abc".to_vec(), "key").unwrap();
        let embedder = Pm1Embedder::new(AlwaysDecrement);

        assert_eq!(
            embedder.count_changes(&request, 5).unwrap(),
            embedder.count_changes(&request, 5).unwrap()
        );
    }

    #[test]
    fn test_always_decrement_moves_down() {
        let cover = generate_test_cover(50);
        let request = EmbedRequest::new(cover.clone(), b"down".to_vec(), "key").unwrap();
        let stego = Pm1Embedder::new(AlwaysDecrement).embed(&request, 9).unwrap();

        for position in 0..cover.coefficient_count() {
            let (before, after) = (cover.coefficient(position), stego.coefficient(position));
            if before != after && before != 1 {
                assert_eq!(after, before - 1, "position {position}");
            }
        }
    }

    #[test]
    fn test_capacity_exceeded() {
        let cover = generate_test_cover(2);
        let usable = cover.usable_coefficient_count();
        let message = vec![0xA5u8; usable / 8 + 1];
        let request = EmbedRequest::new(cover, message, "key").unwrap();

        let err = Pm1Embedder::new(AlwaysDecrement).embed(&request, 1).unwrap_err();
        assert!(matches!(err, Pm1Error::CapacityExceeded { .. }), "{err}");
        assert!(Pm1Embedder::new(AlwaysDecrement).count_changes(&request, 1).is_err());
    }

    #[test]
    fn test_capacity_error_leaves_cover_untouched() {
        let cover = generate_test_cover(2);
        let message = vec![0xFFu8; 64];
        let request = EmbedRequest::new(cover.clone(), message, "key").unwrap();

        assert!(Pm1Embedder::new(AlwaysDecrement).embed(&request, 1).is_err());
        assert_eq!(request.cover(), &cover);
    }

    #[test]
    fn test_sequence_length_is_checked() {
        let request = EmbedRequest::new(generate_test_cover(50), b"xy".to_vec(), "key").unwrap();
        let short = Chromosome::new(10, Rng::with_seed(0));

        let err = Pm1Embedder::new(&short).embed(&request, 0).unwrap_err();
        assert!(matches!(
            err,
            Pm1Error::SequenceLength {
                expected: 48,
                actual: 10
            }
        ));

        let exact = Chromosome::random(SEED_BITS + 16 + 16, Rng::with_seed(0));
        assert!(Pm1Embedder::new(&exact).embed(&request, 0).is_ok());

        let per_phase = Chromosome::random(16 + 16, Rng::with_seed(0));
        assert!(Pm1Embedder::new(&per_phase)
            .with_indexing(SequenceIndexing::PerPhase)
            .embed(&request, 0)
            .is_ok());
    }

    #[test]
    fn test_sequence_direction_is_followed() {
        let cover = generate_test_cover(50);
        let request = EmbedRequest::new(cover.clone(), b"up".to_vec(), "key").unwrap();
        let all_up = Chromosome::from_bits(vec![true; 48], Rng::with_seed(0));

        let stego = Pm1Embedder::new(&all_up).embed(&request, 3).unwrap();

        for position in 0..cover.coefficient_count() {
            let (before, after) = (cover.coefficient(position), stego.coefficient(position));
            if before != after && before != -1 {
                assert_eq!(after, before + 1, "position {position}");
            }
        }
    }

    #[test]
    fn test_message_too_long() {
        let err = EmbedRequest::new(generate_test_cover(1), vec![0u8; 70_000], "key").unwrap_err();
        assert!(matches!(err, Pm1Error::MessageTooLong { message_len: 70_000 }));
    }
}
