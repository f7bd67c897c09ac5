//! Keyed ±1 Steganography for JPEG DCT Coefficients
//!
//! This crate hides a message in the quantized DCT coefficients of a JPEG image by
//! nudging non-zero AC coefficients by ±1 until each one carries the wanted bit. A
//! key-seeded permutation decides which coefficients carry the embedding seed; the
//! embedding seed then decides where the payload goes.
//!
//! # Layer Responsibilities
//!
//! This crate handles **coefficient-level** concerns only:
//! - The in-memory coefficient image ([`CoverImage`]) and its usable positions
//! - Keyed traversal of usable coefficients ([`Walker`], [`Permutation`])
//! - The bit protocol: seed, length and payload ([`Pm1Embedder`], [`Pm1Extractor`])
//! - Genetic search for the embedding seed and the ±1 directions ([`GeneticPm1`]),
//!   scored by change count and by blockiness ([`BlockinessMetric`])
//!
//! Parsing and writing JPEG files, as well as message encryption, are handled by outer
//! layers.
//!
//! # Example
//!
//! ```
//! use stegano_pm1::{extract, CoverImage, EmbedRequest, GaSettings, GeneticPm1, GeneticPm1Options};
//!
//! let samples: Vec<u8> = (0..64 * 64).map(|i| ((i * 7919) % 251) as u8).collect();
//! let cover = CoverImage::from_luma(64, 64, &samples, 75)?;
//!
//! let small = GaSettings::default_seed_search()
//!     .with_population_size(6)
//!     .with_generations(2);
//! let options = GeneticPm1Options::default()
//!     .with_seed_search(small)
//!     .with_sequence_search(small)
//!     .with_rng_seed(1);
//!
//! let request = EmbedRequest::new(cover, b"Hello World".to_vec(), "passphrase")?;
//! let stego = GeneticPm1::new(options).embed(&request)?;
//!
//! assert_eq!(extract(&stego, "passphrase")?, b"Hello World");
//! # Ok::<(), stegano_pm1::Pm1Error>(())
//! ```

mod blockiness;
mod embedder;
mod error;
mod extractor;
mod fitness;
mod image;
mod optimizer;
mod permutation;
mod pixels;
mod protocol;
mod request;
mod walker;

pub use blockiness::{spatial_blockiness, BlockinessMetric, CroppedEstimate};
pub use embedder::Pm1Embedder;
pub use error::{Pm1Error, Result};
pub use extractor::Pm1Extractor;
pub use fitness::{Blockiness, SeedChangeCount};
pub use image::{CoefficientAccessor, Component, CoverImage, QuantTable};
pub use optimizer::{GaSettings, GeneticPm1, GeneticPm1Options, OptimizedEmbedding};
pub use permutation::{seed_from_key, Permutation};
pub use pixels::{decode_component, encode_plane, Plane};
pub use protocol::{
    carried_bit, required_sequence_len, AlwaysDecrement, PmSequence, SequenceIndexing,
    LENGTH_BITS, MAX_MESSAGE_LEN, SEED_BITS,
};
pub use request::EmbedRequest;
pub use walker::Walker;

/// Embeds `message` with embedding seed 0 and decrement-only changes.
pub fn embed(cover: &CoverImage, message: &[u8], key: &str) -> Result<CoverImage> {
    let request = EmbedRequest::new(cover.clone(), message, key)?;
    Pm1Embedder::new(AlwaysDecrement).embed(&request, 0)
}

/// Embeds `message` with a genetically optimized seed and ±1 sequence.
pub fn embed_optimized(cover: &CoverImage, message: &[u8], key: &str) -> Result<CoverImage> {
    let request = EmbedRequest::new(cover.clone(), message, key)?;
    GeneticPm1::default().embed(&request)
}

/// Extracts the message hidden under `key`.
pub fn extract(stego: &CoverImage, key: &str) -> Result<Vec<u8>> {
    Pm1Extractor::new().extract(stego, key)
}
