//! Blockiness of a stego image relative to a re-compressed, shifted estimate of its cover.
//!
//! Cropping a few pixels moves the 8×8 grid off the original block boundaries, so
//! re-compressing the cropped image gives an estimate of how blocky the cover was
//! before any coefficient was touched. The closer the stego image's blockiness is to
//! that estimate, the less the embedding shows.

use crate::error::Result;
use crate::image::{CoverImage, QuantTable};
use crate::pixels::{decode_component, encode_plane, Plane};

/// Scores how close a stego image's blockiness is to that of its estimated cover.
pub trait BlockinessMetric: Send + Sync {
    /// Ratio in `[0, 1]`, 1 meaning indistinguishable.
    fn blockiness_ratio(&self, stego: &CoverImage) -> Result<f64>;
}

/// Sum of the boundary blockiness of every decoded component.
pub fn spatial_blockiness(image: &CoverImage) -> u64 {
    image
        .components()
        .iter()
        .map(|component| decode_component(component).blockiness())
        .sum()
}

/// Estimates the cover by cropping `offset` pixels from the top and left and
/// re-compressing with the stego image's quantization tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CroppedEstimate {
    offset: usize,
}

impl Default for CroppedEstimate {
    fn default() -> Self {
        CroppedEstimate { offset: 4 }
    }
}

impl CroppedEstimate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Blockiness of the estimated cover.
    pub fn estimate_blockiness(&self, stego: &CoverImage) -> u64 {
        stego
            .components()
            .iter()
            .map(|component| {
                let cropped = decode_component(component).crop(self.offset, self.offset);
                self.recompress(&cropped, component.quant()).blockiness()
            })
            .sum()
    }

    fn recompress(&self, plane: &Plane, quant: &QuantTable) -> Plane {
        if plane.width() == 0 || plane.height() == 0 {
            return plane.clone();
        }
        let component = encode_plane(plane, quant);
        decode_component(&component).truncate(plane.width(), plane.height())
    }
}

impl BlockinessMetric for CroppedEstimate {
    fn blockiness_ratio(&self, stego: &CoverImage) -> Result<f64> {
        let stego_blockiness = spatial_blockiness(stego);
        let estimate = self.estimate_blockiness(stego);
        log::trace!("blockiness stego {stego_blockiness}, estimate {estimate}");
        Ok(ratio(stego_blockiness, estimate))
    }
}

fn ratio(a: u64, b: u64) -> f64 {
    let (low, high) = if a < b { (a, b) } else { (b, a) };
    if high == 0 {
        return 1.0;
    }
    (low as f64 / high as f64).clamp(0.0, 1.0)
}
