//! In-memory coefficient image.
//!
//! A [`CoverImage`] holds the quantized DCT coefficients of one or more components,
//! block by block, together with their quantization tables. It is the carrier that
//! the walker and the embedder operate on.

use std::sync::Arc;

use crate::error::{Pm1Error, Result};
use crate::pixels::{encode_plane, Plane};

/// IJG luminance quantization table at quality 50, natural order.
const STANDARD_LUMA: [u16; 64] = [
    16, 11, 10, 16, 24, 40, 51, 61, //
    12, 12, 14, 19, 26, 58, 60, 55, //
    14, 13, 16, 24, 40, 57, 69, 56, //
    14, 17, 22, 29, 51, 87, 80, 62, //
    18, 22, 37, 56, 68, 109, 103, 77, //
    24, 35, 55, 64, 81, 104, 113, 92, //
    49, 64, 78, 87, 103, 121, 120, 101, //
    72, 92, 95, 98, 112, 100, 103, 99,
];

/// Random access to the coefficients that may carry message bits.
pub trait CoefficientAccessor {
    /// Canonical positions of the usable coefficients, ascending.
    ///
    /// Fixed for the lifetime of the accessor, even if a usable coefficient is
    /// later changed.
    fn usable_coefficients(&self) -> &[usize];

    fn usable_coefficient_count(&self) -> usize {
        self.usable_coefficients().len()
    }

    /// Coefficient at canonical position `position`.
    ///
    /// # Panics
    /// If `position` is outside the image.
    fn coefficient(&self, position: usize) -> i16;

    /// # Panics
    /// If `position` is outside the image.
    fn set_coefficient(&mut self, position: usize, value: i16);
}

/// Quantization table, natural (row-major) order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantTable {
    values: [u16; 64],
}

impl QuantTable {
    pub fn new(values: [u16; 64]) -> Result<Self> {
        if values.contains(&0) {
            return Err(Pm1Error::InvalidImage {
                reason: "quantization table contains a zero entry".to_string(),
            });
        }
        Ok(QuantTable { values })
    }

    /// IJG luminance table scaled to `quality` (clamped to 1..=100).
    pub fn standard_luma(quality: u8) -> Self {
        let quality = u32::from(quality.clamp(1, 100));
        let scale = if quality < 50 {
            5000 / quality
        } else {
            200 - quality * 2
        };
        let mut values = [0u16; 64];
        for (value, base) in values.iter_mut().zip(STANDARD_LUMA) {
            *value = ((u32::from(base) * scale + 50) / 100).clamp(1, 255) as u16;
        }
        QuantTable { values }
    }

    #[inline]
    pub fn values(&self) -> &[u16; 64] {
        &self.values
    }
}

/// One color component: a grid of 8×8 coefficient blocks in raster order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    blocks_wide: usize,
    blocks_tall: usize,
    quant: QuantTable,
    coefficients: Vec<i16>,
}

impl Component {
    pub fn new(
        blocks_wide: usize,
        blocks_tall: usize,
        quant: QuantTable,
        coefficients: Vec<i16>,
    ) -> Result<Self> {
        let expected = blocks_wide * blocks_tall * 64;
        if coefficients.len() != expected {
            return Err(Pm1Error::InvalidImage {
                reason: format!(
                    "{} coefficients do not fill {}x{} blocks ({} expected)",
                    coefficients.len(),
                    blocks_wide,
                    blocks_tall,
                    expected
                ),
            });
        }
        Ok(Self::from_parts(blocks_wide, blocks_tall, quant, coefficients))
    }

    pub(crate) fn from_parts(
        blocks_wide: usize,
        blocks_tall: usize,
        quant: QuantTable,
        coefficients: Vec<i16>,
    ) -> Self {
        Component {
            blocks_wide,
            blocks_tall,
            quant,
            coefficients,
        }
    }

    #[inline]
    pub fn blocks_wide(&self) -> usize {
        self.blocks_wide
    }

    #[inline]
    pub fn blocks_tall(&self) -> usize {
        self.blocks_tall
    }

    #[inline]
    pub fn block_count(&self) -> usize {
        self.blocks_wide * self.blocks_tall
    }

    #[inline]
    pub fn quant(&self) -> &QuantTable {
        &self.quant
    }

    /// The 64 coefficients of block `index`, natural order.
    #[inline]
    pub fn block(&self, index: usize) -> &[i16] {
        &self.coefficients[index * 64..(index + 1) * 64]
    }

    #[inline]
    pub fn coefficients(&self) -> &[i16] {
        &self.coefficients
    }
}

/// Coefficient image with a fixed set of usable positions.
///
/// Canonical positions enumerate all coefficients of all components in order;
/// a position is usable when it is not a DC coefficient and was non-zero when the
/// image was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    components: Vec<Component>,
    offsets: Vec<usize>,
    usable: Arc<[usize]>,
}

impl CoverImage {
    pub fn new(components: Vec<Component>) -> Result<Self> {
        if components.is_empty() {
            return Err(Pm1Error::InvalidImage {
                reason: "image has no components".to_string(),
            });
        }

        let mut offsets = Vec::with_capacity(components.len());
        let mut usable = Vec::new();
        let mut offset = 0;
        for component in &components {
            offsets.push(offset);
            usable.extend(
                component
                    .coefficients
                    .iter()
                    .enumerate()
                    .filter(|&(index, &value)| index % 64 != 0 && value != 0)
                    .map(|(index, _)| offset + index),
            );
            offset += component.coefficients.len();
        }

        log::trace!(
            "cover with {} components, {} coefficients, {} usable",
            components.len(),
            offset,
            usable.len()
        );

        Ok(CoverImage {
            components,
            offsets,
            usable: usable.into(),
        })
    }

    /// Builds a single-component image from 8-bit grayscale samples.
    pub fn from_luma(width: usize, height: usize, samples: &[u8], quality: u8) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Pm1Error::InvalidImage {
                reason: format!("empty image {width}x{height}"),
            });
        }
        let plane = Plane::new(width, height, samples.to_vec())?;
        let component = encode_plane(&plane, &QuantTable::standard_luma(quality));
        Self::new(vec![component])
    }

    #[inline]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Total number of coefficients over all components.
    pub fn coefficient_count(&self) -> usize {
        self.components.iter().map(|c| c.coefficients.len()).sum()
    }

    fn locate(&self, position: usize) -> (usize, usize) {
        let component = self.offsets.partition_point(|&offset| offset <= position) - 1;
        (component, position - self.offsets[component])
    }
}

impl CoefficientAccessor for CoverImage {
    fn usable_coefficients(&self) -> &[usize] {
        &self.usable
    }

    fn coefficient(&self, position: usize) -> i16 {
        let (component, index) = self.locate(position);
        self.components[component].coefficients[index]
    }

    fn set_coefficient(&mut self, position: usize, value: i16) {
        let (component, index) = self.locate(position);
        self.components[component].coefficients[index] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(values: &[(usize, i16)], blocks: usize) -> Component {
        let mut coefficients = vec![0i16; blocks * 64];
        for &(index, value) in values {
            coefficients[index] = value;
        }
        Component::new(blocks, 1, QuantTable::standard_luma(50), coefficients).unwrap()
    }

    #[test]
    fn test_usable_skips_dc_and_zeros() {
        let changes = [(0, 5), (1, 3), (2, 0), (64, -7), (70, -1)];
        let image = CoverImage::new(vec![component(&changes, 2)]).unwrap();
        assert_eq!(image.usable_coefficients(), &[1, 70]);
        assert_eq!(image.usable_coefficient_count(), 2);
    }

    #[test]
    fn test_positions_span_components() {
        let image = CoverImage::new(vec![
            component(&[(5, 2)], 1),
            component(&[(3, -4)], 2),
        ])
        .unwrap();

        assert_eq!(image.coefficient_count(), 64 * 3);
        assert_eq!(image.usable_coefficients(), &[5, 64 + 3]);
        assert_eq!(image.coefficient(67), -4);
    }

    #[test]
    fn test_usable_set_is_fixed() {
        let mut image = CoverImage::new(vec![component(&[(1, 1), (2, 1)], 1)]).unwrap();
        image.set_coefficient(1, 0);

        assert_eq!(image.coefficient(1), 0);
        assert_eq!(image.usable_coefficients(), &[1, 2]);
    }

    #[test]
    fn test_component_size_is_checked() {
        let result = Component::new(2, 2, QuantTable::standard_luma(50), vec![0; 64]);
        assert!(matches!(result, Err(Pm1Error::InvalidImage { .. })));
        assert!(CoverImage::new(Vec::new()).is_err());
    }

    #[test]
    fn test_standard_luma_scaling() {
        assert_eq!(QuantTable::standard_luma(50).values(), &STANDARD_LUMA);
        assert!(QuantTable::standard_luma(100).values().iter().all(|&v| v == 1));
        assert_eq!(QuantTable::standard_luma(75).values()[0], 8);
        assert!(QuantTable::new([0; 64]).is_err());
    }

    #[test]
    fn test_from_luma_noise_has_usable_coefficients() {
        let mut rng = fastrand::Rng::with_seed(3);
        let samples: Vec<u8> = (0..32 * 32).map(|_| rng.u8(..)).collect();
        let image = CoverImage::from_luma(32, 32, &samples, 75).unwrap();

        assert_eq!(image.coefficient_count(), 16 * 64);
        assert!(image.usable_coefficient_count() > 500);
    }
}
