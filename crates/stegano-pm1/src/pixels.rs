//! Pixel-domain view of a coefficient component.
//!
//! Dequantize + 8×8 IDCT turns a component into 8-bit samples, forward DCT +
//! quantization turns samples back into coefficients. Used by the blockiness metric.

use std::sync::OnceLock;

use crate::error::{Pm1Error, Result};
use crate::image::{Component, QuantTable};

/// `COSINE[u][x] = cos((2x + 1) u π / 16)`
static COSINE: OnceLock<[[f64; 8]; 8]> = OnceLock::new();

/// C(0) = 1/sqrt(8), C(u>0) = 1/2.
static NORM: OnceLock<[f64; 8]> = OnceLock::new();

fn cosine_table() -> &'static [[f64; 8]; 8] {
    COSINE.get_or_init(|| {
        let mut table = [[0.0f64; 8]; 8];
        for (u, row) in table.iter_mut().enumerate() {
            for (x, value) in row.iter_mut().enumerate() {
                *value = ((2 * x + 1) as f64 * u as f64 * std::f64::consts::PI / 16.0).cos();
            }
        }
        table
    })
}

fn norm_table() -> &'static [f64; 8] {
    NORM.get_or_init(|| {
        let mut n = [0.5f64; 8];
        n[0] = 1.0 / (8.0f64).sqrt();
        n
    })
}

/// Dequantize + 8×8 IDCT, natural order in and out, level shifted by +128.
pub fn idct_block(quantized: &[i16], quant: &[u16; 64]) -> [f64; 64] {
    let cos = cosine_table();
    let c = norm_table();

    let mut f = [0.0f64; 64];
    for (i, value) in f.iter_mut().enumerate() {
        *value = f64::from(quantized[i]) * f64::from(quant[i]);
    }

    // columns first, then rows
    let mut temp = [0.0f64; 64];
    for col in 0..8 {
        for y in 0..8 {
            let mut sum = 0.0;
            for v in 0..8 {
                sum += c[v] * f[v * 8 + col] * cos[v][y];
            }
            temp[y * 8 + col] = sum;
        }
    }

    let mut pixels = [0.0f64; 64];
    for row in 0..8 {
        for x in 0..8 {
            let mut sum = 0.0;
            for u in 0..8 {
                sum += c[u] * temp[row * 8 + u] * cos[u][x];
            }
            pixels[row * 8 + x] = sum + 128.0;
        }
    }
    pixels
}

/// 8×8 forward DCT + quantization of samples in `0..=255`.
pub fn dct_block(pixels: &[f64; 64], quant: &[u16; 64]) -> [i16; 64] {
    let cos = cosine_table();
    let c = norm_table();

    // rows first, then columns
    let mut temp = [0.0f64; 64];
    for row in 0..8 {
        for u in 0..8 {
            let mut sum = 0.0;
            for x in 0..8 {
                sum += (pixels[row * 8 + x] - 128.0) * cos[u][x];
            }
            temp[row * 8 + u] = c[u] * sum;
        }
    }

    let mut quantized = [0i16; 64];
    for col in 0..8 {
        for v in 0..8 {
            let mut sum = 0.0;
            for y in 0..8 {
                sum += temp[y * 8 + col] * cos[v][y];
            }
            let coefficient = c[v] * sum;
            quantized[v * 8 + col] = (coefficient / f64::from(quant[v * 8 + col])).round() as i16;
        }
    }
    quantized
}

/// A single channel of 8-bit samples, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    width: usize,
    height: usize,
    samples: Vec<u8>,
}

impl Plane {
    pub fn new(width: usize, height: usize, samples: Vec<u8>) -> Result<Self> {
        if samples.len() != width * height {
            return Err(Pm1Error::InvalidImage {
                reason: format!(
                    "{} samples do not match {}x{} pixels",
                    samples.len(),
                    width,
                    height
                ),
            });
        }
        Ok(Plane {
            width,
            height,
            samples,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    #[inline]
    pub fn sample(&self, x: usize, y: usize) -> u8 {
        self.samples[y * self.width + x]
    }

    /// Drops `left` columns and `top` rows.
    pub fn crop(&self, left: usize, top: usize) -> Plane {
        let width = self.width.saturating_sub(left);
        let height = self.height.saturating_sub(top);
        if width == 0 || height == 0 {
            return Plane {
                width: 0,
                height: 0,
                samples: Vec::new(),
            };
        }
        let mut samples = Vec::with_capacity(width * height);
        for y in top..top + height {
            let start = y * self.width + left;
            samples.extend_from_slice(&self.samples[start..start + width]);
        }
        Plane {
            width,
            height,
            samples,
        }
    }

    /// Keeps the top-left `width` × `height` area.
    pub fn truncate(&self, width: usize, height: usize) -> Plane {
        let width = width.min(self.width);
        let height = height.min(self.height);
        let mut samples = Vec::with_capacity(width * height);
        for y in 0..height {
            let start = y * self.width;
            samples.extend_from_slice(&self.samples[start..start + width]);
        }
        Plane {
            width,
            height,
            samples,
        }
    }

    /// Sum of absolute sample differences across all 8×8 block boundaries.
    pub fn blockiness(&self) -> u64 {
        let mut total = 0u64;
        for y in 0..self.height {
            for x in (8..self.width).step_by(8) {
                total += u64::from(self.sample(x, y).abs_diff(self.sample(x - 1, y)));
            }
            if y > 0 && y % 8 == 0 {
                for x in 0..self.width {
                    total += u64::from(self.sample(x, y).abs_diff(self.sample(x, y - 1)));
                }
            }
        }
        total
    }
}

/// Decodes every block of `component` into a block-aligned plane.
pub fn decode_component(component: &Component) -> Plane {
    let blocks_wide = component.blocks_wide();
    let width = blocks_wide * 8;
    let height = component.blocks_tall() * 8;
    let mut samples = vec![0u8; width * height];
    let quant = component.quant().values();

    for block_index in 0..component.block_count() {
        let block_pixels = idct_block(component.block(block_index), quant);
        let (bx, by) = (block_index % blocks_wide, block_index / blocks_wide);
        for row in 0..8 {
            for col in 0..8 {
                let value = block_pixels[row * 8 + col].round().clamp(0.0, 255.0);
                samples[(by * 8 + row) * width + bx * 8 + col] = value as u8;
            }
        }
    }

    Plane {
        width,
        height,
        samples,
    }
}

/// Encodes `plane` into a component, replicating edge samples to fill whole blocks.
pub fn encode_plane(plane: &Plane, quant: &QuantTable) -> Component {
    let blocks_wide = plane.width.div_ceil(8);
    let blocks_tall = plane.height.div_ceil(8);
    let mut coefficients = Vec::with_capacity(blocks_wide * blocks_tall * 64);

    for by in 0..blocks_tall {
        for bx in 0..blocks_wide {
            let mut block_pixels = [0.0f64; 64];
            for row in 0..8 {
                let y = (by * 8 + row).min(plane.height - 1);
                for col in 0..8 {
                    let x = (bx * 8 + col).min(plane.width - 1);
                    block_pixels[row * 8 + col] = f64::from(plane.sample(x, y));
                }
            }
            coefficients.extend_from_slice(&dct_block(&block_pixels, quant.values()));
        }
    }

    Component::from_parts(blocks_wide, blocks_tall, quant.clone(), coefficients)
}
