// SPDX-License-Identifier: MIT OR Apache-2.0
//! Monochromatic additive Gaussian noise.

use super::{Inputs, NodeError, Processor};
use crate::parameter::ParameterValue;
use crate::raster::{to_channel, Raster};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;
use std::sync::Arc;

/// Draw one normally distributed sample with the Box-Muller transform
pub fn gaussian(rng: &mut impl Rng, mean: f64, standard_deviation: f64) -> f64 {
    // u in (0, 1] keeps the logarithm finite
    let u: f64 = 1.0 - rng.gen::<f64>();
    let v: f64 = rng.gen();
    mean + standard_deviation * (-2.0 * u.ln()).sqrt() * (TAU * v).cos()
}

/// Pre-generate `length` Gaussian samples
pub fn noise_table(rng: &mut impl Rng, mean: f64, standard_deviation: f64, length: usize) -> Vec<f32> {
    (0..length)
        .map(|_| gaussian(rng, mean, standard_deviation) as f32)
        .collect()
}

/// Adds the same noise sample to the R, G and B channels of each pixel.
///
/// The sample table is built once per setup from `Mean`, `Standard Deviation`
/// and `Array Length`; frames only draw random indices into it.
#[derive(Debug)]
pub struct Mottle {
    table: Vec<f32>,
    rng: StdRng,
}

impl Mottle {
    /// Create a node seeded from system entropy
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create a node with a reproducible sequence
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            table: Vec::new(),
            rng,
        }
    }

    /// The current sample table
    pub fn table(&self) -> &[f32] {
        &self.table
    }

    /// Apply noise to a copy of `image`
    pub fn apply(&mut self, image: &Raster) -> Raster {
        let mut out = image.clone();
        if self.table.is_empty() {
            return out;
        }
        for pixel in out.pixels_mut() {
            let noise = self.table[self.rng.gen_range(0..self.table.len())];
            for c in 0..3 {
                pixel[c] = to_channel(pixel[c] as f32 + noise);
            }
        }
        out
    }
}

impl Default for Mottle {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for Mottle {
    async fn setup(&mut self, inputs: Inputs<'_>) -> Result<(), NodeError> {
        let mean = inputs.number("Mean")?;
        let standard_deviation = inputs.number("Standard Deviation")?;
        let length = inputs.count("Array Length")?;

        self.table = noise_table(&mut self.rng, mean, standard_deviation, length);
        tracing::debug!("Generated {length} noise samples (mean {mean}, sd {standard_deviation})");
        Ok(())
    }

    async fn frame(&mut self, inputs: Inputs<'_>) -> Result<ParameterValue, NodeError> {
        let Some(image) = inputs.raster("Image")? else {
            tracing::debug!("Mottle skipped: missing input image");
            return Ok(ParameterValue::Null);
        };
        Ok(ParameterValue::Raster(Arc::new(self.apply(&image))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_table_statistics() {
        let mut rng = StdRng::seed_from_u64(7);
        let table = noise_table(&mut rng, 5.0, 2.0, 20_000);

        let n = table.len() as f64;
        let mean = table.iter().map(|&v| v as f64).sum::<f64>() / n;
        let variance = table.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n;

        assert_eq!(table.len(), 20_000);
        assert!((mean - 5.0).abs() < 0.1, "mean {mean}");
        assert!((variance.sqrt() - 2.0).abs() < 0.1, "sd {}", variance.sqrt());
    }

    #[test]
    fn test_zero_deviation_is_constant_offset() {
        let mut node = Mottle::seeded(1);
        node.table = noise_table(&mut node.rng, 10.0, 0.0, 16);

        let image = Raster::from_pixel(2, 2, Rgba([100, 50, 250, 128]));
        let out = node.apply(&image);

        for pixel in out.pixels() {
            assert_eq!(pixel.0, [110, 60, 255, 128]);
        }
    }

    #[test]
    fn test_noise_is_monochromatic() {
        let mut node = Mottle::seeded(3);
        node.table = noise_table(&mut node.rng, 0.0, 30.0, 100);

        let image = Raster::from_pixel(8, 8, Rgba([128, 128, 128, 255]));
        let out = node.apply(&image);

        for pixel in out.pixels() {
            assert_eq!(pixel[0], pixel[1]);
            assert_eq!(pixel[1], pixel[2]);
            assert_eq!(pixel[3], 255);
        }
    }

    #[test]
    fn test_empty_table_copies_input() {
        let mut node = Mottle::seeded(0);
        let image = Raster::from_pixel(2, 1, Rgba([1, 2, 3, 4]));
        assert_eq!(node.apply(&image), image);
    }
}
