// SPDX-License-Identifier: MIT OR Apache-2.0
//! Two-image compositing.

use super::{Inputs, NodeError, Processor};
use crate::parameter::{ParameterValue, UnknownSelection};
use crate::raster::{to_channel, Raster};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Per-channel compositing operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendMode {
    /// `a + b`
    Add,
    /// `a - b`
    Subtract,
    /// `a * b / 255`
    Multiply,
    /// `255 - (255 - a)(255 - b) / 255`
    Screen,
    /// `(a / b) * 255`, 255 where `b` is zero
    Divide,
    /// Multiply below mid-grey, screen above
    Overlay,
    /// `a`
    PassA,
    /// `b`
    PassB,
}

impl BlendMode {
    /// Every mode, in selection order
    pub const ALL: [BlendMode; 8] = [
        Self::Add,
        Self::Subtract,
        Self::Multiply,
        Self::Screen,
        Self::Divide,
        Self::Overlay,
        Self::PassA,
        Self::PassB,
    ];

    /// Selection label
    pub fn label(self) -> &'static str {
        match self {
            Self::Add => "Add",
            Self::Subtract => "Subtract",
            Self::Multiply => "Multiply",
            Self::Screen => "Screen",
            Self::Divide => "Divide",
            Self::Overlay => "Overlay",
            Self::PassA => "Pass Through Image A",
            Self::PassB => "Pass Through Image B",
        }
    }

    /// Raw, unclamped result for one channel
    pub fn apply(self, a: f32, b: f32) -> f32 {
        match self {
            Self::Add => a + b,
            Self::Subtract => a - b,
            Self::Multiply => a * b / 255.0,
            Self::Screen => 255.0 - (255.0 - a) * (255.0 - b) / 255.0,
            Self::Divide => {
                if b == 0.0 {
                    255.0
                } else {
                    a / b * 255.0
                }
            }
            Self::Overlay => {
                if a < 128.0 {
                    2.0 * a * b / 255.0
                } else {
                    255.0 - 2.0 * (255.0 - a) * (255.0 - b) / 255.0
                }
            }
            Self::PassA => a,
            Self::PassB => b,
        }
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BlendMode {
    type Err = UnknownSelection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.label() == s)
            .ok_or_else(|| UnknownSelection(s.to_string()))
    }
}

/// Composite `b` onto `a`.
///
/// The output has `a`'s dimensions and alpha. Pixels of `b` outside `a`'s
/// bounds read as zero. With `normalise` the raw results are rescaled so the
/// smallest RGB sample maps to 0 and the largest to 255.
pub fn blend(a: &Raster, b: &Raster, mode: BlendMode, normalise: bool) -> Raster {
    let mut out = a.clone();

    if !normalise {
        for (x, y, pixel) in out.enumerate_pixels_mut() {
            let other = sample(b, x, y);
            for c in 0..3 {
                pixel[c] = to_channel(mode.apply(pixel[c] as f32, other[c] as f32));
            }
        }
        return out;
    }

    let mut raw = Vec::with_capacity(a.width() as usize * a.height() as usize * 3);
    for (x, y, pixel) in a.enumerate_pixels() {
        let other = sample(b, x, y);
        for c in 0..3 {
            raw.push(mode.apply(pixel[c] as f32, other[c] as f32));
        }
    }
    let Some((min, max)) = min_max(&raw) else {
        return out;
    };
    let scale = if max > min { 255.0 / (max - min) } else { 0.0 };

    for (pixel, values) in out.pixels_mut().zip(raw.chunks_exact(3)) {
        for c in 0..3 {
            pixel[c] = to_channel((values[c] - min) * scale);
        }
    }
    out
}

fn sample(raster: &Raster, x: u32, y: u32) -> [u8; 4] {
    if x < raster.width() && y < raster.height() {
        raster.get_pixel(x, y).0
    } else {
        [0; 4]
    }
}

fn min_max(values: &[f32]) -> Option<(f32, f32)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(min, max), &v| (min.min(v), max.max(v))),
    )
}

/// Blend node: `Image A`, `Image B`, `Blend Mode`, `Normalise`
#[derive(Debug, Default)]
pub struct Blend;

impl Processor for Blend {
    async fn frame(&mut self, inputs: Inputs<'_>) -> Result<ParameterValue, NodeError> {
        let mode: BlendMode = inputs.selection("Blend Mode")?;
        let normalise = inputs.boolean("Normalise")?;
        let (Some(a), Some(b)) = (inputs.raster("Image A")?, inputs.raster("Image B")?) else {
            tracing::debug!("Blend skipped: missing input image");
            return Ok(ParameterValue::Null);
        };

        Ok(ParameterValue::Raster(Arc::new(blend(&a, &b, mode, normalise))))
    }
}
