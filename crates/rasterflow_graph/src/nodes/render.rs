// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sink node that presents its input on a display surface.

use super::{Inputs, NodeError, Processor};
use crate::parameter::ParameterValue;
use crate::raster::{clear, draw_fitted, FitPolicy, Raster};
use crate::surface::{SurfaceHandle, SurfaceResolver};
use image::imageops::FilterType;
use std::sync::Arc;

/// Draw `image` onto `surface` under `policy`.
///
/// The surface is cleared first unless the policy repaints every pixel.
/// Scaling is nearest-neighbour so pixels stay crisp.
pub fn present(surface: &mut Raster, image: &Raster, policy: FitPolicy) {
    if policy.clears_destination() {
        clear(surface);
    }
    draw_fitted(surface, image, policy, FilterType::Nearest);
}

/// Binds to `Canvas ID` during setup and blits `Image` each frame
#[derive(Debug)]
pub struct RenderSink {
    surfaces: Arc<dyn SurfaceResolver>,
    surface: Option<SurfaceHandle>,
}

impl RenderSink {
    /// Create a sink that looks surfaces up through `surfaces`
    pub fn new(surfaces: Arc<dyn SurfaceResolver>) -> Self {
        Self {
            surfaces,
            surface: None,
        }
    }

    /// The bound surface, once setup has succeeded
    pub fn surface(&self) -> Option<&SurfaceHandle> {
        self.surface.as_ref()
    }
}

impl Processor for RenderSink {
    async fn setup(&mut self, inputs: Inputs<'_>) -> Result<(), NodeError> {
        let name = inputs.text("Canvas ID")?;
        let surface = self
            .surfaces
            .resolve(name)
            .ok_or_else(|| NodeError::SurfaceNotFound(name.to_string()))?;

        tracing::debug!("Render bound to surface {name:?}");
        self.surface = Some(surface);
        Ok(())
    }

    async fn frame(&mut self, inputs: Inputs<'_>) -> Result<ParameterValue, NodeError> {
        let surface = self.surface.as_ref().ok_or(NodeError::SurfaceNotBound)?;
        let policy = inputs.fit_policy("Fit Mode")?;
        let Some(image) = inputs.raster("Image")? else {
            tracing::warn!("No image data available to render");
            return Ok(ParameterValue::Null);
        };

        present(&mut surface.write(), &image, policy);
        Ok(ParameterValue::Null)
    }
}
