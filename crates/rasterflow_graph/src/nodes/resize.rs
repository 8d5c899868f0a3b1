// SPDX-License-Identifier: MIT OR Apache-2.0
//! Resize node.

use super::{Inputs, NodeError, Processor};
use crate::parameter::ParameterValue;
use crate::raster::{draw_fitted, FitPolicy, Raster};
use image::imageops::FilterType;
use std::sync::Arc;

/// Resize `image` onto a transparent canvas of exactly `width` x `height`
pub fn resize(image: &Raster, width: u32, height: u32, policy: FitPolicy) -> Raster {
    let mut canvas = Raster::new(width, height);
    draw_fitted(&mut canvas, image, policy, FilterType::Triangle);
    canvas
}

/// Largest width or height a resize may produce
pub const MAX_DIMENSION: u32 = 16_384;

/// Resize node: `Image`, `Width`, `Height`, `Fit Mode`
#[derive(Debug, Default)]
pub struct Resize;

fn dimension(inputs: &Inputs<'_>, name: &str) -> Result<u32, NodeError> {
    let value = inputs.count(name)?;
    u32::try_from(value)
        .ok()
        .filter(|v| (1..=MAX_DIMENSION).contains(v))
        .ok_or_else(|| NodeError::InvalidValue {
            parameter: name.to_string(),
            reason: format!("expected 1 to {MAX_DIMENSION} pixels, got {value}"),
        })
}

impl Processor for Resize {
    async fn frame(&mut self, inputs: Inputs<'_>) -> Result<ParameterValue, NodeError> {
        let width = dimension(&inputs, "Width")?;
        let height = dimension(&inputs, "Height")?;
        let policy = inputs.fit_policy("Fit Mode")?;
        let Some(image) = inputs.raster("Image")? else {
            tracing::debug!("Resize skipped: missing input image");
            return Ok(ParameterValue::Null);
        };

        Ok(ParameterValue::Raster(Arc::new(resize(&image, width, height, policy))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::IdRegistry;
    use crate::parameter::{DataType, Parameter, ParameterDef};
    use image::Rgba;

    fn parameters(width: f64, height: f64) -> Vec<Parameter> {
        let mut registry = IdRegistry::new();
        let node = registry.allocate_node();
        let image = ParameterValue::from(Raster::from_pixel(2, 2, Rgba([1, 2, 3, 255])));
        [
            ParameterDef::input("Image", DataType::Raster, image),
            ParameterDef::input("Width", DataType::Number, width),
            ParameterDef::input("Height", DataType::Number, height),
            ParameterDef::input("Fit Mode", DataType::Text, "Stretch"),
        ]
        .iter()
        .map(|def| {
            let id = registry.allocate_parameter(&node, def.direction, def.data_type);
            Parameter::from_def(id, def)
        })
        .collect()
    }

    #[tokio::test]
    async fn test_oversized_dimension_rejected() {
        let params = parameters(1e9, 4.0);
        let err = Resize.frame(Inputs::new(&params)).await.unwrap_err();
        assert!(matches!(err, NodeError::InvalidValue { parameter, .. } if parameter == "Width"));

        let params = parameters(4.0, f64::from(MAX_DIMENSION) + 1.0);
        let err = Resize.frame(Inputs::new(&params)).await.unwrap_err();
        assert!(matches!(err, NodeError::InvalidValue { parameter, .. } if parameter == "Height"));
    }

    #[tokio::test]
    async fn test_frame_produces_target_size() {
        let params = parameters(3.0, 5.0);
        let out = Resize.frame(Inputs::new(&params)).await.unwrap();
        assert_eq!(out.as_raster().unwrap().dimensions(), (3, 5));
    }

    #[test]
    fn test_stretch_fills_target() {
        let image = Raster::from_pixel(2, 2, Rgba([40, 80, 120, 255]));
        let out = resize(&image, 4, 4, FitPolicy::Stretch);

        assert_eq!(out.dimensions(), (4, 4));
        assert!(out.pixels().all(|p| p.0 == [40, 80, 120, 255]));
    }

    #[test]
    fn test_contain_leaves_symmetric_margins() {
        let image = Raster::from_pixel(2, 1, Rgba([200, 10, 10, 255]));
        let out = resize(&image, 4, 4, FitPolicy::Contain);

        assert_eq!(out.dimensions(), (4, 4));
        for x in 0..4 {
            assert_eq!(out.get_pixel(x, 0)[3], 0);
            assert_eq!(out.get_pixel(x, 1)[3], 255);
            assert_eq!(out.get_pixel(x, 2)[3], 255);
            assert_eq!(out.get_pixel(x, 3)[3], 0);
        }
    }

    #[test]
    fn test_cover_fills_target() {
        let image = Raster::from_pixel(2, 1, Rgba([5, 6, 7, 255]));
        let out = resize(&image, 4, 4, FitPolicy::Cover);
        assert!(out.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn test_actual_size_keeps_scale() {
        let image = Raster::from_pixel(1, 1, Rgba([9, 9, 9, 255]));
        let out = resize(&image, 3, 2, FitPolicy::ActualSize);

        assert_eq!(out.dimensions(), (3, 2));
        assert_eq!(out.get_pixel(0, 0).0, [9, 9, 9, 255]);
        assert_eq!(out.get_pixel(2, 1).0, [0, 0, 0, 0]);
    }
}
