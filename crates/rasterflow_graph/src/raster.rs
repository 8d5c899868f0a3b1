// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pixel buffers and the fit policies used to map one onto another.

use crate::parameter::UnknownSelection;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// RGBA pixel buffer with 8-bit channels
pub type Raster = RgbaImage;

/// Rule for mapping a source raster onto a differently-sized destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FitPolicy {
    /// Place at the origin without scaling
    ActualSize,
    /// Scale onto the full destination, ignoring aspect ratio
    Stretch,
    /// Scale to fit inside the destination, centered
    Contain,
    /// Repeat across the full destination
    Tile,
    /// Scale to cover the destination, centered and cropped
    Cover,
}

impl FitPolicy {
    /// Every policy, in selection order
    pub const ALL: [FitPolicy; 5] = [
        Self::ActualSize,
        Self::Stretch,
        Self::Contain,
        Self::Tile,
        Self::Cover,
    ];

    /// Selection label
    pub fn label(self) -> &'static str {
        match self {
            Self::ActualSize => "Actual Size",
            Self::Stretch => "Stretch",
            Self::Contain => "Contain",
            Self::Tile => "Tile",
            Self::Cover => "Cover",
        }
    }

    /// Whether a display surface must be cleared before drawing with this
    /// policy. Stretch and Tile repaint every destination pixel themselves.
    pub fn clears_destination(self) -> bool {
        matches!(self, Self::ActualSize | Self::Contain | Self::Cover)
    }
}

impl fmt::Display for FitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FitPolicy {
    type Err = UnknownSelection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|policy| policy.label() == s)
            .ok_or_else(|| UnknownSelection(s.to_string()))
    }
}

/// Destination rectangle of a scaled draw. Offsets may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Left edge
    pub x: i64,
    /// Top edge
    pub y: i64,
    /// Scaled width
    pub width: u32,
    /// Scaled height
    pub height: u32,
}

/// Where `source` lands inside `destination` under `policy`.
///
/// Returns `None` for [`FitPolicy::Tile`], which has no single placement, and
/// for empty sources.
pub fn placement(policy: FitPolicy, source: (u32, u32), destination: (u32, u32)) -> Option<Placement> {
    let (src_w, src_h) = source;
    let (dst_w, dst_h) = destination;
    if src_w == 0 || src_h == 0 {
        return None;
    }

    let scaled = |scale: f64| {
        let width = ((src_w as f64 * scale).round() as u32).max(1);
        let height = ((src_h as f64 * scale).round() as u32).max(1);
        Placement {
            x: (dst_w as i64 - width as i64).div_euclid(2),
            y: (dst_h as i64 - height as i64).div_euclid(2),
            width,
            height,
        }
    };
    let ratio_x = dst_w as f64 / src_w as f64;
    let ratio_y = dst_h as f64 / src_h as f64;

    match policy {
        FitPolicy::Stretch => Some(Placement {
            x: 0,
            y: 0,
            width: dst_w,
            height: dst_h,
        }),
        FitPolicy::Contain => Some(scaled(ratio_x.min(ratio_y))),
        FitPolicy::Cover => Some(scaled(ratio_x.max(ratio_y))),
        FitPolicy::ActualSize => Some(Placement {
            x: 0,
            y: 0,
            width: src_w,
            height: src_h,
        }),
        FitPolicy::Tile => None,
    }
}

/// Draw `source` into `destination` under `policy`, copying pixels over
/// whatever the destination already holds. Pixels outside the placement are
/// left untouched and overflow is cropped.
pub fn draw_fitted(destination: &mut Raster, source: &Raster, policy: FitPolicy, filter: FilterType) {
    if destination.width() == 0 || destination.height() == 0 {
        return;
    }
    if policy == FitPolicy::Tile {
        tile(destination, source);
        return;
    }
    let Some(target) = placement(policy, source.dimensions(), destination.dimensions()) else {
        return;
    };
    let Some((sx, sw, dx, dw)) = visible_span(target.x, target.width, source.width(), destination.width())
    else {
        return;
    };
    let Some((sy, sh, dy, dh)) = visible_span(target.y, target.height, source.height(), destination.height())
    else {
        return;
    };

    // Only the source pixels that land inside the destination are scaled
    let region = imageops::crop_imm(source, sx, sy, sw, sh).to_image();
    if (sw, sh) == (dw, dh) {
        imageops::replace(destination, &region, i64::from(dx), i64::from(dy));
    } else {
        let scaled = imageops::resize(&region, dw, dh, filter);
        imageops::replace(destination, &scaled, i64::from(dx), i64::from(dy));
    }
}

/// Clip one axis of a placement to the destination.
///
/// Returns `(source_start, source_len, destination_start, destination_len)`,
/// or `None` when nothing is visible.
fn visible_span(offset: i64, scaled: u32, source: u32, destination: u32) -> Option<(u32, u32, u32, u32)> {
    let start = offset.max(0);
    let end = (offset + i64::from(scaled)).min(i64::from(destination));
    if end <= start || scaled == 0 || source == 0 {
        return None;
    }

    let ratio = f64::from(source) / f64::from(scaled);
    let src_start = (((start - offset) as f64 * ratio).floor() as u32).min(source - 1);
    let src_end = (((end - offset) as f64 * ratio).ceil() as u32).clamp(src_start + 1, source);
    Some((src_start, src_end - src_start, start as u32, (end - start) as u32))
}

/// Repeat `source` across all of `destination`, starting at the origin
pub fn tile(destination: &mut Raster, source: &Raster) {
    let (src_w, src_h) = source.dimensions();
    if src_w == 0 || src_h == 0 {
        return;
    }
    for y in (0..destination.height()).step_by(src_h as usize) {
        for x in (0..destination.width()).step_by(src_w as usize) {
            imageops::replace(destination, source, x as i64, y as i64);
        }
    }
}

/// Reset every pixel to transparent black
pub fn clear(raster: &mut Raster) {
    for pixel in raster.pixels_mut() {
        *pixel = Rgba([0, 0, 0, 0]);
    }
}

/// Round and clamp a raw channel result into `[0, 255]`
pub fn to_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, color: [u8; 4]) -> Raster {
        Raster::from_pixel(width, height, Rgba(color))
    }

    #[test]
    fn test_policy_labels() {
        for policy in FitPolicy::ALL {
            assert_eq!(policy.label().parse::<FitPolicy>(), Ok(policy));
        }
        assert!("Squash".parse::<FitPolicy>().is_err());
    }

    #[test]
    fn test_contain_placement_is_centered() {
        let target = placement(FitPolicy::Contain, (2, 1), (4, 4)).unwrap();
        assert_eq!(
            target,
            Placement {
                x: 0,
                y: 1,
                width: 4,
                height: 2
            }
        );
    }

    #[test]
    fn test_cover_placement_overflows() {
        let target = placement(FitPolicy::Cover, (2, 1), (4, 4)).unwrap();
        assert_eq!((target.width, target.height), (8, 4));
        assert_eq!((target.x, target.y), (-2, 0));
    }

    #[test]
    fn test_cover_crops_to_center() {
        let mut source = Raster::new(4, 1);
        for x in 0..4 {
            source.put_pixel(x, 0, Rgba([x as u8 * 10, 0, 0, 255]));
        }
        let mut destination = Raster::new(2, 2);

        draw_fitted(&mut destination, &source, FitPolicy::Cover, FilterType::Nearest);

        for y in 0..2 {
            assert_eq!(destination.get_pixel(0, y).0, [10, 0, 0, 255]);
            assert_eq!(destination.get_pixel(1, y).0, [20, 0, 0, 255]);
        }
    }

    #[test]
    fn test_cover_of_thin_strip_stays_small() {
        // Scaling the whole strip first would need a 524288x64 buffer
        let source = solid(8192, 1, [7, 7, 7, 255]);
        let mut destination = Raster::new(64, 64);

        draw_fitted(&mut destination, &source, FitPolicy::Cover, FilterType::Triangle);

        assert!(destination.pixels().all(|p| p.0 == [7, 7, 7, 255]));
    }

    #[test]
    fn test_visible_span() {
        assert_eq!(visible_span(0, 4, 2, 4), Some((0, 2, 0, 4)));
        assert_eq!(visible_span(-3, 8, 4, 2), Some((1, 2, 0, 2)));
        assert_eq!(visible_span(1, 2, 2, 4), Some((0, 2, 1, 2)));
        assert_eq!(visible_span(5, 2, 2, 4), None);
    }

    #[test]
    fn test_actual_size_leaves_remaining_area() {
        let mut destination = solid(4, 4, [9, 9, 9, 9]);
        let source = solid(2, 2, [200, 0, 0, 255]);

        draw_fitted(&mut destination, &source, FitPolicy::ActualSize, FilterType::Nearest);

        assert_eq!(destination.get_pixel(1, 1).0, [200, 0, 0, 255]);
        assert_eq!(destination.get_pixel(3, 3).0, [9, 9, 9, 9]);
    }

    #[test]
    fn test_tile_fills_everything() {
        let mut destination = Raster::new(5, 3);
        let mut source = solid(2, 2, [10, 20, 30, 255]);
        source.put_pixel(1, 1, Rgba([1, 2, 3, 255]));

        draw_fitted(&mut destination, &source, FitPolicy::Tile, FilterType::Nearest);

        assert!(destination.pixels().all(|p| p[3] == 255));
        assert_eq!(destination.get_pixel(3, 1).0, [1, 2, 3, 255]);
        assert_eq!(destination.get_pixel(4, 2).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_channel_clamping() {
        assert_eq!(to_channel(-12.0), 0);
        assert_eq!(to_channel(23.53), 24);
        assert_eq!(to_channel(420.0), 255);
    }
}
