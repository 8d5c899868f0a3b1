// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in images available to source nodes.

use crate::parameter::UnknownSelection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Images shipped with the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinImage {
    /// Lena test image
    Lena,
    /// Horizontal greyscale ramp
    GradientHorizontal,
    /// Radial greyscale ramp
    GradientRadial,
}

impl BuiltinImage {
    /// Every built-in image, in selection order
    pub const ALL: [BuiltinImage; 3] = [Self::Lena, Self::GradientHorizontal, Self::GradientRadial];

    /// Selection label
    pub fn label(self) -> &'static str {
        match self {
            Self::Lena => "Lena",
            Self::GradientHorizontal => "Gradient Horizontal",
            Self::GradientRadial => "Gradient Radial",
        }
    }

    /// File name inside the asset directory
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Lena => "lena.bmp",
            Self::GradientHorizontal => "gradient_256.webp",
            Self::GradientRadial => "radial_256.webp",
        }
    }
}

impl fmt::Display for BuiltinImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BuiltinImage {
    type Err = UnknownSelection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|image| image.label() == s)
            .ok_or_else(|| UnknownSelection(s.to_string()))
    }
}

/// Maps built-in image identifiers to loadable locations
pub trait AssetResolver: fmt::Debug + Send + Sync {
    /// Location of `image`, if this resolver provides it
    fn resolve(&self, image: BuiltinImage) -> Option<PathBuf>;
}

/// Resolves built-in images to files in one directory
#[derive(Debug, Clone)]
pub struct BuiltinAssets {
    root: PathBuf,
}

impl BuiltinAssets {
    /// Serve images from `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The asset directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetResolver for BuiltinAssets {
    fn resolve(&self, image: BuiltinImage) -> Option<PathBuf> {
        Some(self.root.join(image.file_name()))
    }
}
