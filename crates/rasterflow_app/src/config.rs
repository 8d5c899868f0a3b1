// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runner configuration, read from a RON file.

use crate::error::AppError;
use rasterflow_graph::{EngineConfig, DEFAULT_CANVAS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How long the pipeline runs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RunMode {
    /// Set up, run one frame pass and stop
    SingleFrame,
    /// Run the throttled frame loop for a fixed time
    For {
        /// Seconds before the stop handle fires
        seconds: f64,
    },
}

impl Default for RunMode {
    fn default() -> Self {
        Self::For { seconds: 2.0 }
    }
}

/// A display surface created before the pipeline starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceConfig {
    /// Name render nodes look the surface up by
    pub name: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Top-level runner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Engine settings
    pub engine: EngineConfig,
    /// Refresh ticks per second offered to the engine
    pub refresh_hz: u32,
    /// Directory holding the built-in images
    pub assets_dir: PathBuf,
    /// Display surfaces
    pub surfaces: Vec<SurfaceConfig>,
    /// Run duration
    pub run: RunMode,
    /// Directory surfaces are written to after the run
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            refresh_hz: 60,
            assets_dir: PathBuf::from("assets"),
            surfaces: vec![SurfaceConfig {
                name: DEFAULT_CANVAS.to_string(),
                width: 512,
                height: 512,
            }],
            run: RunMode::default(),
            output_dir: PathBuf::from("out"),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path).map_err(|source| AppError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse configuration from RON text
    pub fn parse(text: &str) -> Result<Self, AppError> {
        Ok(ron::from_str(text)?)
    }
}
