// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runner errors.

use rasterflow_graph::{EngineError, GraphError};
use std::path::PathBuf;

/// Error from the runner
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// File could not be read or written
    #[error("{}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Cause
        source: std::io::Error,
    },

    /// Configuration could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(#[from] ron::error::SpannedError),

    /// Building the pipeline failed
    #[error("Failed to build pipeline: {0}")]
    Graph(#[from] GraphError),

    /// Running the pipeline failed
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A surface could not be written out
    #[error("Failed to save {}: {source}", path.display())]
    Image {
        /// Output file
        path: PathBuf,
        /// Cause
        source: image::ImageError,
    },
}
