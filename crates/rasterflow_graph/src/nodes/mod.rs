// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node processors: the per-kind behaviour behind every node.
//!
//! Each processor has a one-time [`Processor::setup`] and a per-frame
//! [`Processor::frame`] that turns the node's current parameter values into
//! one result value.

pub mod blend;
pub mod mottle;
pub mod render;
pub mod resize;
pub mod source;
pub mod value;

pub use blend::{Blend, BlendMode};
pub use mottle::Mottle;
pub use render::RenderSink;
pub use resize::Resize;
pub use source::ImageCache;
pub use value::Value;

use crate::parameter::{DataType, Parameter, ParameterValue};
use crate::raster::{FitPolicy, Raster};
use std::str::FromStr;
use std::sync::Arc;

/// Setup and per-frame behaviour of a node kind
#[allow(async_fn_in_trait)]
pub trait Processor {
    /// One-time initialisation, run in processing order before the first frame
    async fn setup(&mut self, _inputs: Inputs<'_>) -> Result<(), NodeError> {
        Ok(())
    }

    /// Produce this frame's result from the current inputs
    async fn frame(&mut self, inputs: Inputs<'_>) -> Result<ParameterValue, NodeError>;
}

/// Processor state for one node, one variant per node kind
#[derive(Debug)]
pub enum NodeProcessor {
    /// Constant value
    Value(Value),
    /// Cached built-in image
    ImageCache(ImageCache),
    /// Two-image compositing
    Blend(Blend),
    /// Monochromatic additive noise
    Mottle(Mottle),
    /// Resize to fixed dimensions
    Resize(Resize),
    /// Blit onto a display surface
    Render(RenderSink),
}

impl Processor for NodeProcessor {
    async fn setup(&mut self, inputs: Inputs<'_>) -> Result<(), NodeError> {
        match self {
            Self::Value(processor) => processor.setup(inputs).await,
            Self::ImageCache(processor) => processor.setup(inputs).await,
            Self::Blend(processor) => processor.setup(inputs).await,
            Self::Mottle(processor) => processor.setup(inputs).await,
            Self::Resize(processor) => processor.setup(inputs).await,
            Self::Render(processor) => processor.setup(inputs).await,
        }
    }

    async fn frame(&mut self, inputs: Inputs<'_>) -> Result<ParameterValue, NodeError> {
        match self {
            Self::Value(processor) => processor.frame(inputs).await,
            Self::ImageCache(processor) => processor.frame(inputs).await,
            Self::Blend(processor) => processor.frame(inputs).await,
            Self::Mottle(processor) => processor.frame(inputs).await,
            Self::Resize(processor) => processor.frame(inputs).await,
            Self::Render(processor) => processor.frame(inputs).await,
        }
    }
}

/// Read-only view of a node's inputs, looked up by name
#[derive(Debug, Clone, Copy)]
pub struct Inputs<'a> {
    parameters: &'a [Parameter],
}

impl<'a> Inputs<'a> {
    /// Wrap a parameter list
    pub fn new(parameters: &'a [Parameter]) -> Self {
        Self { parameters }
    }

    /// Current value of the input called `name`
    pub fn get(&self, name: &str) -> Result<&'a ParameterValue, NodeError> {
        self.parameters
            .iter()
            .find(|p| p.is_input() && p.name == name)
            .map(|p| &p.value)
            .ok_or_else(|| NodeError::ParameterNotFound(name.to_string()))
    }

    /// Text value of `name`
    pub fn text(&self, name: &str) -> Result<&'a str, NodeError> {
        self.get(name)?
            .as_text()
            .ok_or_else(|| unexpected(name, DataType::Text))
    }

    /// Number value of `name`
    pub fn number(&self, name: &str) -> Result<f64, NodeError> {
        self.get(name)?
            .as_number()
            .ok_or_else(|| unexpected(name, DataType::Number))
    }

    /// Boolean value of `name`
    pub fn boolean(&self, name: &str) -> Result<bool, NodeError> {
        self.get(name)?
            .as_bool()
            .ok_or_else(|| unexpected(name, DataType::Boolean))
    }

    /// Raster value of `name`, `None` while the input is still null
    pub fn raster(&self, name: &str) -> Result<Option<Arc<Raster>>, NodeError> {
        match self.get(name)? {
            ParameterValue::Null => Ok(None),
            ParameterValue::Raster(raster) => Ok(Some(raster.clone())),
            _ => Err(unexpected(name, DataType::Raster)),
        }
    }

    /// Parse the text selection `name` into an enumerated value
    pub fn selection<T: FromStr>(&self, name: &str) -> Result<T, NodeError> {
        let value = self.text(name)?;
        value.parse().map_err(|_| NodeError::UnsupportedOperation {
            parameter: name.to_string(),
            value: value.to_string(),
        })
    }

    /// Fit policy selected in `name`
    pub fn fit_policy(&self, name: &str) -> Result<FitPolicy, NodeError> {
        self.selection(name)
    }

    /// Non-negative integer value of `name`
    pub fn count(&self, name: &str) -> Result<usize, NodeError> {
        let value = self.number(name)?;
        if !value.is_finite() || value < 0.0 {
            return Err(NodeError::InvalidValue {
                parameter: name.to_string(),
                reason: format!("expected a non-negative count, got {value}"),
            });
        }
        Ok(value.round() as usize)
    }
}

fn unexpected(name: &str, expected: DataType) -> NodeError {
    NodeError::UnexpectedValue {
        parameter: name.to_string(),
        expected,
    }
}

/// Error raised by a node during setup or a frame
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// A resource could not be loaded or decoded
    #[error("Failed to load {resource}: {reason}")]
    ResourceLoad {
        /// What was being loaded
        resource: String,
        /// Underlying failure
        reason: String,
    },

    /// No display surface with this name
    #[error("Display surface not found: {0}")]
    SurfaceNotFound(String),

    /// The node was asked to draw before setup bound a surface
    #[error("No display surface bound")]
    SurfaceNotBound,

    /// Selection value outside the supported set
    #[error("Unsupported {parameter}: {value}")]
    UnsupportedOperation {
        /// Parameter holding the selection
        parameter: String,
        /// Rejected value
        value: String,
    },

    /// Parameter not found on the node
    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    /// Parameter holds a value of the wrong type
    #[error("Parameter {parameter} does not hold a {expected} value")]
    UnexpectedValue {
        /// Parameter name
        parameter: String,
        /// Type the node needed
        expected: DataType,
    },

    /// Parameter holds a value outside its valid range
    #[error("Invalid {parameter}: {reason}")]
    InvalidValue {
        /// Parameter name
        parameter: String,
        /// Why it was rejected
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::IdRegistry;
    use crate::parameter::ParameterDef;

    fn parameters(defs: &[ParameterDef]) -> Vec<Parameter> {
        let mut registry = IdRegistry::new();
        let node = registry.allocate_node();
        defs.iter()
            .map(|def| {
                let id = registry.allocate_parameter(&node, def.direction, def.data_type);
                Parameter::from_def(id, def)
            })
            .collect()
    }

    #[test]
    fn test_typed_lookups() {
        let params = parameters(&[
            ParameterDef::input("Mean", DataType::Number, 3.0),
            ParameterDef::input("Fit Mode", DataType::Text, "Cover"),
            ParameterDef::empty_input("Image", DataType::Raster),
        ]);
        let inputs = Inputs::new(&params);

        assert_eq!(inputs.number("Mean").unwrap(), 3.0);
        assert_eq!(inputs.fit_policy("Fit Mode").unwrap(), FitPolicy::Cover);
        assert!(inputs.raster("Image").unwrap().is_none());
        assert!(matches!(
            inputs.text("Mean"),
            Err(NodeError::UnexpectedValue { .. })
        ));
        assert!(matches!(
            inputs.get("Width"),
            Err(NodeError::ParameterNotFound(_))
        ));
    }

    #[test]
    fn test_unknown_selection_is_unsupported() {
        let params = parameters(&[ParameterDef::input("Fit Mode", DataType::Text, "Squash")]);
        let err = Inputs::new(&params).fit_policy("Fit Mode").unwrap_err();
        assert!(matches!(err, NodeError::UnsupportedOperation { value, .. } if value == "Squash"));
    }

    #[test]
    fn test_count_rejects_negative() {
        let params = parameters(&[ParameterDef::input("Array Length", DataType::Number, -4.0)]);
        assert!(matches!(
            Inputs::new(&params).count("Array Length"),
            Err(NodeError::InvalidValue { .. })
        ));
    }
}
