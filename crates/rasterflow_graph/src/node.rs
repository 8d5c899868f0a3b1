// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph framework.

use crate::assets::{AssetResolver, BuiltinImage};
use crate::id::{IdRegistry, NodeId, ParameterId};
use crate::nodes::{
    Blend, BlendMode, ImageCache, Inputs, Mottle, NodeError, NodeProcessor, Processor, RenderSink,
    Resize, Value,
};
use crate::parameter::{DataType, Parameter, ParameterDef, ParameterValue};
use crate::raster::FitPolicy;
use crate::surface::SurfaceResolver;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Display surface render nodes bind to unless told otherwise
pub const DEFAULT_CANVAS: &str = "conradCanvas";

/// Node kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Constant value
    Value,
    /// Cached built-in image
    ImageCache,
    /// Two-image compositing
    Blend,
    /// Additive noise
    Mottle,
    /// Resize to fixed dimensions
    Resize,
    /// Display surface sink
    Render,
}

impl NodeType {
    /// Every node kind
    pub const ALL: [NodeType; 6] = [
        Self::Value,
        Self::ImageCache,
        Self::Blend,
        Self::Mottle,
        Self::Resize,
        Self::Render,
    ];

    /// Default display name
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Value => "Value",
            Self::ImageCache => "Image Cache",
            Self::Blend => "Blend",
            Self::Mottle => "Mottle",
            Self::Resize => "Resize",
            Self::Render => "Render",
        }
    }

    /// Parameters every node of this kind starts with
    pub fn parameters(self) -> Vec<ParameterDef> {
        match self {
            Self::Value => vec![
                ParameterDef::input("Value", DataType::Number, 0.0),
                ParameterDef::output("Value", DataType::Number),
            ],
            Self::ImageCache => vec![
                ParameterDef::input("Image", DataType::Text, BuiltinImage::Lena.label()),
                ParameterDef::output("Cached Image", DataType::Raster),
            ],
            Self::Blend => vec![
                ParameterDef::empty_input("Image A", DataType::Raster),
                ParameterDef::empty_input("Image B", DataType::Raster),
                ParameterDef::input("Blend Mode", DataType::Text, BlendMode::Add.label()),
                ParameterDef::input("Normalise", DataType::Boolean, false),
                ParameterDef::output("Image", DataType::Raster),
            ],
            Self::Mottle => vec![
                ParameterDef::empty_input("Image", DataType::Raster),
                ParameterDef::input("Mean", DataType::Number, 0.0),
                ParameterDef::input("Standard Deviation", DataType::Number, 20.0),
                ParameterDef::input("Array Length", DataType::Number, 2000.0),
                ParameterDef::output("Image", DataType::Raster),
            ],
            Self::Resize => vec![
                ParameterDef::empty_input("Image", DataType::Raster),
                ParameterDef::input("Width", DataType::Number, 512.0),
                ParameterDef::input("Height", DataType::Number, 512.0),
                ParameterDef::input("Fit Mode", DataType::Text, FitPolicy::Stretch.label()),
                ParameterDef::output("Image", DataType::Raster),
            ],
            Self::Render => vec![
                ParameterDef::input("Canvas ID", DataType::Text, DEFAULT_CANVAS),
                ParameterDef::empty_input("Image", DataType::Raster),
                ParameterDef::input("Fit Mode", DataType::Text, FitPolicy::Stretch.label()),
            ],
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A node instance in the graph
#[derive(Debug)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Node kind
    pub node_type: NodeType,
    /// Display name (can be customized)
    pub name: String,
    /// Parameters in declaration order
    pub parameters: Vec<Parameter>,
    processor: NodeProcessor,
}

impl Node {
    /// Get a parameter by name.
    ///
    /// Inputs and outputs may share a name, in which case the first
    /// declared one wins; use [`Node::output_named`] for outputs.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Get a parameter by ID
    pub fn parameter_by_id(&self, id: &ParameterId) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.id == *id)
    }

    /// Get a mutable parameter by ID
    pub fn parameter_by_id_mut(&mut self, id: &ParameterId) -> Option<&mut Parameter> {
        self.parameters.iter_mut().find(|p| p.id == *id)
    }

    /// Get an input parameter by name
    pub fn input_named(&self, name: &str) -> Option<&Parameter> {
        self.inputs().find(|p| p.name == name)
    }

    /// Get an output parameter by name
    pub fn output_named(&self, name: &str) -> Option<&Parameter> {
        self.outputs().find(|p| p.name == name)
    }

    /// Input parameters
    pub fn inputs(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(|p| p.is_input())
    }

    /// Output parameters
    pub fn outputs(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(|p| p.is_output())
    }

    /// Whether `id` belongs to this node
    pub fn owns(&self, id: &ParameterId) -> bool {
        self.parameter_by_id(id).is_some()
    }

    /// Set the value of the input called `name`, returning the previous value
    pub fn set_input(&mut self, name: &str, value: impl Into<ParameterValue>) -> Option<ParameterValue> {
        let parameter = self
            .parameters
            .iter_mut()
            .find(|p| p.is_input() && p.name == name)?;
        Some(std::mem::replace(&mut parameter.value, value.into()))
    }

    /// Processor state
    pub fn processor(&self) -> &NodeProcessor {
        &self.processor
    }

    /// Run this node's one-time setup
    pub async fn setup(&mut self) -> Result<(), NodeError> {
        self.processor.setup(Inputs::new(&self.parameters)).await
    }

    /// Run this node's per-frame operation
    pub async fn frame(&mut self) -> Result<ParameterValue, NodeError> {
        self.processor.frame(Inputs::new(&self.parameters)).await
    }
}

/// Builds nodes and injects the resources their processors depend on
#[derive(Debug, Clone)]
pub struct NodeFactory {
    assets: Arc<dyn AssetResolver>,
    surfaces: Arc<dyn SurfaceResolver>,
}

impl NodeFactory {
    /// Create a factory for source nodes resolving through `assets` and render
    /// nodes drawing onto `surfaces`
    pub fn new(assets: Arc<dyn AssetResolver>, surfaces: Arc<dyn SurfaceResolver>) -> Self {
        Self { assets, surfaces }
    }

    /// Create a node of `node_type` with ids drawn from `registry`
    pub fn create(&self, registry: &mut IdRegistry, node_type: NodeType) -> Node {
        let id = registry.allocate_node();
        let parameters = node_type
            .parameters()
            .iter()
            .map(|def| {
                let parameter_id = registry.allocate_parameter(&id, def.direction, def.data_type);
                Parameter::from_def(parameter_id, def)
            })
            .collect();

        let processor = match node_type {
            NodeType::Value => NodeProcessor::Value(Value),
            NodeType::ImageCache => NodeProcessor::ImageCache(ImageCache::new(self.assets.clone())),
            NodeType::Blend => NodeProcessor::Blend(Blend),
            NodeType::Mottle => NodeProcessor::Mottle(Mottle::new()),
            NodeType::Resize => NodeProcessor::Resize(Resize),
            NodeType::Render => NodeProcessor::Render(RenderSink::new(self.surfaces.clone())),
        };

        Node {
            id,
            node_type,
            name: node_type.display_name().to_string(),
            parameters,
            processor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::BuiltinAssets;
    use crate::parameter::Direction;
    use crate::surface::SurfaceRegistry;

    fn factory() -> NodeFactory {
        NodeFactory::new(
            Arc::new(BuiltinAssets::new("assets")),
            Arc::new(SurfaceRegistry::new()),
        )
    }

    #[test]
    fn test_parameter_ids_belong_to_node() {
        let mut registry = IdRegistry::new();
        for node_type in NodeType::ALL {
            let node = factory().create(&mut registry, node_type);
            assert_eq!(node.node_type, node_type);
            for parameter in &node.parameters {
                assert_eq!(parameter.id.node_part(), node.id.as_str());
                assert_eq!(parameter.id.direction(), Some(parameter.direction));
                assert_eq!(parameter.id.data_type(), Some(parameter.data_type));
            }
        }
    }

    #[test]
    fn test_blend_defaults() {
        let mut registry = IdRegistry::new();
        let node = factory().create(&mut registry, NodeType::Blend);

        assert_eq!(node.name, "Blend");
        assert_eq!(node.inputs().count(), 4);
        assert_eq!(node.outputs().count(), 1);
        assert_eq!(
            node.input_named("Blend Mode").map(|p| &p.value),
            Some(&ParameterValue::from("Add"))
        );
        assert!(matches!(node.processor(), NodeProcessor::Blend(_)));
    }

    #[test]
    fn test_set_input_only_touches_inputs() {
        let mut registry = IdRegistry::new();
        let mut node = factory().create(&mut registry, NodeType::Value);

        assert_eq!(node.set_input("Value", 7.0), Some(ParameterValue::Number(0.0)));
        assert_eq!(node.input_named("Value").unwrap().value, ParameterValue::Number(7.0));
        assert!(node.output_named("Value").unwrap().value.is_null());
        assert_eq!(node.output_named("Value").unwrap().direction, Direction::Output);
        assert!(node.set_input("Missing", 1.0).is_none());
    }

    #[tokio::test]
    async fn test_value_node_frame() {
        let mut registry = IdRegistry::new();
        let mut node = factory().create(&mut registry, NodeType::Value);
        node.set_input("Value", 3.5);

        node.setup().await.unwrap();
        assert_eq!(node.frame().await.unwrap(), ParameterValue::Number(3.5));
    }
}
