// SPDX-License-Identifier: MIT OR Apache-2.0
//! The pipeline the runner executes.
//!
//! ```text
//! Image Cache (Lena) ──> Mottle ──────────────> Blend A ┐
//! Image Cache (Gradient Horizontal) ─> Resize ─> Blend B ┴> Render
//! ```

use rasterflow_graph::{BlendMode, BuiltinImage, FitPolicy, Graph, GraphError, NodeFactory, NodeType};

/// Build the demo graph drawing onto the surface called `canvas`
pub fn build(factory: &NodeFactory, canvas: &str, size: (u32, u32)) -> Result<Graph, GraphError> {
    let mut graph = Graph::new("Mottled overlay");

    let lena = graph.add_node(factory, NodeType::ImageCache);
    graph.set_parameter(&lena, "Image", BuiltinImage::Lena.label())?;

    let mottle = graph.add_node(factory, NodeType::Mottle);
    graph.set_parameter(&mottle, "Standard Deviation", 12.0)?;

    let gradient = graph.add_node(factory, NodeType::ImageCache);
    graph.set_parameter(&gradient, "Image", BuiltinImage::GradientHorizontal.label())?;

    let resize = graph.add_node(factory, NodeType::Resize);
    graph.set_parameter(&resize, "Width", f64::from(size.0))?;
    graph.set_parameter(&resize, "Height", f64::from(size.1))?;

    let blend = graph.add_node(factory, NodeType::Blend);
    graph.set_parameter(&blend, "Blend Mode", BlendMode::Overlay.label())?;

    let render = graph.add_node(factory, NodeType::Render);
    graph.set_parameter(&render, "Canvas ID", canvas)?;
    graph.set_parameter(&render, "Fit Mode", FitPolicy::Contain.label())?;

    graph.connect_named(&lena, "Cached Image", &mottle, "Image")?;
    graph.connect_named(&gradient, "Cached Image", &resize, "Image")?;
    graph.connect_named(&mottle, "Image", &blend, "Image A")?;
    graph.connect_named(&resize, "Image", &blend, "Image B")?;
    graph.connect_named(&blend, "Image", &render, "Image")?;

    Ok(graph)
}
