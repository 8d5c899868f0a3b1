// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes and edges.

use crate::description::{EdgeDescription, GraphDescription, NodeDescription, ParameterDescription};
use crate::edge::Edge;
use crate::id::{EdgeId, IdRegistry, NodeId, ParameterId};
use crate::node::{Node, NodeFactory, NodeType};
use crate::parameter::{DataType, Direction, Parameter, ParameterValue};
use indexmap::IndexMap;
use std::collections::HashSet;

/// A node graph
#[derive(Debug)]
pub struct Graph {
    /// Graph name
    pub name: String,
    /// Issues ids for everything in this graph
    registry: IdRegistry,
    /// Nodes in insertion order
    nodes: IndexMap<NodeId, Node>,
    /// Edges between parameters
    edges: IndexMap<EdgeId, Edge>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: IdRegistry::new(),
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
        }
    }

    /// The id registry owned by this graph
    pub fn registry(&self) -> &IdRegistry {
        &self.registry
    }

    /// Create a node of `node_type` and add it to the graph
    pub fn add_node(&mut self, factory: &NodeFactory, node_type: NodeType) -> NodeId {
        let node = factory.create(&mut self.registry, node_type);
        let id = node.id.clone();
        self.nodes.insert(id.clone(), node);
        id
    }

    /// Remove a node and every edge touching one of its parameters
    pub fn remove_node(&mut self, node_id: &NodeId) -> Result<Node, GraphError> {
        let node = self
            .nodes
            .get(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.clone()))?;
        let owned: HashSet<&ParameterId> = node.parameters.iter().map(|p| &p.id).collect();
        self.edges
            .retain(|_, edge| !owned.contains(&edge.from) && !owned.contains(&edge.to));

        self.nodes
            .shift_remove(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.clone()))
    }

    /// Remove every node and edge
    pub fn clear_nodes(&mut self) {
        self.clear_edges();
        self.nodes.clear();
    }

    /// Get a node by ID
    pub fn node(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(node_id)
    }

    /// Get all nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Find the node owning a parameter
    pub fn node_for_parameter(&self, parameter_id: &ParameterId) -> Option<&Node> {
        self.nodes.values().find(|node| node.owns(parameter_id))
    }

    /// Find a parameter anywhere in the graph
    pub fn parameter(&self, parameter_id: &ParameterId) -> Option<&Parameter> {
        self.node_for_parameter(parameter_id)?
            .parameter_by_id(parameter_id)
    }

    /// Set the value of a node's input, returning the previous value
    pub fn set_parameter(
        &mut self,
        node_id: &NodeId,
        name: &str,
        value: impl Into<ParameterValue>,
    ) -> Result<ParameterValue, GraphError> {
        let node = self
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.clone()))?;
        node.set_input(name, value)
            .ok_or_else(|| GraphError::ParameterNotFound(format!("{node_id}/{name}")))
    }

    /// Add an edge from an output parameter to an input parameter
    pub fn connect(&mut self, from: &ParameterId, to: &ParameterId) -> Result<EdgeId, GraphError> {
        let (from_node, source) = self.locate(from)?;
        let (to_node, target) = self.locate(to)?;

        if source.direction != Direction::Output {
            return Err(GraphError::InvalidDirection(from.clone()));
        }
        if target.direction != Direction::Input {
            return Err(GraphError::InvalidDirection(to.clone()));
        }

        // Prevent self-loops
        if from_node == to_node {
            return Err(GraphError::SelfLoop);
        }

        if !source.data_type.can_connect_to(target.data_type) {
            return Err(GraphError::TypeMismatch {
                from: source.data_type,
                to: target.data_type,
            });
        }

        // An input has a single writer
        if self.edges_to_parameter(to).next().is_some() {
            return Err(GraphError::InputAlreadyConnected(to.clone()));
        }

        let edge = Edge {
            id: self.registry.allocate_edge(),
            from_node,
            from: from.clone(),
            to_node,
            to: to.clone(),
        };
        let id = edge.id.clone();
        tracing::debug!("Connected {} -> {} as {id}", edge.from, edge.to);
        self.edges.insert(id.clone(), edge);
        Ok(id)
    }

    /// Connect the output called `output` on `from_node` to the input called
    /// `input` on `to_node`
    pub fn connect_named(
        &mut self,
        from_node: &NodeId,
        output: &str,
        to_node: &NodeId,
        input: &str,
    ) -> Result<EdgeId, GraphError> {
        let from = self.named(from_node, output, Direction::Output)?;
        let to = self.named(to_node, input, Direction::Input)?;
        self.connect(&from, &to)
    }

    fn named(&self, node_id: &NodeId, name: &str, direction: Direction) -> Result<ParameterId, GraphError> {
        let node = self
            .nodes
            .get(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.clone()))?;
        let parameter = match direction {
            Direction::Input => node.input_named(name),
            Direction::Output => node.output_named(name),
        };
        parameter
            .map(|p| p.id.clone())
            .ok_or_else(|| GraphError::ParameterNotFound(format!("{node_id}/{name}")))
    }

    fn locate(&self, parameter_id: &ParameterId) -> Result<(NodeId, &Parameter), GraphError> {
        let node = self
            .node_for_parameter(parameter_id)
            .ok_or_else(|| GraphError::ParameterNotFound(parameter_id.to_string()))?;
        let parameter = node
            .parameter_by_id(parameter_id)
            .ok_or_else(|| GraphError::ParameterNotFound(parameter_id.to_string()))?;
        Ok((node.id.clone(), parameter))
    }

    /// Remove an edge
    pub fn disconnect(&mut self, edge_id: &EdgeId) -> Result<Edge, GraphError> {
        self.edges
            .shift_remove(edge_id)
            .ok_or_else(|| GraphError::EdgeNotFound(edge_id.clone()))
    }

    /// Remove every edge
    pub fn clear_edges(&mut self) {
        self.edges.clear();
    }

    /// Get an edge by ID
    pub fn edge(&self, edge_id: &EdgeId) -> Option<&Edge> {
        self.edges.get(edge_id)
    }

    /// Get all edges
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Get the number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges leaving one of a node's outputs
    pub fn edges_from_node<'a>(&'a self, node_id: &'a NodeId) -> impl Iterator<Item = &'a Edge> {
        self.edges.values().filter(move |e| e.from_node == *node_id)
    }

    /// Edges arriving at a specific parameter
    pub fn edges_to_parameter<'a>(&'a self, parameter_id: &'a ParameterId) -> impl Iterator<Item = &'a Edge> {
        self.edges.values().filter(move |e| e.to == *parameter_id)
    }

    /// Get nodes in processing (topological) order.
    ///
    /// Every node appears after all nodes feeding it. Disconnected components
    /// are all covered. Any cycle fails the whole computation.
    pub fn processing_order(&self) -> Result<Vec<NodeId>, CycleError> {
        let adjacency = self.adjacency();
        let mut visited = HashSet::new();
        let mut processed = HashSet::new();
        let mut order = Vec::with_capacity(self.nodes.len());

        for node_id in self.nodes.keys() {
            if !visited.contains(node_id) {
                visit(node_id, &adjacency, &mut visited, &mut processed, &mut order)?;
            }
        }

        order.reverse();
        Ok(order)
    }

    /// Map from each node to the nodes one outgoing edge away
    fn adjacency(&self) -> IndexMap<&NodeId, Vec<&NodeId>> {
        let mut adjacency: IndexMap<&NodeId, Vec<&NodeId>> =
            self.nodes.keys().map(|id| (id, Vec::new())).collect();
        for edge in self.edges.values() {
            if let Some(neighbours) = adjacency.get_mut(&edge.from_node) {
                neighbours.push(&edge.to_node);
            }
        }
        adjacency
    }

    /// Write a node's result into its outputs and every input connected to
    /// them. Returns the number of inputs written.
    pub fn propagate(&mut self, node_id: &NodeId, value: &ParameterValue) -> Result<usize, GraphError> {
        let node = self
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.clone()))?;
        for output in node.parameters.iter_mut().filter(|p| p.is_output()) {
            output.value = value.clone();
        }

        let targets: Vec<(NodeId, ParameterId)> = self
            .edges_from_node(node_id)
            .map(|e| (e.to_node.clone(), e.to.clone()))
            .collect();

        let mut written = 0;
        for (target_node, target_parameter) in targets {
            let parameter = self
                .nodes
                .get_mut(&target_node)
                .and_then(|n| n.parameter_by_id_mut(&target_parameter))
                .ok_or_else(|| GraphError::ParameterNotFound(target_parameter.to_string()))?;
            if parameter.is_input() {
                parameter.value = value.clone();
                written += 1;
            }
        }
        Ok(written)
    }

    /// Serialisable structure of the graph
    pub fn describe(&self) -> GraphDescription {
        GraphDescription {
            name: self.name.clone(),
            nodes: self
                .nodes
                .values()
                .map(|node| NodeDescription {
                    id: node.id.clone(),
                    node_type: node.node_type,
                    name: node.name.clone(),
                    parameters: node
                        .parameters
                        .iter()
                        .map(|p| ParameterDescription {
                            id: p.id.clone(),
                            name: p.name.clone(),
                            data_type: p.data_type,
                            direction: p.direction,
                            value: p.value.clone(),
                        })
                        .collect(),
                })
                .collect(),
            edges: self
                .edges
                .values()
                .map(|edge| EdgeDescription {
                    id: edge.id.clone(),
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                })
                .collect(),
        }
    }
}

fn visit<'a>(
    node_id: &'a NodeId,
    adjacency: &IndexMap<&'a NodeId, Vec<&'a NodeId>>,
    visited: &mut HashSet<&'a NodeId>,
    processed: &mut HashSet<&'a NodeId>,
    order: &mut Vec<NodeId>,
) -> Result<(), CycleError> {
    if processed.contains(node_id) {
        return Ok(());
    }
    // Entered but not finished: a back edge on the current path
    if visited.contains(node_id) {
        return Err(CycleError);
    }

    visited.insert(node_id);

    for &neighbour in adjacency.get(node_id).into_iter().flatten() {
        visit(neighbour, adjacency, visited, processed, order)?;
    }

    order.push(node_id.clone());
    processed.insert(node_id);

    Ok(())
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Error when editing or querying a graph
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Parameter not found
    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    /// Edge not found
    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeId),

    /// Edges run from an output to an input
    #[error("Parameter {0} has the wrong direction for this end of an edge")]
    InvalidDirection(ParameterId),

    /// Incompatible data types
    #[error("Cannot connect a {from} output to a {to} input")]
    TypeMismatch {
        /// Source data type
        from: DataType,
        /// Destination data type
        to: DataType,
    },

    /// Self-loop not allowed
    #[error("Self-loop not allowed")]
    SelfLoop,

    /// Input already has an incoming edge
    #[error("Input already connected: {0}")]
    InputAlreadyConnected(ParameterId),
}

/// Error when graph contains a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Graph contains a cycle")]
pub struct CycleError;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::BuiltinAssets;
    use crate::surface::SurfaceRegistry;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use std::sync::Arc;

    fn factory() -> NodeFactory {
        NodeFactory::new(
            Arc::new(BuiltinAssets::new("assets")),
            Arc::new(SurfaceRegistry::new()),
        )
    }

    fn position(order: &[NodeId], id: &NodeId) -> usize {
        order.iter().position(|n| n == id).unwrap()
    }

    fn assert_respects_edges(graph: &Graph, order: &[NodeId]) {
        assert_eq!(order.len(), graph.node_count());
        let unique: HashSet<_> = order.iter().collect();
        assert_eq!(unique.len(), order.len());
        for edge in graph.edges() {
            assert!(position(order, &edge.from_node) < position(order, &edge.to_node));
        }
    }

    #[test]
    fn test_chain_order() {
        let factory = factory();
        let mut graph = Graph::new("chain");
        // Inserted downstream-first so insertion order is not the answer
        let c = graph.add_node(&factory, NodeType::Value);
        let b = graph.add_node(&factory, NodeType::Value);
        let a = graph.add_node(&factory, NodeType::Value);
        graph.connect_named(&a, "Value", &b, "Value").unwrap();
        graph.connect_named(&b, "Value", &c, "Value").unwrap();

        assert_eq!(graph.processing_order().unwrap(), vec![a, b, c]);
    }

    #[test]
    fn test_disconnected_components() {
        let factory = factory();
        let mut graph = Graph::new("components");
        let b = graph.add_node(&factory, NodeType::Value);
        let a = graph.add_node(&factory, NodeType::Value);
        let d = graph.add_node(&factory, NodeType::Value);
        let c = graph.add_node(&factory, NodeType::Value);
        graph.connect_named(&a, "Value", &b, "Value").unwrap();
        graph.connect_named(&c, "Value", &d, "Value").unwrap();

        let order = graph.processing_order().unwrap();
        assert_respects_edges(&graph, &order);
        assert!(position(&order, &a) < position(&order, &b));
        assert!(position(&order, &c) < position(&order, &d));
    }

    #[test]
    fn test_cycle_detected() {
        let factory = factory();
        let mut graph = Graph::new("cycle");
        let isolated = graph.add_node(&factory, NodeType::Value);
        let a = graph.add_node(&factory, NodeType::Blend);
        let b = graph.add_node(&factory, NodeType::Blend);
        let c = graph.add_node(&factory, NodeType::Blend);
        graph.connect_named(&a, "Image", &b, "Image A").unwrap();
        graph.connect_named(&b, "Image", &c, "Image A").unwrap();
        graph.connect_named(&c, "Image", &a, "Image A").unwrap();

        assert_eq!(graph.processing_order(), Err(CycleError));

        graph.remove_node(&isolated).unwrap();
        assert_eq!(graph.processing_order(), Err(CycleError));
    }

    #[test]
    fn test_diamond() {
        let factory = factory();
        let mut graph = Graph::new("diamond");
        let sink = graph.add_node(&factory, NodeType::Blend);
        let left = graph.add_node(&factory, NodeType::Mottle);
        let right = graph.add_node(&factory, NodeType::Resize);
        let source = graph.add_node(&factory, NodeType::ImageCache);
        graph.connect_named(&source, "Cached Image", &left, "Image").unwrap();
        graph.connect_named(&source, "Cached Image", &right, "Image").unwrap();
        graph.connect_named(&left, "Image", &sink, "Image A").unwrap();
        graph.connect_named(&right, "Image", &sink, "Image B").unwrap();

        let order = graph.processing_order().unwrap();
        assert_respects_edges(&graph, &order);
        assert_eq!(order.first(), Some(&source));
        assert_eq!(order.last(), Some(&sink));
    }

    #[test]
    fn test_random_dags_are_ordered() {
        let factory = factory();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            let mut graph = Graph::new("random");
            let count = rng.gen_range(1..24);
            let nodes: Vec<NodeId> = (0..count)
                .map(|_| graph.add_node(&factory, NodeType::Blend))
                .collect();
            // A random ranking decides which way every edge may point
            let mut ranked = nodes.clone();
            ranked.shuffle(&mut rng);

            for (rank, target) in ranked.iter().enumerate().skip(1) {
                for input in ["Image A", "Image B"] {
                    if rng.gen_bool(0.6) {
                        let source = &ranked[rng.gen_range(0..rank)];
                        graph.connect_named(source, "Image", target, input).unwrap();
                    }
                }
            }

            let order = graph.processing_order().unwrap();
            assert_respects_edges(&graph, &order);
        }
    }

    #[test]
    fn test_connect_validation() {
        let factory = factory();
        let mut graph = Graph::new("validation");
        let value = graph.add_node(&factory, NodeType::Value);
        let blend = graph.add_node(&factory, NodeType::Blend);
        let other = graph.add_node(&factory, NodeType::Blend);

        assert!(matches!(
            graph.connect_named(&value, "Value", &blend, "Image A"),
            Err(GraphError::TypeMismatch {
                from: DataType::Number,
                to: DataType::Raster
            })
        ));
        assert_eq!(
            graph.connect_named(&blend, "Image", &blend, "Image A"),
            Err(GraphError::SelfLoop)
        );

        let input = graph.node(&blend).unwrap().input_named("Image A").unwrap().id.clone();
        let output = graph.node(&other).unwrap().output_named("Image").unwrap().id.clone();
        assert_eq!(
            graph.connect(&input, &output),
            Err(GraphError::InvalidDirection(input.clone()))
        );

        graph.connect(&output, &input).unwrap();
        assert_eq!(
            graph.connect(&output, &input),
            Err(GraphError::InputAlreadyConnected(input.clone()))
        );
        assert!(matches!(
            graph.connect_named(&other, "Image", &blend, "Missing"),
            Err(GraphError::ParameterNotFound(_))
        ));
    }

    #[test]
    fn test_remove_node_removes_edges() {
        let factory = factory();
        let mut graph = Graph::new("removal");
        let a = graph.add_node(&factory, NodeType::Value);
        let b = graph.add_node(&factory, NodeType::Value);
        let c = graph.add_node(&factory, NodeType::Value);
        graph.connect_named(&a, "Value", &b, "Value").unwrap();
        let kept = graph.connect_named(&a, "Value", &c, "Value").unwrap();
        graph.connect_named(&b, "Value", &c, "Value").unwrap_err();

        let removed = graph.remove_node(&b).unwrap();
        assert_eq!(removed.id, b);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.edge(&kept).is_some());
        assert!(graph
            .edges()
            .all(|e| !removed.parameters.iter().any(|p| e.involves_parameter(&p.id))));
        assert_eq!(graph.node_ids().cloned().collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(graph.remove_node(&b).unwrap_err(), GraphError::NodeNotFound(b));
    }

    #[test]
    fn test_clear_and_disconnect() {
        let factory = factory();
        let mut graph = Graph::new("clear");
        let a = graph.add_node(&factory, NodeType::Value);
        let b = graph.add_node(&factory, NodeType::Value);
        let edge = graph.connect_named(&a, "Value", &b, "Value").unwrap();

        assert_eq!(graph.disconnect(&edge).unwrap().id, edge);
        assert_eq!(graph.disconnect(&edge), Err(GraphError::EdgeNotFound(edge)));

        graph.connect_named(&a, "Value", &b, "Value").unwrap();
        graph.clear_nodes();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_propagate() {
        let factory = factory();
        let mut graph = Graph::new("propagation");
        let x = graph.add_node(&factory, NodeType::Value);
        let y = graph.add_node(&factory, NodeType::Value);
        let z = graph.add_node(&factory, NodeType::Value);
        graph.connect_named(&x, "Value", &y, "Value").unwrap();
        graph.connect_named(&x, "Value", &z, "Value").unwrap();

        let written = graph.propagate(&x, &ParameterValue::Number(7.0)).unwrap();

        assert_eq!(written, 2);
        for id in [&y, &z] {
            let node = graph.node(id).unwrap();
            assert_eq!(node.input_named("Value").unwrap().value, ParameterValue::Number(7.0));
        }
        let source = graph.node(&x).unwrap();
        assert_eq!(source.output_named("Value").unwrap().value, ParameterValue::Number(7.0));
        assert_eq!(source.input_named("Value").unwrap().value, ParameterValue::Number(0.0));
    }

    #[test]
    fn test_describe() {
        let factory = factory();
        let mut graph = Graph::new("described");
        let a = graph.add_node(&factory, NodeType::ImageCache);
        let b = graph.add_node(&factory, NodeType::Render);
        let edge = graph.connect_named(&a, "Cached Image", &b, "Image").unwrap();

        let description = graph.describe();
        assert_eq!(description.name, "described");
        assert_eq!(description.nodes.len(), 2);
        assert_eq!(description.nodes[0].node_type, NodeType::ImageCache);
        assert_eq!(description.edges[0].id, edge);

        let text = ron::to_string(&description).unwrap();
        assert!(text.contains("\"Lena\""));
        assert!(text.contains("\"conradCanvas\""));
    }
}
