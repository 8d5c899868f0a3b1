// SPDX-License-Identifier: MIT OR Apache-2.0
//! Serialisable snapshot of a graph's structure and parameter values.

use crate::id::{EdgeId, NodeId, ParameterId};
use crate::node::NodeType;
use crate::parameter::{DataType, Direction, ParameterValue};
use serde::Serialize;

/// Structure of a whole graph
#[derive(Debug, Clone, Serialize)]
pub struct GraphDescription {
    /// Graph name
    pub name: String,
    /// Nodes in insertion order
    pub nodes: Vec<NodeDescription>,
    /// Edges in insertion order
    pub edges: Vec<EdgeDescription>,
}

/// One node and its parameters
#[derive(Debug, Clone, Serialize)]
pub struct NodeDescription {
    /// Node ID
    pub id: NodeId,
    /// Node kind
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Display name
    pub name: String,
    /// Parameters in declaration order
    pub parameters: Vec<ParameterDescription>,
}

/// One parameter. Raster values serialise as empty.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterDescription {
    /// Parameter ID
    pub id: ParameterId,
    /// Parameter name
    pub name: String,
    /// Data type
    pub data_type: DataType,
    /// Direction
    pub direction: Direction,
    /// Current value
    pub value: ParameterValue,
}

/// One edge
#[derive(Debug, Clone, Serialize)]
pub struct EdgeDescription {
    /// Edge ID
    pub id: EdgeId,
    /// Source parameter
    pub from: ParameterId,
    /// Destination parameter
    pub to: ParameterId,
}
