// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edge definitions for the graph.

use crate::id::{EdgeId, NodeId, ParameterId};

/// A directed link from an output parameter to an input parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Unique edge ID
    pub id: EdgeId,
    /// Node owning the source parameter
    pub from_node: NodeId,
    /// Source (output) parameter
    pub from: ParameterId,
    /// Node owning the destination parameter
    pub to_node: NodeId,
    /// Destination (input) parameter
    pub to: ParameterId,
}

impl Edge {
    /// Check if this edge involves a specific node
    pub fn involves_node(&self, node_id: &NodeId) -> bool {
        self.from_node == *node_id || self.to_node == *node_id
    }

    /// Check if this edge involves a specific parameter
    pub fn involves_parameter(&self, parameter_id: &ParameterId) -> bool {
        self.from == *parameter_id || self.to == *parameter_id
    }
}
