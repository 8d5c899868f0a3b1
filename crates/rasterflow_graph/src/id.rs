// SPDX-License-Identifier: MIT OR Apache-2.0
//! Identifier allocation for nodes, edges and parameters.
//!
//! Identifiers are short strings that carry the kind of entity they name:
//!
//! - `node-1a2f` for a node
//! - `edge-9d83` for an edge
//! - `node-1a2f-3c9d` for a parameter owned by `node-1a2f`
//!
//! In a parameter suffix the parity of the first hex digit is the direction
//! (even for inputs, odd for outputs) and the second digit is the data type
//! nibble. The last two digits are random.
//!
//! Once the random fragments of a kind get crowded, ids fall back to a
//! sequence number at least one digit longer than the random fragment, so
//! the two forms never collide.

use crate::parameter::{DataType, Direction};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Unique identifier for a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for an edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterId(String);

impl ParameterId {
    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The raw id of the node this parameter was allocated for
    pub fn node_part(&self) -> &str {
        self.0.rsplit_once('-').map_or("", |(node, _)| node)
    }

    /// Direction encoded in the id
    pub fn direction(&self) -> Option<Direction> {
        let digit = self.suffix_digit(0)?;
        Some(if digit % 2 == 0 {
            Direction::Input
        } else {
            Direction::Output
        })
    }

    /// Data type encoded in the id
    pub fn data_type(&self) -> Option<DataType> {
        self.suffix_digit(1).and_then(DataType::from_nibble)
    }

    fn suffix_digit(&self, index: usize) -> Option<u8> {
        let (_, suffix) = self.0.rsplit_once('-')?;
        if suffix.len() < 4 {
            return None;
        }
        suffix
            .chars()
            .nth(index)
            .and_then(|c| c.to_digit(16))
            .map(|d| d as u8)
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Random draws per allocation before falling back to the sequence
const RANDOM_ATTEMPTS: usize = 32;

/// Allocates identifiers that are unique within one registry.
///
/// A random fragment is drawn and redrawn until the full id has not been
/// issued before, up to a fixed number of attempts. After that the id uses
/// the registry's sequence number instead. Ids are never released.
#[derive(Debug, Default)]
pub struct IdRegistry {
    used: HashSet<String>,
    sequence: u64,
}

impl IdRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id for a node
    pub fn allocate_node(&mut self) -> NodeId {
        NodeId(self.claim(
            |rng| format!("node-{}", hex_fragment(rng, 4)),
            |n| format!("node-{n:05x}"),
        ))
    }

    /// Allocate an id for an edge
    pub fn allocate_edge(&mut self) -> EdgeId {
        EdgeId(self.claim(
            |rng| format!("edge-{}", hex_fragment(rng, 4)),
            |n| format!("edge-{n:05x}"),
        ))
    }

    /// Allocate an id for a parameter owned by `node`
    pub fn allocate_parameter(
        &mut self,
        node: &NodeId,
        direction: Direction,
        data_type: DataType,
    ) -> ParameterId {
        let type_digit = data_type.nibble();
        let parity = match direction {
            Direction::Input => 0,
            Direction::Output => 1,
        };
        ParameterId(self.claim(
            |rng| {
                let direction_digit = rng.gen_range(0..8u8) * 2 + parity;
                format!(
                    "{node}-{direction_digit:x}{type_digit:x}{}",
                    hex_fragment(rng, 2)
                )
            },
            |n| format!("{node}-{parity:x}{type_digit:x}{n:03x}"),
        ))
    }

    /// Whether `id` has been issued by this registry
    pub fn contains(&self, id: &str) -> bool {
        self.used.contains(id)
    }

    /// Number of ids issued so far
    pub fn len(&self) -> usize {
        self.used.len()
    }

    /// Whether no ids have been issued
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    /// Forget every issued id
    pub fn reset(&mut self) {
        self.used.clear();
        self.sequence = 0;
    }

    fn claim(
        &mut self,
        mut random: impl FnMut(&mut rand::rngs::ThreadRng) -> String,
        sequential: impl Fn(u64) -> String,
    ) -> String {
        let mut rng = rand::thread_rng();
        for _ in 0..RANDOM_ATTEMPTS {
            let id = random(&mut rng);
            if self.used.insert(id.clone()) {
                return id;
            }
        }

        // Each sequence number is issued once, so this ends on the first
        // number not already taken
        loop {
            let id = sequential(self.sequence);
            self.sequence += 1;
            if self.used.insert(id.clone()) {
                return id;
            }
        }
    }
}

fn hex_fragment(rng: &mut impl Rng, digits: u32) -> String {
    let value: u32 = rng.gen_range(0..1u32 << (digits * 4));
    format!("{value:0width$x}", width = digits as usize)
}
