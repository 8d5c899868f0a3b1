// SPDX-License-Identifier: MIT OR Apache-2.0
//! Constant value node.

use super::{Inputs, NodeError, Processor};
use crate::parameter::ParameterValue;

/// Emits its `Value` input unchanged every frame
#[derive(Debug, Default)]
pub struct Value;

impl Processor for Value {
    async fn frame(&mut self, inputs: Inputs<'_>) -> Result<ParameterValue, NodeError> {
        inputs.get("Value").cloned()
    }
}
