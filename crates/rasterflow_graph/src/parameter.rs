// SPDX-License-Identifier: MIT OR Apache-2.0
//! Parameter definitions for node inputs/outputs.

use crate::id::ParameterId;
use crate::raster::Raster;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Parameter direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Input parameter
    Input,
    /// Output parameter
    Output,
}

/// Data type that can flow through parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Text value, also used for enumerated selections
    Text,
    /// Boolean value
    Boolean,
    /// Floating point value
    Number,
    /// 2D vector
    Vector2,
    /// RGBA pixel buffer
    Raster,
    /// List of values
    Array,
    /// No value
    Null,
}

impl DataType {
    /// Nibble used when encoding the type into a parameter id
    pub fn nibble(self) -> u8 {
        match self {
            Self::Text => 0x0,
            Self::Boolean => 0x1,
            Self::Vector2 => 0x2,
            Self::Number => 0x3,
            Self::Raster => 0x4,
            Self::Array => 0x5,
            Self::Null => 0xf,
        }
    }

    /// Inverse of [`DataType::nibble`]
    pub fn from_nibble(nibble: u8) -> Option<Self> {
        match nibble {
            0x0 => Some(Self::Text),
            0x1 => Some(Self::Boolean),
            0x2 => Some(Self::Vector2),
            0x3 => Some(Self::Number),
            0x4 => Some(Self::Raster),
            0x5 => Some(Self::Array),
            0xf => Some(Self::Null),
            _ => None,
        }
    }

    /// Check if a value of this type may flow into a parameter of `other`.
    ///
    /// `Null` is compatible with everything.
    pub fn can_connect_to(self, other: DataType) -> bool {
        self == other || self == Self::Null || other == Self::Null
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Vector2 => "2d-vector",
            Self::Raster => "raster",
            Self::Array => "array",
            Self::Null => "null",
        };
        f.write_str(name)
    }
}

/// 2D vector, serialised as `{x, y}`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    /// Horizontal component
    pub x: f64,
    /// Vertical component
    pub y: f64,
}

impl Vector2 {
    /// Create a vector
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Value that can be stored in a parameter
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ParameterValue {
    /// No value
    #[default]
    Null,
    /// Text
    Text(String),
    /// Boolean
    Boolean(bool),
    /// Number
    Number(f64),
    /// 2D vector
    Vector2(Vector2),
    /// Shared pixel buffer
    Raster(Arc<Raster>),
    /// List of values
    Array(Vec<ParameterValue>),
}

impl ParameterValue {
    /// Get the data type for this value
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Null => DataType::Null,
            Self::Text(_) => DataType::Text,
            Self::Boolean(_) => DataType::Boolean,
            Self::Number(_) => DataType::Number,
            Self::Vector2(_) => DataType::Vector2,
            Self::Raster(_) => DataType::Raster,
            Self::Array(_) => DataType::Array,
        }
    }

    /// Whether this is [`ParameterValue::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Text content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Boolean content, if this is a boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric content, if this is a number value
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Raster content, if this is a raster value
    pub fn as_raster(&self) -> Option<&Arc<Raster>> {
        match self {
            Self::Raster(raster) => Some(raster),
            _ => None,
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Raster> for ParameterValue {
    fn from(value: Raster) -> Self {
        Self::Raster(Arc::new(value))
    }
}

// Rasters do not round-trip through serialisation and are written as none.
impl Serialize for ParameterValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null | Self::Raster(_) => serializer.serialize_none(),
            Self::Text(text) => serializer.serialize_str(text),
            Self::Boolean(value) => serializer.serialize_bool(*value),
            Self::Number(value) => serializer.serialize_f64(*value),
            Self::Vector2(vector) => vector.serialize(serializer),
            Self::Array(items) => serializer.collect_seq(items),
        }
    }
}

/// Static description of a parameter, instantiated per node
#[derive(Debug, Clone)]
pub struct ParameterDef {
    /// Parameter name
    pub name: &'static str,
    /// Data type
    pub data_type: DataType,
    /// Direction
    pub direction: Direction,
    /// Initial value
    pub default: ParameterValue,
}

impl ParameterDef {
    /// Define an input parameter with an initial value
    pub fn input(name: &'static str, data_type: DataType, default: impl Into<ParameterValue>) -> Self {
        Self {
            name,
            data_type,
            direction: Direction::Input,
            default: default.into(),
        }
    }

    /// Define an input parameter that starts out null
    pub fn empty_input(name: &'static str, data_type: DataType) -> Self {
        Self::input(name, data_type, ParameterValue::Null)
    }

    /// Define an output parameter
    pub fn output(name: &'static str, data_type: DataType) -> Self {
        Self {
            name,
            data_type,
            direction: Direction::Output,
            default: ParameterValue::Null,
        }
    }
}

/// A named, typed, directional slot on a node
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Unique parameter ID
    pub id: ParameterId,
    /// Parameter name
    pub name: String,
    /// Data type
    pub data_type: DataType,
    /// Parameter direction
    pub direction: Direction,
    /// Current value
    pub value: ParameterValue,
}

impl Parameter {
    /// Instantiate a definition under `id`
    pub fn from_def(id: ParameterId, def: &ParameterDef) -> Self {
        Self {
            id,
            name: def.name.to_string(),
            data_type: def.data_type,
            direction: def.direction,
            value: def.default.clone(),
        }
    }

    /// Whether this is an input parameter
    pub fn is_input(&self) -> bool {
        self.direction == Direction::Input
    }

    /// Whether this is an output parameter
    pub fn is_output(&self) -> bool {
        self.direction == Direction::Output
    }
}

/// Error for a selection value outside its enumerated set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognised selection: {0}")]
pub struct UnknownSelection(pub String);
