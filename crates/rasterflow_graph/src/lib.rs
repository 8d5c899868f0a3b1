// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node-based raster dataflow engine.
//!
//! A [`Graph`] holds nodes with typed input and output parameters, linked by
//! edges from outputs to inputs. The [`Engine`] sets every node up once in
//! processing order, then runs throttled frame passes in which each node
//! turns its inputs into one result that is written along its edges.
//!
//! ## Architecture
//!
//! - Identifier registry issuing self-describing string ids
//! - Graph editing with connection validation and cycle detection
//! - Setup/frame lifecycle driven by a tick source
//! - Image kernels: cache, blend, mottle, resize and render

pub mod assets;
pub mod description;
pub mod edge;
pub mod engine;
pub mod graph;
pub mod id;
pub mod node;
pub mod nodes;
pub mod parameter;
pub mod raster;
pub mod scheduler;
pub mod surface;

pub use assets::{AssetResolver, BuiltinAssets, BuiltinImage};
pub use description::GraphDescription;
pub use edge::Edge;
pub use engine::{Engine, EngineConfig, EngineError, EngineState};
pub use graph::{CycleError, Graph, GraphError};
pub use id::{EdgeId, IdRegistry, NodeId, ParameterId};
pub use node::{Node, NodeFactory, NodeType, DEFAULT_CANVAS};
pub use nodes::{BlendMode, NodeError};
pub use parameter::{DataType, Direction, Parameter, ParameterValue, Vector2};
pub use raster::{FitPolicy, Raster};
pub use scheduler::{IntervalDriver, ScriptedDriver, StopHandle, TickDriver};
pub use surface::{SurfaceHandle, SurfaceRegistry, SurfaceResolver};
