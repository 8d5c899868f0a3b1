// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pipeline engine: node setup, frame passes and the throttled frame loop.

use crate::graph::{CycleError, Graph, GraphError};
use crate::id::NodeId;
use crate::nodes::NodeError;
use crate::parameter::ParameterValue;
use crate::scheduler::{FrameThrottle, StopHandle, TickDriver};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Frame rate the engine runs at unless configured otherwise
pub const DEFAULT_FPS: f64 = 4.0;

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Target frames per second
    pub fps: f64,
}

impl EngineConfig {
    /// Frame rate actually used. Non-positive or non-finite rates fall back
    /// to one frame per second.
    pub fn effective_fps(&self) -> f64 {
        if self.fps.is_finite() && self.fps > 0.0 {
            self.fps
        } else {
            1.0
        }
    }

    /// Minimum spacing between frames in milliseconds
    pub fn interval_ms(&self) -> f64 {
        1000.0 / self.effective_fps()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { fps: DEFAULT_FPS }
    }
}

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Not running
    Stopped,
    /// Running, node setup still pending
    Uninitialised,
    /// Running with every node set up
    Initialised,
}

/// Drives a graph through setup and frame passes
#[derive(Debug)]
pub struct Engine {
    graph: Graph,
    config: EngineConfig,
    state: EngineState,
    /// Cached processing order, dropped whenever the graph may have changed
    order: Option<Arc<[NodeId]>>,
    throttle: FrameThrottle,
    stop: StopHandle,
    frames: u64,
}

impl Engine {
    /// Create a stopped engine over `graph`
    pub fn new(graph: Graph, config: EngineConfig) -> Self {
        Self {
            graph,
            throttle: FrameThrottle::new(config.interval_ms()),
            config,
            state: EngineState::Stopped,
            order: None,
            stop: StopHandle::new(),
            frames: 0,
        }
    }

    /// The graph being run
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Mutable access to the graph.
    ///
    /// The processing order is recomputed and a running engine sets every
    /// node up again before its next frame.
    pub fn graph_mut(&mut self) -> &mut Graph {
        self.order = None;
        if self.state == EngineState::Initialised {
            self.state = EngineState::Uninitialised;
        }
        &mut self.graph
    }

    /// Take the graph back
    pub fn into_graph(self) -> Graph {
        self.graph
    }

    /// Current configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Change the target frame rate
    pub fn set_fps(&mut self, fps: f64) {
        self.config.fps = fps;
        self.throttle.set_interval_ms(self.config.interval_ms());
    }

    /// Lifecycle state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Whether the engine has been started and not stopped since
    pub fn is_running(&self) -> bool {
        self.state != EngineState::Stopped
    }

    /// Number of completed frame passes
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Handle that stops [`Engine::run`] from elsewhere
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Set a node input between frames.
    ///
    /// This does not re-run setup, so values consumed during setup only take
    /// effect after a restart.
    pub fn set_parameter(
        &mut self,
        node_id: &NodeId,
        name: &str,
        value: impl Into<ParameterValue>,
    ) -> Result<ParameterValue, EngineError> {
        Ok(self.graph.set_parameter(node_id, name, value)?)
    }

    /// Processing order of the current graph
    pub fn processing_order(&mut self) -> Result<Vec<NodeId>, EngineError> {
        Ok(self.order()?.to_vec())
    }

    fn order(&mut self) -> Result<Arc<[NodeId]>, EngineError> {
        let order = match self.order.take() {
            Some(order) => order,
            None => self.graph.processing_order()?.into(),
        };
        Ok(self.order.insert(order).clone())
    }

    /// Start running, setting every node up first if needed.
    ///
    /// A setup failure stops the engine and is returned. Stop requests made
    /// through a [`StopHandle`] while the engine is stopped are cleared here;
    /// once running, a request stays pending until the loop honours it.
    pub async fn start(&mut self) -> Result<(), EngineError> {
        if self.state == EngineState::Stopped {
            self.stop.rearm();
            self.throttle.reset();
            self.state = EngineState::Uninitialised;
            tracing::info!("Pipeline started at {} fps", self.config.effective_fps());
        }
        if self.state == EngineState::Uninitialised {
            if let Err(err) = self.setup().await {
                tracing::error!("Pipeline setup failed: {err}");
                self.stop();
                return Err(err);
            }
        }
        Ok(())
    }

    /// Set up every node in processing order, one at a time
    async fn setup(&mut self) -> Result<(), EngineError> {
        let order = self.order()?;
        for node_id in order.iter() {
            let node = self
                .graph
                .node_mut(node_id)
                .ok_or_else(|| GraphError::NodeNotFound(node_id.clone()))?;
            node.setup().await.map_err(|source| EngineError::Setup {
                node: node_id.clone(),
                source,
            })?;
        }

        tracing::debug!("Set up {} nodes", order.len());
        self.state = EngineState::Initialised;
        Ok(())
    }

    /// Run one frame pass: every node in processing order, each result
    /// propagated before the next node runs
    pub async fn run_frame(&mut self) -> Result<(), EngineError> {
        if self.state != EngineState::Initialised {
            return Err(EngineError::NotInitialised);
        }

        let order = self.order()?;
        for node_id in order.iter() {
            let node = self
                .graph
                .node_mut(node_id)
                .ok_or_else(|| GraphError::NodeNotFound(node_id.clone()))?;
            let value = node.frame().await.map_err(|source| EngineError::Frame {
                node: node_id.clone(),
                source,
            })?;
            self.graph.propagate(node_id, &value)?;
        }

        self.frames += 1;
        tracing::trace!("Frame {} complete", self.frames);
        Ok(())
    }

    /// Handle one refresh tick. Returns whether a frame pass ran.
    pub async fn tick(&mut self, timestamp_ms: f64) -> Result<bool, EngineError> {
        if !self.is_running() || self.stop.is_stopped() {
            return Ok(false);
        }
        // The graph was edited since setup
        if self.state == EngineState::Uninitialised {
            self.setup().await?;
        }
        if !self.throttle.ready(timestamp_ms) {
            return Ok(false);
        }

        self.run_frame().await?;
        self.throttle.record(timestamp_ms);
        Ok(true)
    }

    /// Start and run frames off `driver` until stopped, the driver runs out,
    /// or a pass fails. The engine is stopped on return.
    pub async fn run<D: TickDriver>(&mut self, driver: &mut D) -> Result<(), EngineError> {
        self.start().await?;
        let stop = self.stop.clone();

        let result = loop {
            if stop.is_stopped() {
                break Ok(());
            }
            let tick = tokio::select! {
                biased;
                () = stop.stopped() => break Ok(()),
                tick = driver.next_tick() => tick,
            };
            let Some(timestamp_ms) = tick else {
                break Ok(());
            };
            if let Err(err) = self.tick(timestamp_ms).await {
                tracing::error!("Pipeline stopped: {err}");
                break Err(err);
            }
        };

        self.stop();
        result
    }

    /// Set up if needed, run exactly one frame pass, then stop
    pub async fn run_single_frame(&mut self) -> Result<(), EngineError> {
        self.start().await?;
        let result = self.run_frame().await;
        self.stop();
        result
    }

    /// Stop running. The next start sets every node up again.
    pub fn stop(&mut self) {
        self.stop.stop();
        if self.state != EngineState::Stopped {
            tracing::info!("Pipeline stopped after {} frames", self.frames);
        }
        self.state = EngineState::Stopped;
    }
}

/// Error from running the pipeline
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The graph contains a cycle
    #[error("Graph contains a cycle")]
    CycleDetected,

    /// A frame pass was requested before setup
    #[error("Pipeline not initialised")]
    NotInitialised,

    /// Graph lookup or edit failed
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A node failed during setup
    #[error("Setup failed for {node}: {source}")]
    Setup {
        /// Failing node
        node: NodeId,
        /// Cause
        source: NodeError,
    },

    /// A node failed during a frame pass
    #[error("Frame failed for {node}: {source}")]
    Frame {
        /// Failing node
        node: NodeId,
        /// Cause
        source: NodeError,
    },
}

impl From<CycleError> for EngineError {
    fn from(_: CycleError) -> Self {
        Self::CycleDetected
    }
}
