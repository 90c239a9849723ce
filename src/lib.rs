//! Force-directed layout for graphs whose edges carry a similarity weight.
//!
//! A [`GraphModel`](graph::GraphModel) is loaded once, a
//! [`ForceSimulation`](physics::ForceSimulation) moves its nodes so that more
//! similar pairs settle closer together, and a
//! [`SimulationLoop`](sim_loop::SimulationLoop) hands every completed tick to
//! a renderer.

pub mod data;
pub mod graph;
pub mod physics;
pub mod render;
pub mod sim_loop;
mod util;

pub use graph::{GraphError, GraphModel, InitialLayout, NodeId};
pub use physics::{ForceSimulation, Frame, SimulationConfig, SimulationError, SimulationOptions};
pub use sim_loop::{LoopState, RenderAdapter, SimulationLoop};
