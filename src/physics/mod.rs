mod forces;
mod quadtree;

use eframe::egui::{Vec2, vec2};
use thiserror::Error;
use tracing::{debug, trace};

use crate::graph::{GraphModel, Node, NodeId, NodeIndex};
use forces::{ChargeParams, accumulate_repulsion_for_node, accumulate_springs};
pub use forces::{
    CHARGE_SOFTENING, MAX_SIMILARITY, MIN_SIMILARITY, effective_similarity, repulsion_force, spring_force,
    target_distance,
};
use quadtree::QuadNode;

const BARNES_HUT_THETA: f32 = 0.72;
const REST_SPEED_SQ: f32 = 0.005 * 0.005;
const REST_FORCE_SQ: f32 = 0.005 * 0.005;

#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("no node with id `{0}` in the simulation")]
    UnknownNode(NodeId),
    #[error("invalid value {value} for `{name}`: {reason}")]
    InvalidOption {
        name: &'static str,
        value: f32,
        reason: &'static str,
    },
    #[error("position ({x}, {y}) for node `{id}` is not finite")]
    NonFinitePosition { id: NodeId, x: f32, y: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationConfig {
    /// Scale of the inverse-square charge law; negative values repel.
    pub charge_strength: f32,
    /// Pairs farther apart than this exert no charge on each other.
    pub charge_cutoff_distance: f32,
    pub distance_scale: f32,
    /// Fraction of velocity kept per tick, in `[0, 1)`.
    pub damping: f32,
    pub viewport_size: Option<Vec2>,
    /// Pull towards the origin, proportional to distance from it.
    pub gravity: f32,
    pub spring_strength: f32,
    pub max_speed: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            charge_strength: -1000.0,
            charge_cutoff_distance: 600.0,
            distance_scale: 75.0,
            damping: 0.9,
            viewport_size: None,
            gravity: 0.01,
            spring_strength: 0.05,
            max_speed: 40.0,
        }
    }
}

/// `None` keeps the current value; `viewport_size: Some(None)` removes
/// containment.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimulationOptions {
    pub charge_strength: Option<f32>,
    pub charge_cutoff_distance: Option<f32>,
    pub distance_scale: Option<f32>,
    pub damping: Option<f32>,
    pub viewport_size: Option<Option<Vec2>>,
    pub gravity: Option<f32>,
    pub spring_strength: Option<f32>,
    pub max_speed: Option<f32>,
}

impl SimulationOptions {
    pub fn from_config(config: SimulationConfig) -> Self {
        Self {
            charge_strength: Some(config.charge_strength),
            charge_cutoff_distance: Some(config.charge_cutoff_distance),
            distance_scale: Some(config.distance_scale),
            damping: Some(config.damping),
            viewport_size: Some(config.viewport_size),
            gravity: Some(config.gravity),
            spring_strength: Some(config.spring_strength),
            max_speed: Some(config.max_speed),
        }
    }
}

fn check(
    name: &'static str,
    value: f32,
    valid: bool,
    reason: &'static str,
) -> Result<f32, SimulationError> {
    if valid {
        Ok(value)
    } else {
        Err(SimulationError::InvalidOption {
            name,
            value,
            reason,
        })
    }
}

impl SimulationConfig {
    fn with_options(self, options: &SimulationOptions) -> Result<Self, SimulationError> {
        let mut next = self;

        if let Some(value) = options.charge_strength {
            next.charge_strength =
                check("charge_strength", value, value.is_finite(), "must be finite")?;
        }
        if let Some(value) = options.charge_cutoff_distance {
            next.charge_cutoff_distance = check(
                "charge_cutoff_distance",
                value,
                value > 0.0,
                "must be positive",
            )?;
        }
        if let Some(value) = options.distance_scale {
            next.distance_scale = check(
                "distance_scale",
                value,
                value.is_finite() && value > 0.0,
                "must be finite and positive",
            )?;
        }
        if let Some(value) = options.damping {
            next.damping = check(
                "damping",
                value,
                (0.0..1.0).contains(&value),
                "must be in [0, 1)",
            )?;
        }
        if let Some(viewport) = options.viewport_size {
            if let Some(size) = viewport {
                check(
                    "viewport_size.x",
                    size.x,
                    size.x.is_finite() && size.x > 0.0,
                    "must be finite and positive",
                )?;
                check(
                    "viewport_size.y",
                    size.y,
                    size.y.is_finite() && size.y > 0.0,
                    "must be finite and positive",
                )?;
            }
            next.viewport_size = viewport;
        }
        if let Some(value) = options.gravity {
            next.gravity = check(
                "gravity",
                value,
                value.is_finite() && value >= 0.0,
                "must be finite and non-negative",
            )?;
        }
        if let Some(value) = options.spring_strength {
            next.spring_strength = check(
                "spring_strength",
                value,
                value.is_finite() && value >= 0.0,
                "must be finite and non-negative",
            )?;
        }
        if let Some(value) = options.max_speed {
            next.max_speed = check(
                "max_speed",
                value,
                value.is_finite() && value > 0.0,
                "must be finite and positive",
            )?;
        }

        Ok(next)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    pub graph: &'a GraphModel,
    pub tick: u64,
    pub kinetic_energy: f32,
}

#[derive(Default)]
struct PhysicsScratch {
    forces: Vec<Vec2>,
    positions: Vec<Vec2>,
}

pub struct ForceSimulation {
    graph: GraphModel,
    config: SimulationConfig,
    scratch: PhysicsScratch,
    tick: u64,
    kinetic_energy: f32,
}

impl ForceSimulation {
    pub fn new(graph: GraphModel) -> Self {
        Self {
            graph,
            config: SimulationConfig::default(),
            scratch: PhysicsScratch::default(),
            tick: 0,
            kinetic_energy: 0.0,
        }
    }

    pub fn graph(&self) -> &GraphModel {
        &self.graph
    }

    pub fn into_graph(self) -> GraphModel {
        self.graph
    }

    pub fn config(&self) -> SimulationConfig {
        self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn kinetic_energy(&self) -> f32 {
        self.kinetic_energy
    }

    pub fn frame(&self) -> Frame<'_> {
        Frame {
            graph: &self.graph,
            tick: self.tick,
            kinetic_energy: self.kinetic_energy,
        }
    }

    /// Validates every provided option before applying any of them.
    pub fn configure(&mut self, options: SimulationOptions) -> Result<(), SimulationError> {
        self.config = self.config.with_options(&options)?;
        debug!(config = ?self.config, "simulation configured");
        Ok(())
    }

    fn resolve(&self, id: &str) -> Result<NodeIndex, SimulationError> {
        self.graph
            .index_of(id)
            .ok_or_else(|| SimulationError::UnknownNode(NodeId::from(id)))
    }

    fn node_mut(&mut self, index: NodeIndex) -> &mut Node {
        &mut self.graph.nodes_mut()[index.get()]
    }

    pub fn set_fixed(&mut self, id: &str, fixed: bool) -> Result<(), SimulationError> {
        let index = self.resolve(id)?;
        let node = self.node_mut(index);
        node.fixed = fixed;
        if fixed {
            node.set_velocity(Vec2::ZERO);
        }
        debug!(node = id, fixed, "pin state changed");
        Ok(())
    }

    /// Explicit placement, e.g. while dragging. Works for pinned nodes too and
    /// is not subject to viewport containment.
    pub fn set_position(&mut self, id: &str, x: f32, y: f32) -> Result<(), SimulationError> {
        let index = self.resolve(id)?;
        if !x.is_finite() || !y.is_finite() {
            return Err(SimulationError::NonFinitePosition {
                id: NodeId::from(id),
                x,
                y,
            });
        }

        let node = self.node_mut(index);
        node.set_position(vec2(x, y));
        node.set_velocity(Vec2::ZERO);
        Ok(())
    }

    pub fn release_all(&mut self) -> usize {
        let mut released = 0usize;
        for node in self.graph.nodes_mut() {
            if node.fixed {
                node.fixed = false;
                released += 1;
            }
        }
        debug!(released, "released pinned nodes");
        released
    }

    pub fn step(&mut self) -> Frame<'_> {
        let node_count = self.graph.node_count();
        if node_count == 0 {
            return self.frame();
        }

        let config = self.config;
        let scratch = &mut self.scratch;
        scratch.forces.clear();
        scratch.forces.resize(node_count, Vec2::ZERO);
        scratch.positions.clear();
        scratch
            .positions
            .extend(self.graph.nodes().iter().map(Node::position));

        let forces = &mut scratch.forces;
        let positions = &scratch.positions;

        if node_count > 1
            && config.charge_strength != 0.0
            && let Some(quadtree) = QuadNode::build(positions)
        {
            let params = ChargeParams {
                strength: config.charge_strength,
                cutoff_distance: config.charge_cutoff_distance,
                theta: BARNES_HUT_THETA,
            };
            for (index, force) in forces.iter_mut().enumerate() {
                accumulate_repulsion_for_node(&quadtree, index, positions, params, force);
            }
        }

        accumulate_springs(
            positions,
            self.graph.edges(),
            config.distance_scale,
            config.spring_strength,
            forces,
        );

        if config.gravity > 0.0 {
            for (force, position) in forces.iter_mut().zip(positions) {
                *force -= *position * config.gravity;
            }
        }

        let max_speed_sq = config.max_speed * config.max_speed;
        let half_viewport = config.viewport_size.map(|size| size * 0.5);
        let mut kinetic_energy = 0.0;
        for (node, force) in self.graph.nodes_mut().iter_mut().zip(forces.iter()) {
            if node.fixed {
                node.set_velocity(Vec2::ZERO);
                continue;
            }

            let mut velocity = (node.velocity() + *force) * config.damping;
            if !velocity.is_finite() {
                velocity = Vec2::ZERO;
            }
            let speed_sq = velocity.length_sq();
            if speed_sq > max_speed_sq {
                velocity *= config.max_speed / speed_sq.sqrt();
            }
            if velocity.length_sq() < REST_SPEED_SQ && force.length_sq() < REST_FORCE_SQ {
                velocity = Vec2::ZERO;
            }

            let mut position = node.position() + velocity;
            if let Some(half) = half_viewport {
                contain_axis(&mut position.x, &mut velocity.x, half.x);
                contain_axis(&mut position.y, &mut velocity.y, half.y);
            }

            node.set_position(position);
            node.set_velocity(velocity);
            kinetic_energy += 0.5 * velocity.length_sq();
        }

        self.tick += 1;
        self.kinetic_energy = kinetic_energy;
        trace!(tick = self.tick, kinetic_energy, "simulation step");
        self.frame()
    }
}

// Zeroes the velocity component that pushed the coordinate out.
fn contain_axis(value: &mut f32, velocity: &mut f32, half: f32) {
    if *value < -half {
        *value = -half;
        *velocity = 0.0;
    } else if *value > half {
        *value = half;
        *velocity = 0.0;
    }
}
