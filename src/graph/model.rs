use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};
use tracing::{debug, warn};

use crate::util::stable_pair;

use super::{Edge, EdgeSpec, GraphError, Node, NodeId, NodeIndex, NodeSpec};

pub const UNKNOWN_NAME: &str = "unknown";

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum InitialLayout {
    #[default]
    Origin,
    /// A ring of radius `sqrt(n) * spread`, jittered by a hash of the node id
    /// so reloads of the same data start from the same picture.
    Scatter { spread: f32 },
}

impl InitialLayout {
    fn position(self, index: usize, count: usize, id: &NodeId) -> Vec2 {
        match self {
            Self::Origin => Vec2::ZERO,
            Self::Scatter { spread } => {
                let base_radius = (count as f32).sqrt() * spread;
                let angle = (index as f32 / count.max(1) as f32) * TAU;
                let (jx, jy) = stable_pair(id.as_str());
                let jitter = vec2(jx, jy) * (spread * 0.45);
                vec2(angle.cos(), angle.sin()) * base_radius + jitter
            }
        }
    }
}

/// Membership is fixed once built. Positions, velocities and pin flags are
/// mutated in place by the simulation that owns the model.
#[derive(Clone, Debug)]
pub struct GraphModel {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index_by_id: HashMap<NodeId, usize>,
    names: HashMap<NodeId, String>,
}

impl GraphModel {
    pub fn build(
        nodes: impl IntoIterator<Item = NodeSpec>,
        edges: impl IntoIterator<Item = EdgeSpec>,
        names: HashMap<NodeId, String>,
    ) -> Result<Self, GraphError> {
        Self::build_with_layout(nodes, edges, names, InitialLayout::Origin)
    }

    pub fn build_with_layout(
        nodes: impl IntoIterator<Item = NodeSpec>,
        edges: impl IntoIterator<Item = EdgeSpec>,
        names: HashMap<NodeId, String>,
        layout: InitialLayout,
    ) -> Result<Self, GraphError> {
        let specs = nodes.into_iter().collect::<Vec<_>>();
        let count = specs.len();

        let mut index_by_id = HashMap::with_capacity(count);
        let mut built = Vec::with_capacity(count);
        for (index, spec) in specs.into_iter().enumerate() {
            match index_by_id.entry(spec.id.clone()) {
                Entry::Occupied(_) => return Err(GraphError::DuplicateNodeId(spec.id)),
                Entry::Vacant(slot) => {
                    slot.insert(index);
                }
            }

            let position = spec
                .position
                .unwrap_or_else(|| layout.position(index, count, &spec.id));
            built.push(Node::new(spec.id, position));
        }

        let mut resolved = Vec::new();
        for (edge_index, spec) in edges.into_iter().enumerate() {
            for index in [spec.source, spec.target] {
                if index >= count {
                    return Err(GraphError::IndexOutOfRange {
                        edge: edge_index,
                        index,
                        len: count,
                    });
                }
            }

            match spec.similarity {
                Some(value) if value.is_finite() && value > 0.0 => {}
                Some(f32::INFINITY) => warn!(
                    edge = edge_index,
                    "infinite similarity; the edge will use the shortest target distance"
                ),
                similarity => warn!(
                    edge = edge_index,
                    ?similarity,
                    "degenerate similarity; the edge will use the longest target distance"
                ),
            }

            resolved.push(Edge::new(
                NodeIndex::new(spec.source),
                NodeIndex::new(spec.target),
                spec.similarity,
            ));
        }

        debug!(
            nodes = built.len(),
            edges = resolved.len(),
            names = names.len(),
            "graph model built"
        );

        Ok(Self {
            nodes: built,
            edges: resolved,
            index_by_id,
            names,
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.get()]
    }

    pub fn source(&self, edge: &Edge) -> &Node {
        self.node(edge.source())
    }

    pub fn target(&self, edge: &Edge) -> &Node {
        self.node(edge.target())
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.index_by_id.get(id).copied().map(NodeIndex::new)
    }

    pub fn node_by_id(&self, id: &str) -> Option<&Node> {
        self.index_of(id).map(|index| self.node(index))
    }

    pub fn lookup_name(&self, id: &str) -> &str {
        self.names.get(id).map(String::as_str).unwrap_or(UNKNOWN_NAME)
    }

    pub fn has_name(&self, id: &str) -> bool {
        self.names.contains_key(id)
    }

    pub fn pinned_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.fixed).count()
    }
}
