//! Pure mapping from graph geometry to draw commands.
//!
//! Nothing here touches a canvas: [`draw_list`] describes what to draw and the
//! host paints it however it likes.

mod snapshot;

use std::f32::consts::FRAC_PI_2;

use eframe::egui::Vec2;

use crate::graph::{GraphModel, NodeId};
use crate::physics::Frame;
use crate::sim_loop::RenderAdapter;
use crate::util::format_similarity;

pub use snapshot::{LayoutSnapshot, SnapshotNode};

#[derive(Clone, Debug, PartialEq)]
pub struct NodeMarker {
    pub id: NodeId,
    pub label: String,
    pub title: String,
    pub position: Vec2,
    pub fixed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeLine {
    pub from: Vec2,
    pub to: Vec2,
    pub label: String,
    pub label_position: Vec2,
    /// Radians, kept within `(-pi/2, pi/2]` so the label never reads upside
    /// down.
    pub label_angle: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawList {
    pub tick: u64,
    pub nodes: Vec<NodeMarker>,
    pub edges: Vec<EdgeLine>,
}

pub fn edge_label_angle(from: Vec2, to: Vec2) -> f32 {
    let delta = from - to;
    if delta.x.abs() <= f32::EPSILON {
        return if delta.y.abs() <= f32::EPSILON {
            0.0
        } else {
            FRAC_PI_2
        };
    }
    (delta.y / delta.x).atan()
}

pub fn draw_list(graph: &GraphModel) -> DrawList {
    let nodes = graph
        .nodes()
        .iter()
        .map(|node| NodeMarker {
            id: node.id.clone(),
            label: node.id.to_string(),
            title: graph.lookup_name(node.id.as_str()).to_owned(),
            position: node.position(),
            fixed: node.fixed,
        })
        .collect();

    let edges = graph
        .edges()
        .iter()
        .map(|edge| {
            let from = graph.source(edge).position();
            let to = graph.target(edge).position();
            EdgeLine {
                from,
                to,
                label: format_similarity(edge.similarity()),
                label_position: (from + to) * 0.5,
                label_angle: edge_label_angle(from, to),
            }
        })
        .collect();

    DrawList {
        tick: 0,
        nodes,
        edges,
    }
}

#[derive(Default)]
pub struct DrawListBuffer {
    latest: Option<DrawList>,
    frames: u64,
}

impl DrawListBuffer {
    pub fn latest(&self) -> Option<&DrawList> {
        self.latest.as_ref()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl RenderAdapter for DrawListBuffer {
    fn render(&mut self, frame: &Frame<'_>) {
        let mut list = draw_list(frame.graph);
        list.tick = frame.tick;
        self.latest = Some(list);
        self.frames += 1;
    }
}
