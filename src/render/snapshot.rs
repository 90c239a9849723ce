use serde::Serialize;

use crate::graph::NodeId;
use crate::physics::Frame;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SnapshotNode {
    pub id: NodeId,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub fixed: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LayoutSnapshot {
    pub tick: u64,
    pub kinetic_energy: f32,
    pub nodes: Vec<SnapshotNode>,
}

impl LayoutSnapshot {
    pub fn from_frame(frame: &Frame<'_>) -> Self {
        let graph = frame.graph;
        let nodes = graph
            .nodes()
            .iter()
            .map(|node| SnapshotNode {
                id: node.id.clone(),
                name: graph.lookup_name(node.id.as_str()).to_owned(),
                x: node.x,
                y: node.y,
                fixed: node.fixed,
            })
            .collect();

        Self {
            tick: frame.tick,
            kinetic_energy: frame.kinetic_energy,
            nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;
    use crate::graph::{GraphModel, NodeSpec};
    use crate::physics::ForceSimulation;

    #[test]
    fn snapshot_serializes_ids_names_and_positions() {
        let graph = GraphModel::build(
            [NodeSpec::new("a").at(1.5, -2.0), NodeSpec::new("b").at(4.0, 0.0)],
            Vec::new(),
            HashMap::from([(NodeId::from("a"), "Alpha".to_owned())]),
        )
        .unwrap();
        let mut simulation = ForceSimulation::new(graph);
        simulation.set_fixed("a", true).unwrap();

        let snapshot = LayoutSnapshot::from_frame(&simulation.frame());
        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value["tick"], json!(0));
        assert_eq!(
            value["nodes"][0],
            json!({"id": "a", "name": "Alpha", "x": 1.5, "y": -2.0, "fixed": true})
        );
        assert_eq!(value["nodes"][1]["name"], json!("unknown"));
    }
}
