use std::collections::HashMap;

use anyhow::{Context, Result};
use eframe::egui::vec2;
use serde::Deserialize;
use serde_json::Number;
use tracing::warn;

use crate::graph::{EdgeSpec, GraphError, GraphModel, InitialLayout, NodeId, NodeSpec};

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(Number),
}

impl From<RawId> for NodeId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(text) => NodeId::new(text),
            RawId::Number(number) => NodeId::new(number_text(&number)),
        }
    }
}

// `1.0` and `1` name the same node; other floats keep their JSON text.
fn number_text(number: &Number) -> String {
    const EXACT_LIMIT: f64 = 9_007_199_254_740_992.0;

    match number.as_f64() {
        Some(value)
            if number.is_f64() && value.fract() == 0.0 && value.abs() <= EXACT_LIMIT =>
        {
            format!("{}", value as i64)
        }
        _ => number.to_string(),
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum RawSimilarity {
    Number(f64),
    Text(String),
}

impl RawSimilarity {
    fn value(&self) -> Option<f32> {
        match self {
            Self::Number(value) => Some(*value as f32),
            Self::Text(text) => text.trim().parse::<f32>().ok(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawNode {
    id: RawId,
    #[serde(default)]
    x: Option<f32>,
    #[serde(default)]
    y: Option<f32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawLink {
    #[serde(default)]
    similarity: Option<RawSimilarity>,
    source: usize,
    target: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawGraph {
    nns: Vec<RawNode>,
    lls: Vec<RawLink>,
    #[serde(default)]
    id_names: HashMap<String, Option<String>>,
}

impl RawGraph {
    pub fn node_count(&self) -> usize {
        self.nns.len()
    }

    pub fn link_count(&self) -> usize {
        self.lls.len()
    }

    pub fn into_model(self, layout: InitialLayout) -> Result<GraphModel, GraphError> {
        let nodes = self.nns.into_iter().map(|raw| {
            let mut spec = NodeSpec::new(NodeId::from(raw.id));
            if let (Some(x), Some(y)) = (raw.x, raw.y) {
                spec.position = Some(vec2(x, y));
            }
            spec
        });

        let edges = self.lls.into_iter().enumerate().map(|(index, raw)| {
            let similarity = raw.similarity.as_ref().and_then(RawSimilarity::value);
            if let Some(RawSimilarity::Text(text)) = &raw.similarity
                && similarity.is_none()
            {
                warn!(link = index, value = %text, "similarity is not a number");
            }
            EdgeSpec::new(raw.source, raw.target, similarity)
        });

        let mut names = HashMap::with_capacity(self.id_names.len());
        for (id, name) in self.id_names {
            match name {
                Some(name) => {
                    names.insert(NodeId::new(id), name);
                }
                None => warn!(node = %id, "display name is null; using the placeholder"),
            }
        }

        GraphModel::build_with_layout(nodes, edges, names, layout)
    }
}

pub fn parse_payload(raw: &str) -> Result<RawGraph> {
    serde_json::from_str(raw).context("invalid graph payload JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::UNKNOWN_NAME;

    const SAMPLE: &str = r#"{
        "nns": [{"id": "a"}, {"id": "b"}, {"id": "c"}],
        "lls": [
            {"similarity": "0.5", "source": 0, "target": 1},
            {"similarity": 0.2, "source": 0, "target": 2}
        ],
        "id_names": {"a": "Alpha"}
    }"#;

    #[test]
    fn parses_string_and_numeric_similarities() {
        let raw = parse_payload(SAMPLE).unwrap();
        assert_eq!(raw.node_count(), 3);
        assert_eq!(raw.link_count(), 2);

        let graph = raw.into_model(InitialLayout::Origin).unwrap();
        assert_eq!(graph.edges()[0].similarity(), Some(0.5));
        assert_eq!(graph.edges()[1].similarity(), Some(0.2));
        assert_eq!(graph.lookup_name("a"), "Alpha");
        assert_eq!(graph.lookup_name("c"), UNKNOWN_NAME);
    }

    #[test]
    fn numeric_ids_share_keys_with_the_name_table() {
        let raw = parse_payload(
            r#"{"nns": [{"id": 17}, {"id": "x"}], "lls": [], "id_names": {"17": "Seventeen"}}"#,
        )
        .unwrap();
        let graph = raw.into_model(InitialLayout::Origin).unwrap();

        assert_eq!(graph.nodes()[0].id.as_str(), "17");
        assert_eq!(graph.lookup_name("17"), "Seventeen");
    }

    #[test]
    fn whole_float_ids_match_integer_keys() {
        let raw = parse_payload(
            r#"{
                "nns": [{"id": 1.0}, {"id": 2.5}, {"id": -3.0}],
                "lls": [],
                "id_names": {"1": "One", "2.5": "Two and a half", "-3": "Minus three"}
            }"#,
        )
        .unwrap();
        let graph = raw.into_model(InitialLayout::Origin).unwrap();

        assert_eq!(graph.nodes()[0].id.as_str(), "1");
        assert_eq!(graph.lookup_name("1"), "One");
        assert_eq!(graph.lookup_name("2.5"), "Two and a half");
        assert_eq!(graph.lookup_name("-3"), "Minus three");
    }

    #[test]
    fn missing_or_garbled_similarity_becomes_none() {
        let raw = parse_payload(
            r#"{
                "nns": [{"id": "a"}, {"id": "b"}],
                "lls": [
                    {"source": 0, "target": 1},
                    {"similarity": "high", "source": 1, "target": 0},
                    {"similarity": null, "source": 0, "target": 1}
                ]
            }"#,
        )
        .unwrap();
        let graph = raw.into_model(InitialLayout::Origin).unwrap();

        assert!(graph.edges().iter().all(|edge| edge.similarity().is_none()));
    }

    #[test]
    fn null_names_are_dropped() {
        let raw = parse_payload(
            r#"{"nns": [{"id": "a"}], "lls": [], "id_names": {"a": null}}"#,
        )
        .unwrap();
        let graph = raw.into_model(InitialLayout::Origin).unwrap();

        assert!(!graph.has_name("a"));
        assert_eq!(graph.lookup_name("a"), UNKNOWN_NAME);
    }

    #[test]
    fn payload_positions_seed_the_layout() {
        let raw = parse_payload(
            r#"{"nns": [{"id": "a", "x": 12.0, "y": 3.5}, {"id": "b", "x": 1.0}], "lls": []}"#,
        )
        .unwrap();
        let graph = raw.into_model(InitialLayout::Origin).unwrap();

        assert_eq!(graph.nodes()[0].position(), vec2(12.0, 3.5));
        assert_eq!(graph.nodes()[1].position(), vec2(0.0, 0.0));
    }

    #[test]
    fn out_of_range_link_fails_the_build() {
        let raw = parse_payload(
            r#"{"nns": [{"id": "a"}, {"id": "b"}, {"id": "c"}],
                "lls": [{"similarity": 0.5, "source": 5, "target": 0}]}"#,
        )
        .unwrap();

        assert!(matches!(
            raw.into_model(InitialLayout::Origin),
            Err(GraphError::IndexOutOfRange { index: 5, len: 3, .. })
        ));
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        assert!(parse_payload("not json").is_err());
        assert!(parse_payload(r#"{"lls": []}"#).is_err());
        assert!(parse_payload(r#"{"nns": [{"name": "no id"}], "lls": []}"#).is_err());
        assert!(parse_payload(r#"{"nns": [], "lls": [{"source": -1, "target": 0}]}"#).is_err());
    }
}
