use std::borrow::Borrow;
use std::fmt;

use eframe::egui::{Vec2, vec2};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// Only `GraphModel` creates these, after a bounds check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn get(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Excluded from force integration; only explicit placement moves it.
    pub fixed: bool,
}

impl Node {
    pub(crate) fn new(id: NodeId, position: Vec2) -> Self {
        Self {
            id,
            x: position.x,
            y: position.y,
            vx: 0.0,
            vy: 0.0,
            fixed: false,
        }
    }

    pub fn position(&self) -> Vec2 {
        vec2(self.x, self.y)
    }

    pub fn velocity(&self) -> Vec2 {
        vec2(self.vx, self.vy)
    }

    pub(crate) fn set_position(&mut self, position: Vec2) {
        self.x = position.x;
        self.y = position.y;
    }

    pub(crate) fn set_velocity(&mut self, velocity: Vec2) {
        self.vx = velocity.x;
        self.vy = velocity.y;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    source: NodeIndex,
    target: NodeIndex,
    similarity: Option<f32>,
}

impl Edge {
    pub(crate) fn new(source: NodeIndex, target: NodeIndex, similarity: Option<f32>) -> Self {
        Self {
            source,
            target,
            similarity,
        }
    }

    pub fn source(&self) -> NodeIndex {
        self.source
    }

    pub fn target(&self) -> NodeIndex {
        self.target
    }

    pub fn similarity(&self) -> Option<f32> {
        self.similarity
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeSpec {
    pub id: NodeId,
    pub position: Option<Vec2>,
}

impl NodeSpec {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            position: None,
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Some(vec2(x, y));
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeSpec {
    pub source: usize,
    pub target: usize,
    pub similarity: Option<f32>,
}

impl EdgeSpec {
    pub fn new(source: usize, target: usize, similarity: impl Into<Option<f32>>) -> Self {
        Self {
            source,
            target,
            similarity: similarity.into(),
        }
    }
}
