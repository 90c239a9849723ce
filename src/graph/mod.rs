mod model;
mod types;

use thiserror::Error;

pub use model::{GraphModel, InitialLayout, UNKNOWN_NAME};
pub use types::{Edge, EdgeSpec, Node, NodeId, NodeIndex, NodeSpec};

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("edge {edge} references node index {index}, but only {len} nodes were loaded")]
    IndexOutOfRange { edge: usize, index: usize, len: usize },
    #[error("node id `{0}` appears more than once")]
    DuplicateNodeId(NodeId),
}
