mod load;
mod parse;

pub use load::{DataSource, PendingGraph, load_graph, spawn_load};
pub use parse::{RawGraph, RawLink, RawNode, parse_payload};
