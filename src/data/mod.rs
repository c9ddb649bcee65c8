//! Loading raw relationships into per-node staging buffers

pub mod edges;

pub use edges::{load_edge_list, parse_edge_list, EdgeList};
