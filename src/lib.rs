//! Compressed, immutable adjacency lists for large in-memory graphs
//!
//! Per-node target lists are sorted, optionally aggregated, delta encoded
//! and written as variable-length integers into a paged byte arena.
//! Cursors decode them in blocks for ordered traversal, and a sliced
//! index locates the raw bytes of any node without decoding.

pub mod compression;
pub mod config;
pub mod data;
pub mod error;
pub mod graph;
pub mod report;
pub mod storage;

pub use compression::{compress_all, AdjacencyListsWithProperties, Aggregation, CompressorBlueprint, StagedAdjacency};
pub use config::Config;
pub use error::{AdjacencyError, Result};
pub use graph::{AdjacencyCursor, CompressedAdjacencyList, PageSlice, PropertyList, Seek, SlicedAdjacencyList};
