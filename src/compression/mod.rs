//! Delta-varint compression of per-node target lists

pub mod aggregation;
pub mod compressor;
pub mod delta;
pub mod staging;
pub mod varlong;

pub use aggregation::Aggregation;
pub use compressor::{compress_all, AdjacencyListsWithProperties, CompressorBlueprint, DeltaVarLongCompressor};
pub use staging::StagedAdjacency;
