//! Error types for building and querying adjacency lists

use thiserror::Error;

/// Errors raised while configuring or building compressed adjacency lists.
///
/// Lookups that simply find nothing are not errors; cursors report those
/// through [`crate::graph::Seek::Exhausted`].
#[derive(Debug, Error)]
pub enum AdjacencyError {
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("node {node} is out of range for {node_count} nodes")]
    NodeOutOfRange { node: u64, node_count: usize },

    #[error("node {node} has {degree} targets, which does not fit into a 32-bit degree")]
    DegreeOverflow { node: u64, degree: usize },

    #[error("expected {expected} property columns, got {actual}")]
    PropertyCountMismatch { expected: usize, actual: usize },

    #[error("aggregation NONE cannot be combined with merging aggregations")]
    MixedAggregation,

    #[error("unknown aggregation `{0}`")]
    UnknownAggregation(String),

    #[error("page shift {0} is outside the supported range 3..=30")]
    InvalidPageShift(u32),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, AdjacencyError>;
