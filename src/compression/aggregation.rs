//! Policies for merging duplicate targets

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AdjacencyError;

/// How duplicate targets of one node (and their property values) collapse
/// into a single edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Aggregation {
    /// Keep every duplicate as its own edge
    #[default]
    None,
    Sum,
    Min,
    Max,
    /// Keep the first value that was loaded
    Single,
    /// Replace the value with the number of merged edges
    Count,
}

impl Aggregation {
    pub const ALL: [Aggregation; 6] = [
        Aggregation::None,
        Aggregation::Sum,
        Aggregation::Min,
        Aggregation::Max,
        Aggregation::Single,
        Aggregation::Count,
    ];

    /// Whether duplicates are merged at all
    pub fn merges(self) -> bool {
        self != Aggregation::None
    }

    /// Value a freshly seen edge starts with
    #[inline]
    pub fn initial(self, value: f64) -> f64 {
        match self {
            Aggregation::Count => 1.0,
            _ => value,
        }
    }

    /// Fold the value of a duplicate edge into the running value
    #[inline]
    pub fn merge(self, running: f64, value: f64) -> f64 {
        match self {
            Aggregation::None | Aggregation::Single => running,
            Aggregation::Sum => running + value,
            Aggregation::Min => running.min(value),
            Aggregation::Max => running.max(value),
            Aggregation::Count => running + 1.0,
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Aggregation::None => "NONE",
            Aggregation::Sum => "SUM",
            Aggregation::Min => "MIN",
            Aggregation::Max => "MAX",
            Aggregation::Single => "SINGLE",
            Aggregation::Count => "COUNT",
        };
        f.write_str(name)
    }
}

impl FromStr for Aggregation {
    type Err = AdjacencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Aggregation::ALL
            .into_iter()
            .find(|aggregation| aggregation.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AdjacencyError::UnknownAggregation(s.to_string()))
    }
}
