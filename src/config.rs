//! Configuration management for building compressed adjacency lists

use serde::{Deserialize, Serialize};

use crate::compression::Aggregation;
use crate::error::{AdjacencyError, Result};
use crate::storage::PAGE_SHIFT;

/// Build configuration for the compression pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// log2 of the page size used by the byte arenas
    pub page_shift: u32,

    /// Number of worker threads (0 = use all available cores)
    pub concurrency: usize,

    /// Aggregation applied to duplicate targets when no properties are loaded
    pub aggregation: Aggregation,

    /// One aggregation per property column
    pub property_aggregations: Vec<Aggregation>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_shift: PAGE_SHIFT,
            concurrency: 0,
            aggregation: Aggregation::None,
            property_aggregations: Vec::new(),
        }
    }
}

impl Config {
    /// Create a new configuration with custom values
    pub fn new(
        page_shift: u32,
        concurrency: usize,
        aggregation: Aggregation,
        property_aggregations: Vec<Aggregation>,
    ) -> Self {
        Self {
            page_shift,
            concurrency,
            aggregation,
            property_aggregations,
        }
    }

    /// Number of threads to actually use
    pub fn effective_concurrency(&self) -> usize {
        if self.concurrency > 0 {
            self.concurrency
        } else {
            num_cpus::get()
        }
    }

    /// Number of property columns that will be written next to the targets
    pub fn property_count(&self) -> usize {
        self.property_aggregations.len()
    }

    /// Whether duplicate targets are kept as separate edges
    pub fn no_aggregation(&self) -> bool {
        if self.property_aggregations.is_empty() {
            self.aggregation == Aggregation::None
        } else {
            self.property_aggregations
                .iter()
                .all(|aggregation| *aggregation == Aggregation::None)
        }
    }

    /// Reject settings the compressor cannot honor
    pub fn validate(&self) -> Result<()> {
        if !(3..=30).contains(&self.page_shift) {
            return Err(AdjacencyError::InvalidPageShift(self.page_shift));
        }

        let merging = self
            .property_aggregations
            .iter()
            .filter(|aggregation| **aggregation != Aggregation::None)
            .count();
        if merging > 0 && merging < self.property_aggregations.len() {
            return Err(AdjacencyError::MixedAggregation);
        }

        Ok(())
    }
}
