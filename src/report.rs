//! Run summary persistence

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use serde_json::to_string_pretty;

use crate::compression::AdjacencyListsWithProperties;
use crate::config::Config;
use crate::graph::SlicedAdjacencyList;

/// Statistics of one compressed adjacency list
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub config: Config,
    pub node_count: usize,
    pub relationship_count: u64,
    pub max_degree: u32,
    pub avg_degree: f64,
    pub page_count: usize,
    pub total_page_bytes: u64,
    pub written_bytes: u64,
    pub sliced_bytes: u64,
    pub bytes_per_relationship: f64,
    pub memory_usage: usize,
    pub property_columns: usize,
}

impl Summary {
    pub fn new(config: &Config, lists: &AdjacencyListsWithProperties, sliced: &SlicedAdjacencyList<'_>) -> Self {
        let adjacency = &lists.adjacency;
        let node_count = adjacency.node_count();
        let relationship_count = adjacency.relationship_count();
        let written_bytes = adjacency.pages().written_bytes();

        let sliced_bytes = (0..node_count as u64)
            .map(|node| sliced.page_slice(node).length() as u64)
            .sum();

        let max_degree = adjacency.degrees().iter().copied().max().unwrap_or(0);

        Self {
            config: config.clone(),
            node_count,
            relationship_count,
            max_degree,
            avg_degree: ratio(relationship_count, node_count as u64),
            page_count: adjacency.pages().len(),
            total_page_bytes: sliced.total_page_bytes(),
            written_bytes,
            sliced_bytes,
            bytes_per_relationship: ratio(written_bytes, relationship_count),
            memory_usage: adjacency.memory_usage()
                + lists.properties.iter().map(|list| list.memory_usage()).sum::<usize>(),
            property_columns: lists.properties.len(),
        }
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Save the summary as `summary.json` in `output_dir`
pub fn save_summary(summary: &Summary, output_dir: &str) -> Result<()> {
    log::info!("Saving summary to {}", output_dir);

    fs::create_dir_all(output_dir)?;

    let path = Path::new(output_dir).join("summary.json");
    let mut file = File::create(path)?;
    file.write_all(to_string_pretty(summary)?.as_bytes())?;

    Ok(())
}
