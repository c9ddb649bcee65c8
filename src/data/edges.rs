//! Plain-text edge list handling

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use itertools::Itertools;

use crate::compression::StagedAdjacency;

/// Relationships grouped by source node, in load order
#[derive(Debug, Clone, Default)]
pub struct EdgeList {
    /// One staging buffer per node, indexed by node id
    pub staged: Vec<StagedAdjacency>,

    /// Number of relationship lines read
    pub edge_count: u64,

    /// Whether every target carries a weight property
    pub weighted: bool,
}

impl EdgeList {
    pub fn node_count(&self) -> usize {
        self.staged.len()
    }

    fn ensure_node(&mut self, node: u64) -> Result<()> {
        let index = usize::try_from(node).map_err(|_| anyhow!("node id {} is too large", node))?;
        if index >= self.staged.len() {
            let property_count = usize::from(self.weighted);
            self.staged
                .resize_with(index + 1, || StagedAdjacency::with_properties(property_count));
        }
        Ok(())
    }

    fn add(&mut self, source: u64, target: u64, weight: Option<f64>) -> Result<()> {
        self.ensure_node(source)?;
        self.ensure_node(target)?;
        let staged = &mut self.staged[source as usize];
        match weight {
            Some(weight) => staged.push_with_properties(target, &[weight]),
            None => staged.push(target),
        }
        self.edge_count += 1;
        Ok(())
    }
}

/// Load an edge list file, see [`parse_edge_list`]
pub fn load_edge_list(path: &str, weighted: bool) -> Result<EdgeList> {
    log::info!("Reading edge list: {}", path);

    if !Path::new(path).exists() {
        return Err(anyhow!("File not found: {}", path));
    }

    let file = File::open(path).with_context(|| format!("opening {}", path))?;
    let edges = parse_edge_list(BufReader::new(file), weighted)?;

    log::info!(
        "Loaded {} relationships between {} nodes",
        edges.edge_count,
        edges.node_count()
    );

    Ok(edges)
}

/// Parse whitespace separated `source target [weight]` lines.
///
/// Empty lines and lines starting with `#` are skipped. Without
/// `weighted` a third column is ignored; with it, a missing weight
/// defaults to 1.0.
pub fn parse_edge_list(reader: impl BufRead, weighted: bool) -> Result<EdgeList> {
    let mut edges = EdgeList {
        weighted,
        ..EdgeList::default()
    };

    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields = line.split_whitespace().collect_vec();
        let (source, target) = fields
            .iter()
            .take(2)
            .map(|field| field.parse::<u64>())
            .collect_tuple()
            .ok_or_else(|| anyhow!("line {}: expected `source target [weight]`", line_number + 1))?;
        let source = source.with_context(|| format!("line {}: invalid source", line_number + 1))?;
        let target = target.with_context(|| format!("line {}: invalid target", line_number + 1))?;

        let weight = if weighted {
            let weight = match fields.get(2) {
                Some(field) => field
                    .parse::<f64>()
                    .with_context(|| format!("line {}: invalid weight", line_number + 1))?,
                None => 1.0,
            };
            Some(weight)
        } else {
            None
        };

        edges.add(source, target, weight)?;
    }

    Ok(edges)
}
