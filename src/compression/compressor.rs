//! Compression entry point used by the loader, one call per node

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::compression::delta::{apply_delta_encoding, apply_delta_encoding_with_properties, SortScratch};
use crate::compression::varlong::encode_vlongs;
use crate::compression::{Aggregation, StagedAdjacency};
use crate::config::Config;
use crate::error::{AdjacencyError, Result};
use crate::graph::properties::PROPERTY_BYTES;
use crate::graph::{CompressedAdjacencyList, PropertyList};
use crate::storage::{ArenaBuilder, PageAllocator, PageLayout};

/// Maps raw target ids to the ids stored in the adjacency list
pub type IdMap = Arc<dyn Fn(u64) -> u64 + Send + Sync>;

/// Finished targets plus one list per property column
#[derive(Debug, Clone)]
pub struct AdjacencyListsWithProperties {
    pub adjacency: CompressedAdjacencyList,
    pub properties: Vec<PropertyList>,
}

/// Shared state of one compression run.
///
/// Every thread obtains its own [`DeltaVarLongCompressor`] through
/// [`create_compressor`](Self::create_compressor); compressors write into
/// disjoint pages and each node's degree and offset are written exactly
/// once. [`build`](Self::build) consumes the blueprint, so it can only run
/// after every compressor is gone.
pub struct CompressorBlueprint {
    aggregation: Aggregation,
    property_aggregations: Vec<Aggregation>,
    no_aggregation: bool,
    id_map: Option<IdMap>,
    adjacency: ArenaBuilder,
    property_arenas: Vec<ArenaBuilder>,
    degrees: Vec<AtomicU32>,
    offsets: Vec<AtomicU64>,
    property_offsets: Vec<Vec<AtomicU64>>,
}

impl CompressorBlueprint {
    pub fn new(node_count: usize, config: &Config) -> Result<Self> {
        config.validate()?;
        let layout = PageLayout::new(config.page_shift)?;
        let property_count = config.property_count();

        Ok(Self {
            aggregation: config.aggregation,
            property_aggregations: config.property_aggregations.clone(),
            no_aggregation: config.no_aggregation(),
            id_map: None,
            adjacency: ArenaBuilder::new(layout),
            property_arenas: (0..property_count).map(|_| ArenaBuilder::new(layout)).collect(),
            degrees: (0..node_count).map(|_| AtomicU32::new(0)).collect(),
            offsets: (0..node_count).map(|_| AtomicU64::new(0)).collect(),
            property_offsets: (0..property_count)
                .map(|_| (0..node_count).map(|_| AtomicU64::new(0)).collect())
                .collect(),
        })
    }

    /// Pass every raw target through `id_map` before encoding
    pub fn with_id_map(mut self, id_map: IdMap) -> Self {
        self.id_map = Some(id_map);
        self
    }

    pub fn node_count(&self) -> usize {
        self.degrees.len()
    }

    pub fn property_count(&self) -> usize {
        self.property_arenas.len()
    }

    /// A compressor for exclusive use by the calling thread
    pub fn create_compressor(&self) -> DeltaVarLongCompressor<'_> {
        DeltaVarLongCompressor {
            blueprint: self,
            adjacency_allocator: self.adjacency.new_allocator(),
            property_allocators: self.property_arenas.iter().map(ArenaBuilder::new_allocator).collect(),
            targets: Vec::new(),
            properties: Vec::new(),
            scratch: SortScratch::default(),
            encoded: Vec::new(),
        }
    }

    pub fn build(self) -> AdjacencyListsWithProperties {
        let degrees: Arc<[u32]> = self.degrees.into_iter().map(AtomicU32::into_inner).collect();
        let offsets = self.offsets.into_iter().map(AtomicU64::into_inner).collect();
        let adjacency = CompressedAdjacencyList::new(Arc::clone(&degrees), offsets, self.adjacency.build());

        let properties = self
            .property_arenas
            .into_iter()
            .zip(self.property_offsets)
            .map(|(arena, offsets)| {
                let offsets = offsets.into_iter().map(AtomicU64::into_inner).collect();
                PropertyList::new(Arc::clone(&degrees), offsets, arena.build())
            })
            .collect::<Vec<_>>();

        log::info!(
            "Built adjacency list: {} nodes, {} relationships, {} pages, {} property columns",
            adjacency.node_count(),
            adjacency.relationship_count(),
            adjacency.pages().len(),
            properties.len()
        );

        AdjacencyListsWithProperties { adjacency, properties }
    }
}

/// Per-thread compressor: owns its page allocators and scratch buffers
pub struct DeltaVarLongCompressor<'a> {
    blueprint: &'a CompressorBlueprint,
    adjacency_allocator: PageAllocator<'a>,
    property_allocators: Vec<PageAllocator<'a>>,
    targets: Vec<u64>,
    properties: Vec<Vec<f64>>,
    scratch: SortScratch,
    encoded: Vec<u8>,
}

impl DeltaVarLongCompressor<'_> {
    /// Sort, aggregate, encode and store the staged targets of `node`.
    ///
    /// Returns the degree of `node` after aggregation.
    pub fn compress(&mut self, node: u64, staged: &StagedAdjacency) -> Result<u32> {
        let blueprint = self.blueprint;
        let index = usize::try_from(node)
            .ok()
            .filter(|index| *index < blueprint.node_count())
            .ok_or(AdjacencyError::NodeOutOfRange {
                node,
                node_count: blueprint.node_count(),
            })?;
        if staged.property_count() != blueprint.property_count() {
            return Err(AdjacencyError::PropertyCountMismatch {
                expected: blueprint.property_count(),
                actual: staged.property_count(),
            });
        }
        if staged.is_empty() {
            return Ok(0);
        }

        match &blueprint.id_map {
            Some(id_map) => staged.decode_into(&mut self.targets, |id| id_map(id)),
            None => staged.decode_into(&mut self.targets, |id| id),
        }

        let degree = if staged.has_properties() {
            staged.properties_into(&mut self.properties);
            apply_delta_encoding_with_properties(
                &mut self.targets,
                &mut self.properties,
                &blueprint.property_aggregations,
                blueprint.no_aggregation,
                &mut self.scratch,
            )
        } else {
            apply_delta_encoding(&mut self.targets, blueprint.aggregation)
        };
        let degree = u32::try_from(degree).map_err(|_| AdjacencyError::DegreeOverflow { node, degree })?;

        debug_assert_eq!(
            blueprint.degrees[index].load(Ordering::Relaxed),
            0,
            "node {} compressed twice",
            node
        );

        let required_bytes = encode_vlongs(&self.targets, &mut self.encoded);
        let mut slice = self.adjacency_allocator.allocate(required_bytes);
        slice.insert(&self.encoded);
        let address = slice.address();

        if staged.has_properties() {
            self.copy_properties(index, degree);
        }
        blueprint.degrees[index].store(degree, Ordering::Relaxed);
        blueprint.offsets[index].store(address, Ordering::Relaxed);

        Ok(degree)
    }

    fn copy_properties(&mut self, index: usize, degree: u32) {
        let columns = self.properties.iter().zip(self.property_allocators.iter_mut());
        for (column, (values, allocator)) in columns.enumerate() {
            let mut slice = allocator.allocate(degree as usize * PROPERTY_BYTES);
            for (bytes, value) in slice.bytes_mut().chunks_exact_mut(PROPERTY_BYTES).zip(values) {
                bytes.copy_from_slice(&value.to_bits().to_le_bytes());
            }
            self.blueprint.property_offsets[column][index].store(slice.address(), Ordering::Relaxed);
        }
    }
}

/// Compress every staged node, node id = position in `staged`.
///
/// Nodes are split into batches processed on a pool of `concurrency`
/// threads, each batch with its own compressor. Returns the total number
/// of stored relationships.
pub fn compress_all(blueprint: &CompressorBlueprint, staged: &[StagedAdjacency], concurrency: usize) -> Result<u64> {
    debug_assert_eq!(staged.len(), blueprint.node_count());
    let pool = rayon::ThreadPoolBuilder::new().num_threads(concurrency).build()?;
    let batch_size = staged.len().div_ceil(pool.current_num_threads() * 4).max(1);

    log::info!(
        "Compressing {} nodes on {} threads in batches of {}",
        staged.len(),
        pool.current_num_threads(),
        batch_size
    );

    pool.install(|| {
        staged
            .par_chunks(batch_size)
            .enumerate()
            .map(|(batch, nodes)| -> Result<u64> {
                let mut compressor = blueprint.create_compressor();
                let first_node = batch * batch_size;
                let mut relationships = 0u64;
                for (i, adjacency) in nodes.iter().enumerate() {
                    relationships += u64::from(compressor.compress((first_node + i) as u64, adjacency)?);
                }
                Ok(relationships)
            })
            .try_reduce(|| 0, |a, b| Ok(a + b))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PAGE_SHIFT;

    #[test]
    fn compress_reports_aggregated_degree() {
        let config = Config::new(PAGE_SHIFT, 1, Aggregation::Max, Vec::new());
        let blueprint = CompressorBlueprint::new(1, &config).unwrap();
        let degree = {
            let mut compressor = blueprint.create_compressor();
            let staged: StagedAdjacency = [4u64, 4, 1, 4].into_iter().collect();
            compressor.compress(0, &staged).unwrap()
        };
        assert_eq!(degree, 2);

        let lists = blueprint.build();
        assert_eq!(lists.adjacency.degree(0), 2);
        assert_eq!(lists.adjacency.adjacency_cursor(0).collect::<Vec<_>>(), vec![1, 4]);
    }

    #[test]
    fn id_map_is_applied_before_sorting() {
        let blueprint = CompressorBlueprint::new(1, &Config::default())
            .unwrap()
            .with_id_map(Arc::new(|id| 100 - id));
        {
            let mut compressor = blueprint.create_compressor();
            let staged: StagedAdjacency = [1u64, 50, 99].into_iter().collect();
            compressor.compress(0, &staged).unwrap();
        }
        let lists = blueprint.build();
        assert_eq!(lists.adjacency.adjacency_cursor(0).collect::<Vec<_>>(), vec![1, 50, 99]);
    }

    #[test]
    fn property_column_count_must_match() {
        let config = Config::new(PAGE_SHIFT, 1, Aggregation::None, vec![Aggregation::None]);
        let blueprint = CompressorBlueprint::new(1, &config).unwrap();
        let mut compressor = blueprint.create_compressor();
        let staged: StagedAdjacency = [1u64].into_iter().collect();
        assert!(matches!(
            compressor.compress(0, &staged),
            Err(AdjacencyError::PropertyCountMismatch { expected: 1, actual: 0 })
        ));
    }

    #[test]
    fn out_of_range_nodes_are_rejected_before_writing() {
        let blueprint = CompressorBlueprint::new(2, &Config::default()).unwrap();
        {
            let mut compressor = blueprint.create_compressor();
            let staged: StagedAdjacency = [1u64, 2].into_iter().collect();
            assert!(matches!(
                compressor.compress(2, &staged),
                Err(AdjacencyError::NodeOutOfRange { node: 2, node_count: 2 })
            ));
            assert!(compressor.compress(u64::MAX, &StagedAdjacency::new()).is_err());
        }
        let lists = blueprint.build();
        assert!(lists.adjacency.pages().is_empty());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "node 0 compressed twice")]
    fn compressing_a_node_twice_asserts() {
        let blueprint = CompressorBlueprint::new(1, &Config::default()).unwrap();
        let mut compressor = blueprint.create_compressor();
        let staged: StagedAdjacency = [3u64].into_iter().collect();
        compressor.compress(0, &staged).unwrap();
        let _ = compressor.compress(0, &staged);
    }

    #[test]
    fn empty_nodes_own_no_bytes() {
        let blueprint = CompressorBlueprint::new(2, &Config::default()).unwrap();
        {
            let mut compressor = blueprint.create_compressor();
            assert_eq!(compressor.compress(0, &StagedAdjacency::new()).unwrap(), 0);
        }
        let lists = blueprint.build();
        assert_eq!(lists.adjacency.offset(0), 0);
        assert!(lists.adjacency.pages().is_empty());
    }

    #[test]
    fn parallel_compression_matches_input() {
        let staged = (0..500u64)
            .map(|node| (0..node % 70).map(|i| (node * 31 + i * 7) % 1000).collect::<StagedAdjacency>())
            .collect::<Vec<_>>();
        let config = Config::new(6, 4, Aggregation::None, Vec::new());
        let blueprint = CompressorBlueprint::new(staged.len(), &config).unwrap();
        let relationships = compress_all(&blueprint, &staged, 4).unwrap();
        let lists = blueprint.build();

        assert_eq!(relationships, lists.adjacency.relationship_count());
        let mut expected = Vec::new();
        for (node, adjacency) in staged.iter().enumerate() {
            adjacency.decode_into(&mut expected, |id| id);
            expected.sort_unstable();
            let actual = lists.adjacency.adjacency_cursor(node as u64).collect::<Vec<_>>();
            assert_eq!(actual, expected, "node {}", node);
        }
    }
}
