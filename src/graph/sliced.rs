//! Byte ranges of compressed records, located without decoding
//!
//! Building the index sorts all record offsets once. The end of a record
//! is then simply the start of the record that follows it in offset
//! order, which lets callers copy or merge the raw bytes of a node.

use rayon::prelude::*;

use crate::compression::varlong::skip_vlongs;
use crate::error::Result;
use crate::graph::compressed::CompressedAdjacencyList;
use crate::graph::properties::{PropertyList, PROPERTY_BYTES};
use crate::storage::Pages;

/// The two storage kinds a column of an adjacency list can have
#[derive(Debug, Clone, Copy)]
pub enum Column<'a> {
    /// Delta-varint encoded targets
    Compressed(&'a CompressedAdjacencyList),
    /// Fixed-width property values
    Raw(&'a PropertyList),
}

impl<'a> Column<'a> {
    pub fn degrees(&self) -> &'a [u32] {
        match self {
            Column::Compressed(list) => list.degrees(),
            Column::Raw(list) => list.degrees(),
        }
    }

    pub fn offsets(&self) -> &'a [u64] {
        match self {
            Column::Compressed(list) => list.offsets(),
            Column::Raw(list) => list.offsets(),
        }
    }

    pub fn pages(&self) -> &'a Pages {
        match self {
            Column::Compressed(list) => list.pages(),
            Column::Raw(list) => list.pages(),
        }
    }

    /// Byte length of a record, computed from the record itself
    fn record_length(&self, offset: u64, degree: u32) -> usize {
        match self {
            Column::Compressed(list) => {
                let (page, start) = list.pages().locate(offset);
                skip_vlongs(page, start, degree as usize) - start
            }
            Column::Raw(_) => degree as usize * PROPERTY_BYTES,
        }
    }
}

impl<'a> From<&'a CompressedAdjacencyList> for Column<'a> {
    fn from(list: &'a CompressedAdjacencyList) -> Self {
        Column::Compressed(list)
    }
}

impl<'a> From<&'a PropertyList> for Column<'a> {
    fn from(list: &'a PropertyList) -> Self {
        Column::Raw(list)
    }
}

/// The bytes of one record inside its page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageSlice<'a> {
    page: &'a [u8],
    offset: usize,
    length: usize,
}

impl<'a> PageSlice<'a> {
    /// The whole page the record lives in
    pub fn page(&self) -> &'a [u8] {
        self.page
    }

    /// Start of the record inside [`page`](Self::page)
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn bytes(&self) -> &'a [u8] {
        &self.page[self.offset..self.offset + self.length]
    }
}

/// Locates the `[start, end)` byte range of every node's record
#[derive(Debug, Clone)]
pub struct SlicedAdjacencyList<'a> {
    column: Column<'a>,
    sorted_offsets: Vec<u64>,
    forward_indexes: Vec<usize>,
}

impl<'a> SlicedAdjacencyList<'a> {
    /// Index the records of `column`, sorting with `concurrency` threads
    pub fn build(column: impl Into<Column<'a>>, concurrency: usize) -> Result<Self> {
        let column = column.into();
        let degrees = column.degrees();
        let offsets = column.offsets();

        // nodes without targets sort before a real record at offset 0
        let sort_key = |node: usize| {
            if degrees[node] == 0 {
                (0, false)
            } else {
                (offsets[node], true)
            }
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(concurrency)
            .build()?;

        let (sorted_offsets, forward_indexes) = pool.install(|| {
            let mut order = (0..degrees.len()).collect::<Vec<_>>();
            order.par_sort_by_key(|node| sort_key(*node));

            let sorted_offsets = order
                .par_iter()
                .map(|node| sort_key(*node).0)
                .collect::<Vec<_>>();

            let mut forward_indexes = vec![0; order.len()];
            for (rank, node) in order.iter().enumerate() {
                forward_indexes[*node] = rank;
            }
            (sorted_offsets, forward_indexes)
        });

        log::debug!("Built sliced index over {} nodes", sorted_offsets.len());

        Ok(Self {
            column,
            sorted_offsets,
            forward_indexes,
        })
    }

    pub fn node_count(&self) -> usize {
        self.forward_indexes.len()
    }

    #[inline]
    pub fn degree(&self, node: u64) -> u32 {
        self.column.degrees()[node as usize]
    }

    /// Rank of `node` in offset order
    pub fn rank(&self, node: u64) -> usize {
        self.forward_indexes[node as usize]
    }

    /// First byte of the record of `node`, `None` if it has no targets
    pub fn start_offset(&self, node: u64) -> Option<u64> {
        if self.degree(node) == 0 {
            return None;
        }
        Some(self.column.offsets()[node as usize])
    }

    /// One past the last byte of the record of `node`.
    ///
    /// Within a regular page this is the start of the next record in
    /// offset order. A record followed by a record on another page, the
    /// last record and any oversized record are measured from their own
    /// bytes instead.
    pub fn end_offset(&self, node: u64) -> Option<u64> {
        let start = self.start_offset(node)?;
        let layout = self.column.pages().layout();
        let next_rank = self.rank(node) + 1;
        if let Some(next_start) = self.sorted_offsets.get(next_rank) {
            if layout.page_index(*next_start) == layout.page_index(start) {
                return Some(*next_start);
            }
        }
        let length = self.column.record_length(start, self.degree(node));
        Some(start + length as u64)
    }

    /// Point `slice` at the bytes of the record of `node`
    pub fn init_page_slice(&self, node: u64, slice: &mut PageSlice<'a>) {
        let (Some(start), Some(end)) = (self.start_offset(node), self.end_offset(node)) else {
            *slice = PageSlice::default();
            return;
        };

        let pages = self.column.pages();
        let layout = pages.layout();
        let page = pages.page(layout.page_index(start));

        // records never span pages, so the range lies inside one page even
        // when an oversized record reaches past the logical page size
        *slice = PageSlice {
            page: page.bytes(),
            offset: layout.index_in_page(start),
            length: (end - start) as usize,
        };
    }

    pub fn page_slice(&self, node: u64) -> PageSlice<'a> {
        let mut slice = PageSlice::default();
        self.init_page_slice(node, &mut slice);
        slice
    }

    /// Physical size of all pages of the indexed column
    pub fn total_page_bytes(&self) -> u64 {
        self.column.pages().total_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::{AdjacencyListsWithProperties, CompressorBlueprint, StagedAdjacency};
    use crate::compression::varlong::encode_vlongs;
    use crate::compression::delta::delta_encode;
    use crate::config::Config;

    fn build(lists: &[Vec<u64>], page_shift: u32) -> AdjacencyListsWithProperties {
        let config = Config {
            page_shift,
            ..Config::default()
        };
        let blueprint = CompressorBlueprint::new(lists.len(), &config).unwrap();
        {
            let mut compressor = blueprint.create_compressor();
            for (node, targets) in lists.iter().enumerate() {
                let staged: StagedAdjacency = targets.iter().copied().collect();
                compressor.compress(node as u64, &staged).unwrap();
            }
        }
        blueprint.build()
    }

    fn encoded(targets: &[u64]) -> Vec<u8> {
        let mut deltas = targets.to_vec();
        deltas.sort_unstable();
        delta_encode(&mut deltas);
        let mut bytes = Vec::new();
        encode_vlongs(&deltas, &mut bytes);
        bytes
    }

    #[test]
    fn slices_match_encoded_records() {
        let lists = vec![vec![1, 2, 3], vec![], vec![300, 7], vec![1000, 2000, 3000], vec![]];
        let built = build(&lists, 4);
        let sliced = SlicedAdjacencyList::build(&built.adjacency, 2).unwrap();

        for (node, targets) in lists.iter().enumerate() {
            let slice = sliced.page_slice(node as u64);
            assert_eq!(slice.bytes(), encoded(targets).as_slice(), "node {}", node);
        }
        assert_eq!(sliced.start_offset(1), None);
        assert_eq!(sliced.end_offset(4), None);
    }

    #[test]
    fn record_at_offset_zero_is_not_taken_for_an_empty_node() {
        let lists = vec![vec![], vec![5, 6], vec![], vec![9]];
        let built = build(&lists, 6);
        let sliced = SlicedAdjacencyList::build(&built.adjacency, 1).unwrap();

        assert_eq!(sliced.start_offset(1), Some(0));
        assert!(sliced.rank(0) < sliced.rank(1));
        assert!(sliced.rank(2) < sliced.rank(1));
        assert_eq!(sliced.end_offset(1), Some(2));
        assert_eq!(sliced.page_slice(1).bytes(), encoded(&[5, 6]).as_slice());
        assert_eq!(sliced.page_slice(3).bytes(), encoded(&[9]).as_slice());
    }

    #[test]
    fn slices_cover_written_bytes_without_padding() {
        // pages of 8 bytes force records onto new pages, node 2 is oversized
        let lists = vec![
            vec![100, 200, 300],
            vec![1, 2],
            (0..20).map(|i| i * 1000).collect(),
            vec![70_000],
            vec![4, 5, 6, 7, 8],
        ];
        let built = build(&lists, 3);
        let sliced = SlicedAdjacencyList::build(&built.adjacency, 2).unwrap();
        let pages = built.adjacency.pages();

        let total: usize = (0..lists.len() as u64).map(|node| sliced.page_slice(node).length()).sum();
        assert_eq!(total as u64, pages.written_bytes());
        assert!(pages.written_bytes() < sliced.total_page_bytes());

        for (node, targets) in lists.iter().enumerate() {
            assert_eq!(sliced.page_slice(node as u64).bytes(), encoded(targets).as_slice());
        }
    }

    #[test]
    fn oversized_record_ends_after_its_own_bytes() {
        let lists = vec![vec![128, 256, 384, 1015, 1015, 512, 1143, 640, 1271], vec![0]];
        let built = build(&lists, 3);
        let sliced = SlicedAdjacencyList::build(&built.adjacency, 1).unwrap();
        let layout = built.adjacency.pages().layout();
        let length = encoded(&lists[0]).len() as u64;
        assert!(length > layout.page_size() as u64);

        let start = sliced.start_offset(0).unwrap();
        assert_eq!(sliced.end_offset(0), Some(start + length));
        assert_eq!(sliced.page_slice(0).length() as u64, length);

        let next = sliced.start_offset(1).unwrap();
        assert_ne!(layout.page_index(next), layout.page_index(start));
        assert_eq!(sliced.end_offset(1), Some(next + 1));
    }

    #[test]
    fn raw_property_columns_can_be_sliced() {
        let config = Config {
            property_aggregations: vec![crate::compression::Aggregation::None],
            ..Config::default()
        };
        let blueprint = CompressorBlueprint::new(2, &config).unwrap();
        {
            let mut compressor = blueprint.create_compressor();
            let mut staged = StagedAdjacency::with_properties(1);
            staged.push_with_properties(3, &[1.5]);
            staged.push_with_properties(1, &[2.5]);
            compressor.compress(0, &staged).unwrap();
        }
        let built = blueprint.build();
        let sliced = SlicedAdjacencyList::build(&built.properties[0], 1).unwrap();

        let slice = sliced.page_slice(0);
        assert_eq!(slice.length(), 16);
        assert_eq!(&slice.bytes()[..8], &2.5f64.to_bits().to_le_bytes());
        assert_eq!(sliced.page_slice(1).length(), 0);
    }
}
