//! Node-indexed, delta-varint compressed adjacency lists

use std::mem;
use std::sync::Arc;

use crate::graph::cursor::AdjacencyCursor;
use crate::storage::Pages;

/// Immutable adjacency lists of all nodes.
///
/// `degrees[node]` is the number of targets of `node` and `offsets[node]`
/// the arena address of its encoded record. Nodes without targets own no
/// bytes; their offset is 0 by convention and never read.
#[derive(Debug, Clone)]
pub struct CompressedAdjacencyList {
    degrees: Arc<[u32]>,
    offsets: Vec<u64>,
    pages: Pages,
}

impl CompressedAdjacencyList {
    pub fn new(degrees: Arc<[u32]>, offsets: Vec<u64>, pages: Pages) -> Self {
        debug_assert_eq!(degrees.len(), offsets.len());
        Self {
            degrees,
            offsets,
            pages,
        }
    }

    pub fn node_count(&self) -> usize {
        self.degrees.len()
    }

    #[inline]
    pub fn degree(&self, node: u64) -> u32 {
        self.degrees[node as usize]
    }

    #[inline]
    pub fn offset(&self, node: u64) -> u64 {
        self.offsets[node as usize]
    }

    pub fn degrees(&self) -> &[u32] {
        &self.degrees
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn pages(&self) -> &Pages {
        &self.pages
    }

    /// Total number of stored targets over all nodes
    pub fn relationship_count(&self) -> u64 {
        self.degrees.iter().map(|degree| u64::from(*degree)).sum()
    }

    /// A cursor positioned on the first target of `node`
    pub fn adjacency_cursor(&self, node: u64) -> AdjacencyCursor<'_> {
        let degree = self.degree(node);
        if degree == 0 {
            return AdjacencyCursor::empty();
        }
        let mut cursor = AdjacencyCursor::new(&self.pages);
        cursor.init(self.offset(node), degree);
        cursor
    }

    /// Reposition `reuse` on the first target of `node` instead of
    /// creating a new cursor
    pub fn adjacency_cursor_reuse<'a>(&'a self, reuse: &mut AdjacencyCursor<'a>, node: u64) {
        reuse.reset(&self.pages, self.offset(node), self.degree(node));
    }

    /// An uninitialized cursor, to be positioned with
    /// [`AdjacencyCursor::init`] for one node after another
    pub fn raw_adjacency_cursor(&self) -> AdjacencyCursor<'_> {
        AdjacencyCursor::new(&self.pages)
    }

    /// Estimate memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        let base = mem::size_of::<Self>();
        let degrees = self.degrees.len() * mem::size_of::<u32>();
        let offsets = self.offsets.capacity() * mem::size_of::<u64>();

        base + degrees + offsets + self.pages.memory_usage()
    }
}
