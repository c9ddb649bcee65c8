//! Uncompressed relationship property columns

use std::mem;
use std::sync::Arc;

use crate::storage::Pages;

/// Size of one stored property value
pub const PROPERTY_BYTES: usize = mem::size_of::<u64>();

/// One property value per stored target, kept uncompressed.
///
/// The values of a node are stored as little-endian `f64` bit patterns
/// in the same order as its decoded targets, so the i-th value belongs
/// to the i-th target.
#[derive(Debug, Clone)]
pub struct PropertyList {
    degrees: Arc<[u32]>,
    offsets: Vec<u64>,
    pages: Pages,
}

impl PropertyList {
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

    pub fn property_cursor(&self, node: u64) -> PropertyCursor<'_> {
        let mut cursor = self.raw_property_cursor();
        cursor.init(self.offset(node), self.degree(node));
        cursor
    }

    pub fn raw_property_cursor(&self) -> PropertyCursor<'_> {
        PropertyCursor {
            pages: &self.pages,
            page: &[],
            offset: 0,
            max_values: 0,
            current_position: 0,
        }
    }

    /// Estimate memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        mem::size_of::<Self>() + self.offsets.capacity() * mem::size_of::<u64>() + self.pages.memory_usage()
    }
}

/// Reads the property values of one node in target order
#[derive(Debug, Clone)]
pub struct PropertyCursor<'a> {
    pages: &'a Pages,
    page: &'a [u8],
    offset: usize,
    max_values: usize,
    current_position: usize,
}

impl PropertyCursor<'_> {
    pub fn init(&mut self, offset: u64, degree: u32) {
        self.max_values = degree as usize;
        self.current_position = 0;
        if degree == 0 {
            self.page = &[];
            self.offset = 0;
        } else {
            let (page, index_in_page) = self.pages.locate(offset);
            self.page = page;
            self.offset = index_in_page;
        }
    }

    pub fn size(&self) -> usize {
        self.max_values
    }

    pub fn remaining(&self) -> usize {
        self.max_values - self.current_position
    }

    pub fn has_next_long(&self) -> bool {
        self.current_position < self.max_values
    }

    /// The raw bit pattern of the next value
    pub fn next_long(&mut self) -> u64 {
        debug_assert!(self.has_next_long(), "cursor is exhausted");
        let mut raw = [0u8; PROPERTY_BYTES];
        raw.copy_from_slice(&self.page[self.offset..self.offset + PROPERTY_BYTES]);
        self.offset += PROPERTY_BYTES;
        self.current_position += 1;
        u64::from_le_bytes(raw)
    }

    pub fn next_f64(&mut self) -> f64 {
        f64::from_bits(self.next_long())
    }
}

impl Iterator for PropertyCursor<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        self.has_next_long().then(|| self.next_f64())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

impl ExactSizeIterator for PropertyCursor<'_> {}
