//! Pages and logical offsets

use std::mem;

use crate::error::{AdjacencyError, Result};

/// Default log2 of the page size
pub const PAGE_SHIFT: u32 = 18;

/// Default page capacity in bytes
pub const PAGE_SIZE: usize = 1 << PAGE_SHIFT;

/// Mask extracting the position inside a default-sized page
pub const PAGE_MASK: u64 = (PAGE_SIZE - 1) as u64;

/// Splits 64-bit logical offsets into `(page index, index in page)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    shift: u32,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::default_const()
    }
}

impl PageLayout {
    pub(crate) const fn default_const() -> Self {
        Self { shift: PAGE_SHIFT }
    }

    /// Create a layout with pages of `1 << shift` bytes
    pub fn new(shift: u32) -> Result<Self> {
        if !(3..=30).contains(&shift) {
            return Err(AdjacencyError::InvalidPageShift(shift));
        }
        Ok(Self { shift })
    }

    pub fn shift(&self) -> u32 {
        self.shift
    }

    pub fn page_size(&self) -> usize {
        1 << self.shift
    }

    pub fn mask(&self) -> u64 {
        (1u64 << self.shift) - 1
    }

    /// Page holding the byte at `offset`
    #[inline]
    pub fn page_index(&self, offset: u64) -> usize {
        let index = offset >> self.shift;
        debug_assert!(usize::try_from(index).is_ok(), "page index {} overflows usize", index);
        index as usize
    }

    /// Position of `offset` inside its page
    #[inline]
    pub fn index_in_page(&self, offset: u64) -> usize {
        (offset & self.mask()) as usize
    }

    /// Inverse of [`page_index`](Self::page_index) and
    /// [`index_in_page`](Self::index_in_page).
    #[inline]
    pub fn address(&self, page_index: usize, index_in_page: usize) -> u64 {
        debug_assert!(index_in_page < self.page_size());
        ((page_index as u64) << self.shift) | index_in_page as u64
    }
}

/// A single page of the arena.
///
/// Regular pages have exactly `page_size` bytes of capacity. A record
/// larger than a page gets its own oversized page of exactly its length.
#[derive(Debug, Clone)]
pub struct Page {
    bytes: Box<[u8]>,
    written: usize,
}

impl Page {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: vec![0u8; capacity].into_boxed_slice(),
            written: 0,
        }
    }

    pub(crate) fn empty() -> Self {
        Self::with_capacity(0)
    }

    /// All bytes of the page, including the unused tail
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Physical capacity of the page
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Number of bytes handed out to records
    pub fn written(&self) -> usize {
        self.written
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.written
    }

    /// Reserve `length` bytes at the current write position
    pub(crate) fn bump(&mut self, length: usize) -> (usize, &mut [u8]) {
        debug_assert!(length <= self.remaining());
        let start = self.written;
        self.written += length;
        (start, &mut self.bytes[start..start + length])
    }
}

/// The finished, immutable pages of one arena
#[derive(Debug, Clone)]
pub struct Pages {
    layout: PageLayout,
    pages: Vec<Page>,
}

impl Pages {
    pub(crate) fn new(layout: PageLayout, pages: Vec<Page>) -> Self {
        Self { layout, pages }
    }

    pub(crate) const fn empty_const(layout: PageLayout) -> Self {
        Self {
            layout,
            pages: Vec::new(),
        }
    }

    pub fn layout(&self) -> PageLayout {
        self.layout
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn page(&self, index: usize) -> &Page {
        &self.pages[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter()
    }

    /// The page containing `offset` and the position of `offset` in it
    #[inline]
    pub fn locate(&self, offset: u64) -> (&[u8], usize) {
        let page = &self.pages[self.layout.page_index(offset)];
        (page.bytes(), self.layout.index_in_page(offset))
    }

    /// Physical size of all pages, padding included
    pub fn total_bytes(&self) -> u64 {
        self.pages.iter().map(|page| page.capacity() as u64).sum()
    }

    /// Bytes actually occupied by records
    pub fn written_bytes(&self) -> u64 {
        self.pages.iter().map(|page| page.written() as u64).sum()
    }

    /// Estimate memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        let base = mem::size_of::<Self>();
        let table = self.pages.capacity() * mem::size_of::<Page>();
        base + table + self.pages.iter().map(Page::capacity).sum::<usize>()
    }
}
