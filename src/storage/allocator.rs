//! Bump allocation of records into arena pages

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;

use crate::error::{AdjacencyError, Result};
use crate::storage::pages::{Page, PageLayout, Pages};

/// Shared state of an arena while it is being written.
///
/// Threads never share a page: each [`PageAllocator`] claims whole pages
/// through an atomic counter and hands them back once it moves on, so
/// no locking happens inside a page.
#[derive(Debug)]
pub struct ArenaBuilder {
    layout: PageLayout,
    next_page: AtomicUsize,
    finished: DashMap<usize, Page>,
}

impl ArenaBuilder {
    pub fn new(layout: PageLayout) -> Self {
        Self {
            layout,
            next_page: AtomicUsize::new(0),
            finished: DashMap::new(),
        }
    }

    pub fn layout(&self) -> PageLayout {
        self.layout
    }

    /// A new append-only allocator, meant to be owned by a single thread
    pub fn new_allocator(&self) -> PageAllocator<'_> {
        PageAllocator {
            builder: self,
            current: None,
            oversized: None,
        }
    }

    /// Arenas are append-only; writing at caller-chosen offsets would
    /// corrupt the offsets of records already written.
    pub fn new_positional_allocator(&self) -> Result<PageAllocator<'_>> {
        Err(AdjacencyError::Unsupported(
            "positional allocation on an append-only arena",
        ))
    }

    fn claim_page(&self) -> usize {
        self.next_page.fetch_add(1, Ordering::Relaxed)
    }

    fn deposit(&self, index: usize, page: Page) {
        let previous = self.finished.insert(index, page);
        debug_assert!(previous.is_none(), "page {} deposited twice", index);
    }

    /// Collect all pages in index order.
    ///
    /// Taking `self` by value guarantees every allocator borrowing this
    /// builder has been dropped, and therefore has deposited its pages.
    pub fn build(self) -> Pages {
        let page_count = self.next_page.into_inner();
        let finished = self.finished;

        let pages = (0..page_count)
            .map(|index| {
                finished
                    .remove(&index)
                    .map(|(_, page)| page)
                    .unwrap_or_else(Page::empty)
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Built arena with {} pages ({} bytes written)",
            pages.len(),
            pages.iter().map(|page| page.written() as u64).sum::<u64>()
        );

        Pages::new(self.layout, pages)
    }
}

/// Writable range handed out by [`PageAllocator::allocate`]
#[derive(Debug)]
pub struct ArenaSlice<'p> {
    address: u64,
    bytes: &'p mut [u8],
}

impl ArenaSlice<'_> {
    /// Logical offset of the first byte of this range
    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        self.bytes
    }

    /// Copy `source` into the start of the range
    pub fn insert(&mut self, source: &[u8]) {
        self.bytes[..source.len()].copy_from_slice(source);
    }
}

/// Thread-local bump allocator over an [`ArenaBuilder`].
///
/// Records are written sequentially into the current page. A record that
/// does not fit into what is left of the page starts a fresh page and the
/// old tail stays unused. Records larger than a page get an oversized
/// page of their own, after which writing continues in the current page.
#[derive(Debug)]
pub struct PageAllocator<'a> {
    builder: &'a ArenaBuilder,
    current: Option<(usize, Page)>,
    oversized: Option<(usize, Page)>,
}

impl PageAllocator<'_> {
    pub fn layout(&self) -> PageLayout {
        self.builder.layout
    }

    /// Reserve `length` bytes for one record
    pub fn allocate(&mut self, length: usize) -> ArenaSlice<'_> {
        let layout = self.builder.layout;

        if length > layout.page_size() {
            if let Some((index, page)) = self.oversized.take() {
                self.builder.deposit(index, page);
            }
            let index = self.builder.claim_page();
            let (_, page) = self.oversized.insert((index, Page::with_capacity(length)));
            let (start, bytes) = page.bump(length);
            return ArenaSlice {
                address: layout.address(index, start),
                bytes,
            };
        }

        let fits = matches!(&self.current, Some((_, page)) if page.remaining() >= length);
        if !fits {
            if let Some((index, page)) = self.current.take() {
                self.builder.deposit(index, page);
            }
            let index = self.builder.claim_page();
            self.current = Some((index, Page::with_capacity(layout.page_size())));
        }

        let (index, page) = self
            .current
            .as_mut()
            .unwrap_or_else(|| unreachable!("current page was just installed"));
        let (start, bytes) = page.bump(length);
        ArenaSlice {
            address: layout.address(*index, start),
            bytes,
        }
    }

    /// Hand all pages back to the builder
    pub fn close(self) {}
}

impl Drop for PageAllocator<'_> {
    fn drop(&mut self) {
        if let Some((index, page)) = self.current.take() {
            self.builder.deposit(index, page);
        }
        if let Some((index, page)) = self.oversized.take() {
            self.builder.deposit(index, page);
        }
    }
}
