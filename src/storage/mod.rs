//! Paged byte arena backing the compressed adjacency lists
//!
//! Records are appended into fixed-size pages by per-thread
//! [`PageAllocator`]s. Every record is addressed by a single 64-bit
//! offset that decomposes into a page index and a position inside that
//! page, see [`PageLayout`].

pub mod allocator;
pub mod pages;

pub use allocator::{ArenaBuilder, ArenaSlice, PageAllocator};
pub use pages::{Page, PageLayout, Pages, PAGE_MASK, PAGE_SHIFT, PAGE_SIZE};
