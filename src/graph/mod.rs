//! Compressed adjacency lists and the cursors reading them

pub mod compressed;
pub mod cursor;
pub mod properties;
pub mod reader;
pub mod sliced;

pub use compressed::CompressedAdjacencyList;
pub use cursor::{AdjacencyCursor, Seek, NOT_FOUND};
pub use properties::{PropertyCursor, PropertyList};
pub use reader::CHUNK_SIZE;
pub use sliced::{Column, PageSlice, SlicedAdjacencyList};
