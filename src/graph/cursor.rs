//! Cursor over the targets of a single node

use crate::graph::reader::DecompressingReader;
use crate::storage::{PageLayout, Pages};

/// Integer used for "no such target" where plain integers are expected
pub const NOT_FOUND: i64 = -1;

static EMPTY_PAGES: Pages = Pages::empty_const(PageLayout::default_const());

/// Outcome of a positional cursor operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seek {
    /// The cursor stopped on `id` after consuming `consumed` targets, `id` included
    Found { id: u64, consumed: usize },
    /// The cursor ran out of targets after consuming `consumed` of them
    Exhausted { consumed: usize },
}

impl Seek {
    pub fn id(&self) -> Option<u64> {
        match self {
            Seek::Found { id, .. } => Some(*id),
            Seek::Exhausted { .. } => None,
        }
    }

    pub fn consumed(&self) -> usize {
        match self {
            Seek::Found { consumed, .. } | Seek::Exhausted { consumed } => *consumed,
        }
    }

    /// The target id, or [`NOT_FOUND`].
    ///
    /// Only unambiguous for ids below 2^63, which covers every node id
    /// an `i64` boundary can express; larger ids wrap to negative values.
    pub fn to_raw(&self) -> i64 {
        self.id().map_or(NOT_FOUND, |id| {
            debug_assert!(i64::try_from(id).is_ok(), "id {} has no i64 form", id);
            id as i64
        })
    }
}

/// Mutable position over the decoded targets of one node.
///
/// A cursor owns no graph data, only decode state; it is cheap to
/// reinitialize for another node with [`init`](Self::init). Cursors are
/// not meant to be shared between threads, use
/// [`shallow_copy`](Self::shallow_copy) to read the same list twice.
#[derive(Debug, Clone)]
pub struct AdjacencyCursor<'a> {
    pages: &'a Pages,
    reader: DecompressingReader<'a>,
    max_targets: usize,
    current_position: usize,
}

impl<'a> AdjacencyCursor<'a> {
    /// An uninitialized cursor over `pages`
    pub fn new(pages: &'a Pages) -> Self {
        Self {
            pages,
            reader: DecompressingReader::new(),
            max_targets: 0,
            current_position: 0,
        }
    }

    /// A cursor without any targets
    pub fn empty() -> AdjacencyCursor<'static> {
        AdjacencyCursor::new(&EMPTY_PAGES)
    }

    /// Position the cursor on the record at `offset` holding `degree` targets
    pub fn init(&mut self, offset: u64, degree: u32) {
        self.max_targets = degree as usize;
        self.current_position = 0;
        if degree > 0 {
            let (page, index_in_page) = self.pages.locate(offset);
            self.reader.reset(page, index_in_page, self.max_targets);
        }
    }

    /// Switch to another set of pages, then [`init`](Self::init)
    pub fn reset(&mut self, pages: &'a Pages, offset: u64, degree: u32) {
        self.pages = pages;
        self.init(offset, degree);
    }

    /// Number of targets in total, i.e. the degree
    pub fn size(&self) -> usize {
        self.max_targets
    }

    /// Number of targets not yet consumed
    pub fn remaining(&self) -> usize {
        self.max_targets - self.current_position
    }

    pub fn has_next_vlong(&self) -> bool {
        self.current_position < self.max_targets
    }

    /// Decode the next target.
    ///
    /// Must only be called while [`has_next_vlong`](Self::has_next_vlong) holds.
    pub fn next_vlong(&mut self) -> u64 {
        debug_assert!(self.has_next_vlong(), "cursor is exhausted");
        let remaining = self.remaining();
        self.current_position += 1;
        self.reader.next(remaining)
    }

    /// The next target, without consuming it
    pub fn peek_vlong(&mut self) -> u64 {
        debug_assert!(self.has_next_vlong(), "cursor is exhausted");
        let remaining = self.remaining();
        self.reader.peek(remaining)
    }

    /// Consume targets until one is strictly larger than `target`
    pub fn skip_until(&mut self, target: u64) -> Seek {
        let remaining = self.remaining();
        if remaining == 0 {
            return Seek::Exhausted { consumed: 0 };
        }
        let (id, consumed) = self.reader.skip_until(target, remaining);
        self.current_position += consumed;
        if id > target {
            Seek::Found { id, consumed }
        } else {
            Seek::Exhausted { consumed }
        }
    }

    /// Consume targets until one is larger than or equal to `target`
    pub fn advance(&mut self, target: u64) -> Seek {
        let remaining = self.remaining();
        if remaining == 0 {
            return Seek::Exhausted { consumed: 0 };
        }
        let (id, consumed) = self.reader.advance(target, remaining);
        self.current_position += consumed;
        if id >= target {
            Seek::Found { id, consumed }
        } else {
            Seek::Exhausted { consumed }
        }
    }

    /// Skip `n` targets and return the one after them.
    ///
    /// Requires `n < remaining()`. Debug builds assert this, release
    /// builds exhaust the cursor instead.
    pub fn advance_by(&mut self, n: usize) -> Seek {
        let remaining = self.remaining();
        debug_assert!(n < remaining, "advance_by({}) with {} targets remaining", n, remaining);
        if n >= remaining {
            self.current_position = self.max_targets;
            return Seek::Exhausted { consumed: remaining };
        }
        let id = self.reader.advance_by(n, remaining);
        self.current_position += n + 1;
        Seek::Found { id, consumed: n + 1 }
    }

    /// An independent cursor continuing from the current position
    pub fn shallow_copy(&self) -> AdjacencyCursor<'a> {
        self.clone()
    }

    /// Take over the position of `other`, keeping this cursor's allocation
    pub fn copy_from(&mut self, other: &AdjacencyCursor<'a>) {
        self.pages = other.pages;
        self.reader.copy_from(&other.reader);
        self.max_targets = other.max_targets;
        self.current_position = other.current_position;
    }
}

impl Iterator for AdjacencyCursor<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        self.has_next_vlong().then(|| self.next_vlong())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

impl ExactSizeIterator for AdjacencyCursor<'_> {}
