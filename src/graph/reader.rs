//! Block-wise decoding of delta-varint target lists

use crate::compression::varlong::decode_delta_vlongs;

/// Number of targets decoded at once
pub const CHUNK_SIZE: usize = 64;

/// Decodes one record in blocks of [`CHUNK_SIZE`] absolute target ids.
///
/// The reader does not know how many targets are left; every call gets
/// the number of targets not yet consumed from the owning cursor.
/// Blocks are only ever decoded whole, as every delta depends on the
/// previous value.
#[derive(Debug, Clone)]
pub struct DecompressingReader<'a> {
    block: [u64; CHUNK_SIZE],
    pos: usize,
    page: &'a [u8],
    offset: usize,
}

impl Default for DecompressingReader<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> DecompressingReader<'a> {
    pub fn new() -> Self {
        Self {
            block: [0; CHUNK_SIZE],
            pos: 0,
            page: &[],
            offset: 0,
        }
    }

    /// Start decoding the record at `page[offset..]` holding `degree` targets
    pub fn reset(&mut self, page: &'a [u8], offset: usize, degree: usize) {
        self.page = page;
        let length = degree.min(CHUNK_SIZE);
        self.offset = decode_delta_vlongs(0, page, offset, &mut self.block[..length]);
        self.pos = 0;
    }

    /// Copy the decoding state of `other`
    pub fn copy_from(&mut self, other: &DecompressingReader<'a>) {
        self.block = other.block;
        self.pos = other.pos;
        self.page = other.page;
        self.offset = other.offset;
    }

    /// Position in the page of the next undecoded byte
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn next(&mut self, remaining: usize) -> u64 {
        if self.pos >= CHUNK_SIZE {
            self.read_next_block(remaining);
        }
        let value = self.block[self.pos];
        self.pos += 1;
        value
    }

    pub fn peek(&mut self, remaining: usize) -> u64 {
        if self.pos >= CHUNK_SIZE {
            self.read_next_block(remaining);
        }
        self.block[self.pos]
    }

    /// Consume targets up to and including the first one `> target`.
    ///
    /// Returns that target and how many targets were consumed. When no
    /// target qualifies, everything is consumed and the last target is
    /// returned.
    pub fn skip_until(&mut self, target: u64, remaining: usize) -> (u64, usize) {
        self.seek(remaining, |value| value > target)
    }

    /// Same as [`skip_until`](Self::skip_until), but stops at the first
    /// target `>= target`.
    pub fn advance(&mut self, target: u64, remaining: usize) -> (u64, usize) {
        self.seek(remaining, |value| value >= target)
    }

    /// Skip `n` targets and consume and return the one after them.
    ///
    /// Requires `n < remaining`.
    pub fn advance_by(&mut self, mut n: usize, remaining: usize) -> u64 {
        debug_assert!(n < remaining);
        let mut available = remaining;
        if self.pos >= CHUNK_SIZE {
            self.read_next_block(available);
        }

        while n >= CHUNK_SIZE - self.pos {
            let skipped = CHUNK_SIZE - self.pos;
            n -= skipped;
            available -= skipped;
            self.read_next_block(available);
        }

        let target_pos = self.pos + n;
        self.pos = target_pos + 1;
        self.block[target_pos]
    }

    fn seek(&mut self, remaining: usize, found: impl Fn(u64) -> bool) -> (u64, usize) {
        debug_assert!(remaining > 0);
        let mut available = remaining;
        if self.pos >= CHUNK_SIZE {
            self.read_next_block(available);
        }

        // whole blocks whose last value is too small are skipped undecoded
        while available > CHUNK_SIZE - self.pos && !found(self.block[CHUNK_SIZE - 1]) {
            available -= CHUNK_SIZE - self.pos;
            self.read_next_block(available);
        }

        let end = CHUNK_SIZE.min(self.pos + available);
        let first_match = self.pos + self.block[self.pos..end].partition_point(|value| !found(*value));
        let target_pos = first_match.min(end - 1);

        available -= target_pos + 1 - self.pos;
        self.pos = target_pos + 1;
        (self.block[target_pos], remaining - available)
    }

    fn read_next_block(&mut self, remaining: usize) {
        let length = remaining.min(CHUNK_SIZE);
        let previous = self.block[CHUNK_SIZE - 1];
        self.offset = decode_delta_vlongs(previous, self.page, self.offset, &mut self.block[..length]);
        self.pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::delta::delta_encode;
    use crate::compression::varlong::encode_vlongs;

    fn encode(targets: &[u64]) -> Vec<u8> {
        let mut deltas = targets.to_vec();
        delta_encode(&mut deltas);
        let mut bytes = Vec::new();
        encode_vlongs(&deltas, &mut bytes);
        bytes
    }

    #[test]
    fn decodes_across_blocks() {
        let targets = (0..150u64).map(|i| i * 3).collect::<Vec<_>>();
        let bytes = encode(&targets);
        let mut reader = DecompressingReader::new();
        reader.reset(&bytes, 0, targets.len());

        let decoded = (0..targets.len())
            .map(|consumed| reader.next(targets.len() - consumed))
            .collect::<Vec<_>>();
        assert_eq!(decoded, targets);
        assert_eq!(reader.offset(), bytes.len());
    }

    #[test]
    fn decodes_at_an_offset_inside_the_page() {
        let mut page = vec![0xAA; 5];
        page.extend(encode(&[10, 20]));
        let mut reader = DecompressingReader::new();
        reader.reset(&page, 5, 2);
        assert_eq!(reader.next(2), 10);
        assert_eq!(reader.peek(1), 20);
        assert_eq!(reader.next(1), 20);
    }

    #[test]
    fn skip_jumps_over_whole_blocks() {
        let targets = (0..200u64).collect::<Vec<_>>();
        let bytes = encode(&targets);
        let mut reader = DecompressingReader::new();
        reader.reset(&bytes, 0, targets.len());

        assert_eq!(reader.skip_until(130, 200), (131, 132));
        assert_eq!(reader.next(68), 132);
        assert_eq!(reader.advance(140, 67), (140, 8));
    }

    #[test]
    fn seek_without_match_consumes_everything() {
        let bytes = encode(&[1, 2, 3]);
        let mut reader = DecompressingReader::new();
        reader.reset(&bytes, 0, 3);
        assert_eq!(reader.skip_until(3, 3), (3, 3));
    }

    #[test]
    fn advance_by_lands_on_the_right_target() {
        let targets = (0..200u64).map(|i| i * 2).collect::<Vec<_>>();
        let bytes = encode(&targets);
        let mut reader = DecompressingReader::new();
        reader.reset(&bytes, 0, targets.len());

        assert_eq!(reader.advance_by(63, 200), 126);
        assert_eq!(reader.advance_by(64, 136), 256);
        assert_eq!(reader.next(71), 258);
    }
}
