//! Variable-length encoding of unsigned 64-bit values
//!
//! Each value is written in groups of 7 bits, least significant group
//! first. The last byte of every value has its high bit set, all other
//! bytes have it cleared. A record of varints therefore always ends with
//! a byte that is negative when read as `i8`.

const PAYLOAD_MASK: u8 = 0x7F;
const STOP_BIT: u8 = 0x80;

/// Number of bytes `value` occupies once encoded
#[inline]
pub fn encoded_vlong_size(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.max(1).div_ceil(7)
}

/// Encoded size of a whole sequence
pub fn encoded_vlongs_size(values: &[u64]) -> usize {
    values.iter().map(|value| encoded_vlong_size(*value)).sum()
}

/// Write `value` at `out[pos..]`, returning the position after it
#[inline]
pub fn encode_vlong(mut value: u64, out: &mut [u8], mut pos: usize) -> usize {
    while value > u64::from(PAYLOAD_MASK) {
        out[pos] = (value as u8) & PAYLOAD_MASK;
        value >>= 7;
        pos += 1;
    }
    out[pos] = (value as u8) | STOP_BIT;
    pos + 1
}

/// Replace the content of `out` with the encoding of `values`.
///
/// Returns the number of bytes written.
pub fn encode_vlongs(values: &[u64], out: &mut Vec<u8>) -> usize {
    let required = encoded_vlongs_size(values);
    out.clear();
    out.resize(required, 0);
    let mut pos = 0;
    for value in values {
        pos = encode_vlong(*value, out, pos);
    }
    debug_assert_eq!(pos, required);
    pos
}

/// Read one value starting at `bytes[pos]`, returning it and the position after it
#[inline]
pub fn decode_vlong(bytes: &[u8], mut pos: usize) -> (u64, usize) {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        let byte = bytes[pos];
        pos += 1;
        if shift < u64::BITS {
            value |= u64::from(byte & PAYLOAD_MASK) << shift;
        }
        if byte & STOP_BIT != 0 {
            return (value, pos);
        }
        shift += 7;
    }
}

/// Decode `out.len()` deltas starting at `bytes[pos]` into absolute values.
///
/// Every delta is added to the previous value, the first one to
/// `previous`. Returns the position after the last decoded byte.
#[inline]
pub fn decode_delta_vlongs(mut previous: u64, bytes: &[u8], mut pos: usize, out: &mut [u64]) -> usize {
    for slot in out.iter_mut() {
        let (delta, next) = decode_vlong(bytes, pos);
        previous += delta;
        *slot = previous;
        pos = next;
    }
    pos
}

/// Position right after the `count`-th varint starting at `bytes[pos]`.
///
/// Only stop bytes are counted, nothing is decoded.
pub fn skip_vlongs(bytes: &[u8], mut pos: usize, count: usize) -> usize {
    let mut seen = 0;
    while seen < count {
        if bytes[pos] & STOP_BIT != 0 {
            seen += 1;
        }
        pos += 1;
    }
    pos
}

/// Map signed values onto unsigned ones so small magnitudes stay small
#[inline]
pub fn zig_zag(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[inline]
pub fn zig_zag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}
