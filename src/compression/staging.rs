//! Loader-side buffer collecting the raw targets of one node

use crate::compression::varlong::{decode_vlong, encode_vlong, encoded_vlong_size, zig_zag, zig_zag_decode};

/// Raw targets of a node in load order, kept semi-compressed.
///
/// Targets arrive unsorted and may repeat, so consecutive targets are
/// stored as zig-zag encoded deltas. Property values are kept raw and
/// parallel to the targets.
#[derive(Debug, Clone, Default)]
pub struct StagedAdjacency {
    bytes: Vec<u8>,
    last_value: u64,
    length: usize,
    properties: Vec<Vec<f64>>,
}

impl StagedAdjacency {
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer that will receive `property_count` values with every target
    pub fn with_properties(property_count: usize) -> Self {
        Self {
            properties: vec![Vec::new(); property_count],
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    pub fn has_properties(&self) -> bool {
        !self.properties.is_empty()
    }

    /// Raw property values in load order
    pub fn properties(&self) -> &[Vec<f64>] {
        &self.properties
    }

    /// Size of the semi-compressed target bytes
    pub fn staged_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Append one target without properties
    pub fn push(&mut self, target: u64) {
        debug_assert!(self.properties.is_empty());
        self.push_target(target);
    }

    /// Append one target together with one value per property column
    pub fn push_with_properties(&mut self, target: u64, values: &[f64]) {
        debug_assert_eq!(values.len(), self.properties.len());
        self.push_target(target);
        for (column, value) in self.properties.iter_mut().zip(values) {
            column.push(*value);
        }
    }

    fn push_target(&mut self, target: u64) {
        let delta = zig_zag(target.wrapping_sub(self.last_value) as i64);
        let pos = self.bytes.len();
        self.bytes.resize(pos + encoded_vlong_size(delta), 0);
        encode_vlong(delta, &mut self.bytes, pos);
        self.last_value = target;
        self.length += 1;
    }

    /// Decode the targets in load order into `out`, passing each through `map`
    pub fn decode_into(&self, out: &mut Vec<u64>, map: impl Fn(u64) -> u64) {
        out.clear();
        out.reserve(self.length);
        let mut value = 0u64;
        let mut pos = 0;
        for _ in 0..self.length {
            let (delta, next) = decode_vlong(&self.bytes, pos);
            value = value.wrapping_add(zig_zag_decode(delta) as u64);
            out.push(map(value));
            pos = next;
        }
    }

    /// Copy the property values into `out`, reusing its allocations
    pub fn properties_into(&self, out: &mut Vec<Vec<f64>>) {
        out.resize_with(self.properties.len(), Vec::new);
        for (target, source) in out.iter_mut().zip(&self.properties) {
            target.clear();
            target.extend_from_slice(source);
        }
    }

    /// Drop all staged data, keeping the property column count
    pub fn clear(&mut self) {
        self.bytes.clear();
        self.last_value = 0;
        self.length = 0;
        for column in &mut self.properties {
            column.clear();
        }
    }
}

impl FromIterator<u64> for StagedAdjacency {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        let mut staged = StagedAdjacency::new();
        for target in iter {
            staged.push(target);
        }
        staged
    }
}
