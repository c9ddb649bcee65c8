//! Sorting, duplicate aggregation and delta encoding of target lists

use crate::compression::Aggregation;

/// Sort `targets`, merge duplicates unless `aggregation` is
/// [`Aggregation::None`] and turn the result into deltas in place.
///
/// Returns the degree, i.e. the number of targets left after merging.
pub fn apply_delta_encoding(targets: &mut Vec<u64>, aggregation: Aggregation) -> usize {
    targets.sort_unstable();
    if aggregation.merges() {
        targets.dedup();
    }
    delta_encode(targets);
    targets.len()
}

/// Reusable scratch space for [`apply_delta_encoding_with_properties`]
#[derive(Debug, Default)]
pub struct SortScratch {
    order: Vec<usize>,
    targets: Vec<u64>,
    properties: Vec<Vec<f64>>,
}

/// Like [`apply_delta_encoding`] but keeps the property columns parallel
/// to the targets.
///
/// Targets are sorted stably, so the first loaded value of a duplicate is
/// the one [`Aggregation::Single`] keeps. When `no_aggregation` is false,
/// each column merges its duplicate values with its own aggregation. On
/// return `targets` holds deltas while `properties` holds the final
/// per-edge values in sorted target order.
pub fn apply_delta_encoding_with_properties(
    targets: &mut Vec<u64>,
    properties: &mut [Vec<f64>],
    aggregations: &[Aggregation],
    no_aggregation: bool,
    scratch: &mut SortScratch,
) -> usize {
    debug_assert_eq!(properties.len(), aggregations.len());
    debug_assert!(properties.iter().all(|column| column.len() == targets.len()));

    let SortScratch {
        order,
        targets: sorted_targets,
        properties: sorted_properties,
    } = scratch;

    order.clear();
    order.extend(0..targets.len());
    order.sort_by_key(|&index| targets[index]);

    sorted_targets.clear();
    sorted_properties.resize_with(properties.len(), Vec::new);
    for column in sorted_properties.iter_mut() {
        column.clear();
    }

    for &index in order.iter() {
        let target = targets[index];
        let duplicate = !no_aggregation && sorted_targets.last() == Some(&target);
        if duplicate {
            for (column, (sorted, aggregation)) in sorted_properties.iter_mut().zip(aggregations).enumerate() {
                if let Some(running) = sorted.last_mut() {
                    *running = aggregation.merge(*running, properties[column][index]);
                }
            }
        } else {
            sorted_targets.push(target);
            for (column, (sorted, aggregation)) in sorted_properties.iter_mut().zip(aggregations).enumerate() {
                sorted.push(aggregation.initial(properties[column][index]));
            }
        }
    }

    std::mem::swap(targets, sorted_targets);
    for (column, sorted) in properties.iter_mut().zip(sorted_properties.iter_mut()) {
        std::mem::swap(column, sorted);
    }

    delta_encode(targets);
    targets.len()
}

/// Replace every value but the first with its distance to the previous one.
///
/// `values` must be sorted ascending.
pub fn delta_encode(values: &mut [u64]) {
    let mut previous = 0;
    for value in values.iter_mut() {
        let current = *value;
        *value = current - previous;
        previous = current;
    }
}
