use graph_adjacency_store::compression::varlong::{decode_vlong, encode_vlongs, skip_vlongs};
use graph_adjacency_store::compression::{compress_all, Aggregation, CompressorBlueprint, StagedAdjacency};
use graph_adjacency_store::config::Config;
use graph_adjacency_store::graph::{Seek, SlicedAdjacencyList};
use graph_adjacency_store::AdjacencyListsWithProperties;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Operation {
    Next,
    SkipUntil(u64),
    Advance(u64),
    AdvanceBy(usize),
}

fn arb_operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        Just(Operation::Next),
        (0u64..5_000).prop_map(Operation::SkipUntil),
        (0u64..5_000).prop_map(Operation::Advance),
        (0usize..150).prop_map(Operation::AdvanceBy),
    ]
}

fn arb_lists() -> impl Strategy<Value = Vec<Vec<u64>>> {
    prop::collection::vec(prop::collection::vec(0u64..5_000, 0..300), 1..20)
}

fn compress(lists: &[Vec<u64>], config: &Config) -> AdjacencyListsWithProperties {
    let staged = lists
        .iter()
        .map(|targets| targets.iter().copied().collect::<StagedAdjacency>())
        .collect::<Vec<_>>();
    let blueprint = CompressorBlueprint::new(staged.len(), config).unwrap();
    compress_all(&blueprint, &staged, config.effective_concurrency()).unwrap();
    blueprint.build()
}

/// Cursor semantics on a plain sorted vector
struct Model {
    targets: Vec<u64>,
    position: usize,
}

impl Model {
    fn seek(&mut self, found: impl Fn(u64) -> bool) -> Seek {
        let start = self.position;
        match self.targets[start..].iter().position(|value| found(*value)) {
            Some(index) => {
                self.position = start + index + 1;
                Seek::Found {
                    id: self.targets[start + index],
                    consumed: index + 1,
                }
            }
            None => {
                self.position = self.targets.len();
                Seek::Exhausted {
                    consumed: self.targets.len() - start,
                }
            }
        }
    }

    fn apply(&mut self, operation: &Operation) -> Seek {
        match *operation {
            Operation::Next => self.seek(|_| true),
            Operation::SkipUntil(target) => self.seek(|value| value > target),
            Operation::Advance(target) => self.seek(|value| value >= target),
            Operation::AdvanceBy(n) => {
                self.position += n + 1;
                Seek::Found {
                    id: self.targets[self.position - 1],
                    consumed: n + 1,
                }
            }
        }
    }
}

proptest! {
    #[test]
    fn prop_varints_decode_to_their_input(values in prop::collection::vec(any::<u64>(), 0..100)) {
        let mut bytes = Vec::new();
        let written = encode_vlongs(&values, &mut bytes);
        prop_assert_eq!(written, bytes.len());
        prop_assert_eq!(skip_vlongs(&bytes, 0, values.len()), bytes.len());

        let mut pos = 0;
        for expected in &values {
            let (value, next) = decode_vlong(&bytes, pos);
            prop_assert_eq!(value, *expected);
            pos = next;
        }
    }

    #[test]
    fn prop_cursor_yields_sorted_input(lists in arb_lists(), page_shift in 4u32..12) {
        let config = Config::new(page_shift, 3, Aggregation::None, Vec::new());
        let built = compress(&lists, &config);

        for (node, targets) in lists.iter().enumerate() {
            let mut expected = targets.clone();
            expected.sort_unstable();
            prop_assert_eq!(built.adjacency.degree(node as u64) as usize, expected.len());
            prop_assert_eq!(built.adjacency.adjacency_cursor(node as u64).collect::<Vec<_>>(), expected);
        }
    }

    #[test]
    fn prop_aggregation_removes_duplicates(targets in prop::collection::vec(0u64..200, 1..300)) {
        let config = Config::new(8, 1, Aggregation::Single, Vec::new());
        let built = compress(&[targets.clone()], &config);

        let mut expected = targets;
        expected.sort_unstable();
        expected.dedup();
        prop_assert_eq!(built.adjacency.adjacency_cursor(0).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn prop_cursor_matches_model(
        targets in prop::collection::vec(0u64..5_000, 1..400),
        operations in prop::collection::vec(arb_operation(), 1..30)
    ) {
        let built = compress(&[targets.clone()], &Config::default());
        let mut cursor = built.adjacency.adjacency_cursor(0);

        let mut sorted = targets;
        sorted.sort_unstable();
        let mut model = Model { targets: sorted, position: 0 };

        for operation in &operations {
            // advance_by requires n < remaining
            if matches!(*operation, Operation::AdvanceBy(n) if n >= cursor.remaining()) {
                continue;
            }
            let expected = model.apply(operation);
            let actual = match *operation {
                Operation::Next if cursor.has_next_vlong() => {
                    Seek::Found { id: cursor.next_vlong(), consumed: 1 }
                }
                Operation::Next => Seek::Exhausted { consumed: 0 },
                Operation::SkipUntil(target) => cursor.skip_until(target),
                Operation::Advance(target) => cursor.advance(target),
                Operation::AdvanceBy(n) => cursor.advance_by(n),
            };
            prop_assert_eq!(actual, expected, "{:?}", operation);
            prop_assert_eq!(cursor.remaining(), model.targets.len() - model.position);
        }
    }

    #[test]
    fn prop_summed_properties_follow_targets(
        edges in prop::collection::vec((0u64..50, -100i32..100), 1..200)
    ) {
        let config = Config::new(10, 1, Aggregation::Sum, vec![Aggregation::Sum]);
        let blueprint = CompressorBlueprint::new(1, &config).unwrap();
        {
            let mut staged = StagedAdjacency::with_properties(1);
            for (target, weight) in &edges {
                staged.push_with_properties(*target, &[f64::from(*weight)]);
            }
            let mut compressor = blueprint.create_compressor();
            compressor.compress(0, &staged).unwrap();
        }
        let built = blueprint.build();

        let mut expected = std::collections::BTreeMap::new();
        for (target, weight) in &edges {
            *expected.entry(*target).or_insert(0.0) += f64::from(*weight);
        }
        let targets = built.adjacency.adjacency_cursor(0).collect::<Vec<_>>();
        let weights = built.properties[0].property_cursor(0).collect::<Vec<_>>();
        prop_assert_eq!(targets, expected.keys().copied().collect::<Vec<_>>());
        prop_assert_eq!(weights, expected.values().copied().collect::<Vec<_>>());
    }

    #[test]
    fn prop_slices_partition_written_bytes(lists in arb_lists(), page_shift in 3u32..10) {
        let config = Config::new(page_shift, 2, Aggregation::None, Vec::new());
        let built = compress(&lists, &config);
        let sliced = SlicedAdjacencyList::build(&built.adjacency, 2).unwrap();
        let pages = built.adjacency.pages();

        let mut covered = 0u64;
        let mut ranges = Vec::new();
        for node in 0..lists.len() as u64 {
            let slice = sliced.page_slice(node);
            covered += slice.length() as u64;
            if let Some(start) = sliced.start_offset(node) {
                let (page, offset) = pages.locate(start);
                prop_assert_eq!(slice.offset(), offset);
                prop_assert_eq!(skip_vlongs(page, offset, built.adjacency.degree(node) as usize) - offset, slice.length());
                prop_assert_eq!(sliced.end_offset(node), Some(start + slice.length() as u64));
                // oversized pages reach past the logical page size, compare within pages
                let page_index = pages.layout().page_index(start);
                ranges.push((page_index, slice.offset(), slice.offset() + slice.length()));
            }
        }
        prop_assert_eq!(covered, pages.written_bytes());

        ranges.sort_unstable();
        for pair in ranges.windows(2) {
            if pair[0].0 == pair[1].0 {
                prop_assert!(pair[0].2 <= pair[1].1);
            }
        }
    }
}
