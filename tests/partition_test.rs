//! Partition property tests

use deadline_batch::{partition, partition_stream, PartitionExt};
use futures::{stream, StreamExt};
use proptest::prelude::*;

proptest! {
    #[test]
    fn slices_concatenate_back_to_input(items in prop::collection::vec(any::<u16>(), 0..300), size in 1usize..40) {
        let slices: Vec<Vec<u16>> = partition(items.clone(), size).collect();

        let flattened: Vec<u16> = slices.iter().flatten().copied().collect();
        prop_assert_eq!(flattened, items.clone());
        prop_assert_eq!(slices.len(), items.len().div_ceil(size));
    }

    #[test]
    fn only_the_last_slice_may_be_short(items in prop::collection::vec(any::<u8>(), 1..300), size in 1usize..40) {
        let slices: Vec<Vec<u8>> = items.into_iter().partitioned(size).collect();
        let (last, full) = slices.split_last().expect("non-empty input yields a slice");

        prop_assert!(!last.is_empty());
        prop_assert!(last.len() <= size);
        for slice in full {
            prop_assert_eq!(slice.len(), size);
        }
    }

    #[test]
    fn zero_size_never_yields(items in prop::collection::vec(any::<u8>(), 0..50)) {
        prop_assert_eq!(partition(items, 0).count(), 0);
    }

    #[test]
    fn stream_partition_matches_iterator_partition(items in prop::collection::vec(any::<u32>(), 0..200), size in 0usize..20) {
        let expected: Vec<Vec<u32>> = partition(items.clone(), size).collect();
        let actual: Vec<Vec<u32>> = futures::executor::block_on(
            partition_stream(stream::iter(items), size).collect(),
        );
        prop_assert_eq!(actual, expected);
    }
}
