//! Property-based tests for the partitioner.
//!
//! Uses proptest to verify the disjoint-union invariant for all domain sizes
//! and worker counts: partitions are contiguous, pairwise disjoint, and their
//! union is exactly `[0, n)`.

use proptest::prelude::*;

use fmaperf::partition;

proptest! {
    #[test]
    fn covers_domain_without_gaps_or_overlaps(n in 0usize..1_000_000, workers in 1usize..256) {
        let parts = partition(n, workers);
        prop_assert_eq!(parts.len(), workers);

        let mut next = 0;
        for p in &parts {
            prop_assert_eq!(p.start, next);
            prop_assert!(p.end >= p.start);
            next = p.end;
        }
        prop_assert_eq!(next, n);
    }

    #[test]
    fn sizes_follow_the_remainder_policy(n in 0usize..1_000_000, workers in 1usize..256) {
        let parts = partition(n, workers);
        let size = n / workers;

        for p in &parts[..workers - 1] {
            prop_assert_eq!(p.len(), size);
        }
        prop_assert_eq!(parts[workers - 1].len(), size + n % workers);
    }

    #[test]
    fn empty_partitions_only_when_oversubscribed(n in 1usize..10_000, workers in 1usize..256) {
        let parts = partition(n, workers);
        let any_empty = parts.iter().any(|p| p.is_empty());
        prop_assert_eq!(any_empty, workers > n);
    }
}
