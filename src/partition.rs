//! Work partitioning across parallel execution units.
//!
//! The element domain `[0, n)` is split into one contiguous half-open range
//! per worker. Ranges are disjoint and their union is the full domain; this
//! invariant is what lets the executor hand every worker an exclusive output
//! slice and skip all locking.

use std::ops::Range;

/// Half-open index range `[start, end)` assigned to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub start: usize,
    pub end: usize,
}

impl Partition {
    /// Number of elements in the range.
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the range covers no elements. Empty partitions are valid
    /// no-ops, never out-of-bounds accesses.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The range as an iterator-friendly `Range`.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Split `[0, n)` into `workers` contiguous disjoint ranges.
///
/// Every worker receives `n / workers` elements; the last worker additionally
/// absorbs the `n % workers` remainder. When `workers > n` the leading
/// partitions are empty.
pub fn partition(n: usize, workers: usize) -> Vec<Partition> {
    assert!(workers >= 1, "worker count must be at least 1");
    let size = n / workers;
    (0..workers)
        .map(|tid| {
            let start = tid * size;
            let end = if tid == workers - 1 { n } else { start + size };
            Partition { start, end }
        })
        .collect()
}
