use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::curve::hash_key::{decimal_digits, generate_hash_key, negate_magnitude};

/// A contiguous, inclusive interval of curve positions to scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeohashRange {
    pub range_min: i64,
    pub range_max: i64,
}

/// Largest magnitude sharing the partition key of `magnitude`.
///
/// Magnitudes with no more than `hash_key_length` digits are their own
/// partition. Otherwise the partition is the block of numbers with the same
/// digit count and the same leading digits.
pub(crate) fn partition_end(
    magnitude: u64,
    hash_key_length: usize,
) -> u64 {
    let digits = decimal_digits(magnitude);
    if digits <= hash_key_length {
        return magnitude;
    }
    let unit = 10u64.pow((digits - hash_key_length) as u32);
    (magnitude / unit) * unit + (unit - 1)
}

/// Splits the magnitude interval `[lo, hi]` into partition-confined pieces,
/// ascending.
fn split_magnitudes(
    lo: u64,
    hi: u64,
    hash_key_length: usize,
) -> Vec<(u64, u64)> {
    let mut parts = Vec::new();
    let mut start = lo;
    loop {
        let end = partition_end(start, hash_key_length).min(hi);
        parts.push((start, end));
        if end == hi {
            break;
        }
        start = end + 1;
    }
    parts
}

////////////////////////////////////////////////////////////////////////////////
// Own methods
////////////////////////////////////////////////////////////////////////////////

impl GeohashRange {
    pub fn new(
        range_min: i64,
        range_max: i64,
    ) -> Self {
        debug_assert!(range_min <= range_max, "inverted range");
        Self {
            range_min,
            range_max,
        }
    }

    /// Partition key shared by every position of a split range.
    pub fn hash_key(
        &self,
        hash_key_length: usize,
    ) -> i64 {
        generate_hash_key(self.range_min, hash_key_length)
    }

    /// `true` when every position of the range maps to one partition key.
    pub fn is_single_partition(
        &self,
        hash_key_length: usize,
    ) -> bool {
        match (self.range_min < 0, self.range_max < 0) {
            (false, false) => {
                partition_end(self.range_min as u64, hash_key_length) >= self.range_max as u64
            }
            (true, true) => {
                partition_end(self.range_max.unsigned_abs(), hash_key_length)
                    >= self.range_min.unsigned_abs()
            }
            _ => false,
        }
    }

    /// Splits the range so that every piece lies within one partition.
    ///
    /// The pieces are ascending, cover the range exactly and do not
    /// overlap. A range straddling zero is cut at zero first; negative
    /// positions are partitioned by their magnitude.
    pub fn try_split(
        &self,
        hash_key_length: usize,
    ) -> Vec<GeohashRange> {
        if self.is_single_partition(hash_key_length) {
            return vec![*self];
        }

        let mut result = Vec::new();
        if self.range_min < 0 {
            let neg_hi = self.range_max.min(-1);
            let parts = split_magnitudes(
                neg_hi.unsigned_abs(),
                self.range_min.unsigned_abs(),
                hash_key_length,
            );
            result.extend(parts.into_iter().rev().map(|(lo, hi)| {
                GeohashRange::new(negate_magnitude(hi), negate_magnitude(lo))
            }));
        }
        if self.range_max >= 0 {
            let pos_lo = self.range_min.max(0) as u64;
            let parts = split_magnitudes(pos_lo, self.range_max as u64, hash_key_length);
            result.extend(
                parts
                    .into_iter()
                    .map(|(lo, hi)| GeohashRange::new(lo as i64, hi as i64)),
            );
        }
        result
    }

    /// Absorbs `other` when the two ranges overlap or sit at most
    /// `merge_threshold` apart and the union stays within one partition.
    ///
    /// The union also covers the gap, which only adds positions to scan.
    pub fn try_merge(
        &mut self,
        other: &GeohashRange,
        merge_threshold: u64,
        hash_key_length: usize,
    ) -> bool {
        let (first, second) = match self.range_min.cmp(&other.range_min) {
            Ordering::Greater => (other, &*self),
            _ => (&*self, other),
        };
        let gap = i128::from(second.range_min) - i128::from(first.range_max);
        if gap > i128::from(merge_threshold) {
            return false;
        }

        let merged = GeohashRange {
            range_min: first.range_min,
            range_max: first.range_max.max(second.range_max),
        };
        if !merged.is_single_partition(hash_key_length) {
            return false;
        }
        *self = merged;
        true
    }
}

/// Sorts `ranges` and coalesces neighbours with [`GeohashRange::try_merge`].
///
/// Output is ascending and pairwise disjoint when the input ranges are
/// single-partition.
pub fn merge_ranges(
    mut ranges: Vec<GeohashRange>,
    merge_threshold: u64,
    hash_key_length: usize,
) -> Vec<GeohashRange> {
    ranges.sort_unstable_by_key(|r| (r.range_min, r.range_max));

    let mut merged: Vec<GeohashRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        let absorbed = merged
            .last_mut()
            .map_or(false, |last| last.try_merge(&range, merge_threshold, hash_key_length));
        if !absorbed {
            merged.push(range);
        }
    }
    merged
}
