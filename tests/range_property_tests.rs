//! Property-based tests for the curve, partition keys and range
//! splitting/merging.
//!
//! Ranges are generated far from zero with a modest width so that the
//! number of partitions a range crosses stays small; a separate strategy
//! exercises ranges around zero with short hash keys.

use geoscan::{
    curve::hash_key::decimal_digits, generate_hash_key, model::merge_ranges, CellId,
    CoverOptions, GeoPoint, GeohashRange, LatLngRect, RegionCoverer, S2Coverer,
};
use proptest::prelude::*;

const PROPTEST_CASES: u32 = 512;
const PROPTEST_MAX_SHRINK_ITERS: u32 = 10000;

// ============================================================================
// GENERATORS
// ============================================================================

/// Range whose endpoints share a sign and have at least 13 digits.
fn wide_range_strategy() -> impl Strategy<Value = GeohashRange> {
    (
        any::<bool>(),
        1_000_000_000_000i64..=(i64::MAX - 1_000_000_000),
        0i64..1_000_000_000,
    )
        .prop_map(|(negative, lo, width)| {
            if negative {
                GeohashRange::new(-(lo + width), -lo)
            } else {
                GeohashRange::new(lo, lo + width)
            }
        })
}

/// Range around zero, meant for hash key lengths of 1..=3.
fn zero_range_strategy() -> impl Strategy<Value = GeohashRange> {
    (0i64..50_000, 0i64..50_000).prop_map(|(neg, pos)| GeohashRange::new(-neg, pos))
}

fn point_strategy() -> impl Strategy<Value = GeoPoint> {
    (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(lat, lon)| GeoPoint::new(lat, lon))
}

/// Small rectangle with a point inside it.
fn rect_with_point_strategy() -> impl Strategy<Value = (LatLngRect, GeoPoint)> {
    (
        -80.0f64..79.0,
        -179.0f64..178.0,
        0.001f64..1.0,
        0.001f64..1.0,
        0.0f64..=1.0,
        0.0f64..=1.0,
    )
        .prop_map(|(lat, lon, dlat, dlon, fy, fx)| {
            let rect = LatLngRect::from_degrees(lat, lon, lat + dlat, lon + dlon);
            let point = GeoPoint::new(lat + fy * dlat, lon + fx * dlon);
            (rect, point)
        })
}

// ============================================================================
// HELPERS
// ============================================================================

fn check_split(
    range: GeohashRange,
    parts: &[GeohashRange],
    len: usize,
) -> Result<(), TestCaseError> {
    prop_assert!(!parts.is_empty());
    prop_assert_eq!(parts[0].range_min, range.range_min);
    prop_assert_eq!(parts[parts.len() - 1].range_max, range.range_max);
    for w in parts.windows(2) {
        prop_assert_eq!(w[0].range_max + 1, w[1].range_min, "gap or overlap in {:?}", w);
        prop_assert_ne!(w[0].hash_key(len), w[1].hash_key(len));
    }
    for p in parts {
        prop_assert!(p.range_min <= p.range_max);
        prop_assert_eq!(
            generate_hash_key(p.range_min, len),
            generate_hash_key(p.range_max, len),
            "piece {:?} crosses partitions",
            p
        );
    }
    Ok(())
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig {
        cases: PROPTEST_CASES,
        max_shrink_iters: PROPTEST_MAX_SHRINK_ITERS,
        .. ProptestConfig::default()
    })]

    // ------------------------------------------------------------------------
    // SPLIT
    // ------------------------------------------------------------------------

    /// Pieces tile the range exactly, one partition each.
    #[test]
    fn split_tiles_range(range in wide_range_strategy(), len in 1usize..=6) {
        let parts = range.try_split(len);
        check_split(range, &parts, len)?;
    }

    #[test]
    fn split_around_zero(range in zero_range_strategy(), len in 1usize..=3) {
        let parts = range.try_split(len);
        check_split(range, &parts, len)?;
        if range.range_min < 0 && range.range_max >= 0 {
            prop_assert!(parts.iter().any(|p| p.range_max == -1));
            prop_assert!(parts.iter().any(|p| p.range_min == 0));
        }
    }

    /// Splitting an already split range changes nothing.
    #[test]
    fn split_is_idempotent(range in wide_range_strategy(), len in 1usize..=6) {
        for part in range.try_split(len) {
            prop_assert_eq!(part.try_split(len), vec![part]);
        }
    }

    // ------------------------------------------------------------------------
    // MERGE
    // ------------------------------------------------------------------------

    /// Merged ranges are ascending, disjoint, single-partition and still
    /// cover every input range.
    #[test]
    fn merge_keeps_coverage(
        ranges in prop::collection::vec(wide_range_strategy(), 1..8),
        len in 1usize..=6,
        threshold in 0u64..1_000,
    ) {
        let pieces: Vec<GeohashRange> =
            ranges.iter().flat_map(|r| r.try_split(len)).collect();
        let merged = merge_ranges(pieces.clone(), threshold, len);

        for w in merged.windows(2) {
            prop_assert!(w[0].range_max < w[1].range_min, "overlap in {:?}", w);
        }
        for m in &merged {
            prop_assert!(m.is_single_partition(len));
        }
        for p in &pieces {
            prop_assert!(
                merged
                    .iter()
                    .any(|m| m.range_min <= p.range_min && p.range_max <= m.range_max),
                "{:?} lost by merge",
                p
            );
        }
        prop_assert!(merged.len() <= pieces.len());
    }

    // ------------------------------------------------------------------------
    // HASH KEYS
    // ------------------------------------------------------------------------

    /// Long ids keep exactly `len` leading digits; short ids are their own key.
    #[test]
    fn hash_key_digit_count(id in any::<i64>(), len in 1usize..=19) {
        let key = generate_hash_key(id, len);
        let digits = decimal_digits(id.unsigned_abs());
        prop_assert_eq!(key.signum(), id.signum());
        if digits <= len {
            prop_assert_eq!(key, id);
        } else {
            prop_assert_eq!(decimal_digits(key.unsigned_abs()), len);
            let unit = 10u64.pow((digits - len) as u32);
            prop_assert_eq!(key.unsigned_abs(), id.unsigned_abs() / unit);
        }
    }

    // ------------------------------------------------------------------------
    // CELLS
    // ------------------------------------------------------------------------

    /// Every ancestor of a point's leaf cell contains it.
    #[test]
    fn cell_ancestors_contain_leaf(point in point_strategy(), level in 0u8..=30) {
        let leaf = CellId::from_point(&point);
        prop_assert_eq!(leaf, CellId::from_point(&point));
        prop_assert!(leaf.is_leaf());

        let ancestor = leaf.parent(level);
        prop_assert_eq!(ancestor.level(), level);
        prop_assert!(ancestor.contains(leaf));
        prop_assert!(ancestor.range_min() <= leaf && leaf <= ancestor.range_max());
        prop_assert_eq!(ancestor.face(), leaf.face());
        prop_assert_eq!(ancestor.as_i64() < 0, leaf.as_i64() < 0);
    }

    /// Some covering cell contains every point of the region.
    #[test]
    fn covering_contains_points((rect, point) in rect_with_point_strategy()) {
        let cells = S2Coverer.cover(&rect, &CoverOptions::default());
        let leaf = CellId::from_point(&point);
        prop_assert!(!cells.is_empty());
        prop_assert!(cells.len() <= CoverOptions::default().max_cells);
        prop_assert!(cells.iter().any(|c| c.contains(leaf)), "{:?} not covered", point);
    }
}
