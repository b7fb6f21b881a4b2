#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use geoscan::{generate_hash_key, model::merge_ranges, GeohashRange};

/// Widths are capped so that a range crosses a bounded number of partitions
/// even next to zero.
const MAX_WIDTH: u64 = 100_000;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    start: i64,
    width: u64,
    hash_key_length: u8,
    merge_threshold: u16,
}

fuzz_target!(|input: FuzzInput| {
    let len = usize::from(input.hash_key_length % 19) + 1;
    let start = input.start;
    let end = start.saturating_add((input.width % MAX_WIDTH) as i64);
    let range = GeohashRange::new(start, end);

    let parts = range.try_split(len);
    assert_eq!(parts.first().map(|p| p.range_min), Some(start));
    assert_eq!(parts.last().map(|p| p.range_max), Some(end));
    for w in parts.windows(2) {
        assert_eq!(w[0].range_max + 1, w[1].range_min);
    }
    for p in &parts {
        assert_eq!(
            generate_hash_key(p.range_min, len),
            generate_hash_key(p.range_max, len)
        );
    }

    let merged = merge_ranges(parts.clone(), u64::from(input.merge_threshold), len);
    assert!(merged.len() <= parts.len());
    for w in merged.windows(2) {
        assert!(w[0].range_max < w[1].range_min);
    }
    for m in &merged {
        assert!(m.is_single_partition(len));
    }
});
