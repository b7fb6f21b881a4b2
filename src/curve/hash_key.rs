//! Partition ("hash") keys: decimal prefixes of cell ids.

/// Longest meaningful prefix; `i64` magnitudes have at most 19 digits.
pub const MAX_HASH_KEY_LENGTH: usize = 19;

/// Number of decimal digits of `v` (`0` has one digit).
#[inline]
pub fn decimal_digits(v: u64) -> usize {
    if v == 0 {
        1
    } else {
        v.ilog10() as usize + 1
    }
}

/// First `hash_key_length` decimal digits of `magnitude`.
#[inline]
pub fn magnitude_prefix(
    magnitude: u64,
    hash_key_length: usize,
) -> u64 {
    let digits = decimal_digits(magnitude);
    if digits <= hash_key_length {
        magnitude
    } else {
        magnitude / 10u64.pow((digits - hash_key_length) as u32)
    }
}

/// Negates a magnitude of at most `2^63`.
#[inline]
pub(crate) fn negate_magnitude(magnitude: u64) -> i64 {
    // 2^63 wraps onto i64::MIN, which is exactly its negation.
    (magnitude as i64).wrapping_neg()
}

/// Partition key of a geohash: its first `hash_key_length` significant
/// digits, carrying the sign of the input.
///
/// Rendered in decimal, a negative key takes one extra character for the
/// sign, so `generate_hash_key(-1234567, 2) == -12`. Magnitudes with no more
/// than `hash_key_length` digits are their own key.
pub fn generate_hash_key(
    geohash: i64,
    hash_key_length: usize,
) -> i64 {
    debug_assert!(hash_key_length > 0, "hash key length must be positive");
    let prefix = magnitude_prefix(geohash.unsigned_abs(), hash_key_length);
    if geohash < 0 {
        negate_magnitude(prefix)
    } else {
        prefix as i64
    }
}
