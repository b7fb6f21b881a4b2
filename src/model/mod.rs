//! Curve ranges and coverings.

pub mod covering;
pub mod geohash_range;

pub use covering::Covering;
pub use geohash_range::{merge_ranges, GeohashRange};
