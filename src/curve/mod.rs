//! The space-filling curve: cell ids, partition keys and region coverings.

pub mod cell_id;
pub mod coverer;
pub mod hash_key;

pub use cell_id::{CellId, MAX_LEVEL, NUM_FACES};
pub use coverer::{CoverOptions, RegionCoverer, S2Coverer};
pub use hash_key::{generate_hash_key, MAX_HASH_KEY_LENGTH};
