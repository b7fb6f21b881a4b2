pub mod global;
pub mod store;

pub use global::{GeoError, GeoResult};
pub use store::{StoreError, StoreResult};
