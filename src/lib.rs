//! Geospatial point index over a partitioned range-scan key-value store.
//!
//! Points are mapped to 64-bit cell ids on a space-filling curve; a decimal
//! prefix of the id is the partition key and the full id the sort key of a
//! secondary index. Rectangle and radius queries are answered by covering
//! the query region with cells, turning the cells into partition-confined id
//! ranges, scanning those ranges concurrently and filtering the candidates
//! against the exact shape.

/// Index layout and tuning (`GeoConfig`) and settings loading.
pub mod config;
/// Cell ids, partition keys and region coverings.
pub mod curve;
/// Storage boundary: `GeoStore`, `InMemoryStore`, item updates.
pub mod engine;
/// Error taxonomy and result aliases.
pub mod error;
/// Points, distances, bounding regions and the point payload.
pub mod geo;
/// Subscriber setup for binaries.
pub mod logging;
/// The public facade.
pub mod manager;
/// Curve ranges and coverings.
pub mod model;
/// Query planning and execution.
pub mod query;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

pub use self::config::{GeoConfig, GeoConfigBuilder, Settings};
pub use curve::{generate_hash_key, CellId, CoverOptions, RegionCoverer, S2Coverer};
pub use engine::{GeoItem, GeoStore, InMemoryStore, PrimaryKey, UpdateItemInput};
pub use error::{GeoError, GeoResult, StoreError, StoreResult};
pub use geo::{GeoPoint, LatLngRect};
pub use manager::{
    DeletePointInput, GeoDataManager, GetPointInput, PutPointInput, UpdatePointInput,
};
pub use model::{Covering, GeohashRange};
pub use query::{QueryOptions, QueryOutput, QueryPlan, QueryRadiusInput, QueryRectangleInput};
