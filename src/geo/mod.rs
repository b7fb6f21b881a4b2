//! Geometry primitives: points, distances, bounding regions and the stored
//! point payload.

pub mod distance;
pub mod geojson;
pub mod point;
pub mod region;

pub use distance::{destination_point, haversine_distance, EARTH_RADIUS_METERS};
pub use geojson::{decode_point, encode_point, GeoJsonPoint};
pub use point::GeoPoint;
pub use region::{
    bounding_region_for_radius, bounding_region_for_rectangle, LatInterval, LatLngRect,
    LngInterval,
};
