use serde::{Deserialize, Serialize};

use crate::error::{GeoError, GeoResult};

/// Geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

////////////////////////////////////////////////////////////////////////////////
// Own methods
////////////////////////////////////////////////////////////////////////////////

impl GeoPoint {
    /// Creates a point from latitude and longitude in degrees.
    pub fn new(
        lat: f64,
        lon: f64,
    ) -> Self {
        Self { lat, lon }
    }

    /// Checks the point lies in `[-90, 90] x [-180, 180]`.
    pub fn validate(&self) -> GeoResult<()> {
        let reason = if !self.lat.is_finite() || !self.lon.is_finite() {
            "coordinates must be finite"
        } else if !(-90.0..=90.0).contains(&self.lat) {
            "latitude must be within [-90, 90]"
        } else if !(-180.0..=180.0).contains(&self.lon) {
            "longitude must be within [-180, 180]"
        } else {
            return Ok(());
        };
        Err(GeoError::InvalidPoint {
            lat: self.lat,
            lon: self.lon,
            reason: reason.to_string(),
        })
    }

    #[inline]
    pub fn lat_radians(&self) -> f64 {
        self.lat.to_radians()
    }

    #[inline]
    pub fn lon_radians(&self) -> f64 {
        self.lon.to_radians()
    }
}
