//! Bounding regions in the curve's native coordinates.
//!
//! A [`LatLngRect`] is a closed latitude interval paired with a longitude
//! interval, both in radians. The longitude interval follows the usual
//! spherical convention: `lo > hi` means the interval wraps across the
//! antimeridian (e.g. `[170°, -170°]` is 20° wide).

use std::f64::consts::PI;

use s2::{r1, rect::Rect, s1};

use crate::{
    error::{GeoError, GeoResult},
    geo::distance::{haversine_distance, normalize_lon_degrees},
    GeoPoint,
};

/// Closed latitude interval, radians. Empty when `lo > hi`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatInterval {
    pub lo: f64,
    pub hi: f64,
}

/// Closed longitude interval on the circle, radians in `[-PI, PI]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LngInterval {
    pub lo: f64,
    pub hi: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLngRect {
    pub lat: LatInterval,
    pub lng: LngInterval,
}

impl LatInterval {
    pub fn new(
        lo: f64,
        hi: f64,
    ) -> Self {
        Self { lo, hi }
    }

    pub fn is_empty(&self) -> bool {
        !(self.lo <= self.hi)
    }

    pub fn contains(
        &self,
        v: f64,
    ) -> bool {
        self.lo <= v && v <= self.hi
    }
}

impl LngInterval {
    pub fn new(
        lo: f64,
        hi: f64,
    ) -> Self {
        Self { lo, hi }
    }

    pub fn full() -> Self {
        Self { lo: -PI, hi: PI }
    }

    pub fn is_full(&self) -> bool {
        self.lo <= -PI && self.hi >= PI
    }

    /// Wraps across the antimeridian.
    pub fn is_inverted(&self) -> bool {
        self.lo > self.hi
    }

    pub fn contains(
        &self,
        v: f64,
    ) -> bool {
        if self.is_full() {
            return true;
        }
        // -PI and PI are the same meridian.
        let alt = if v == -PI {
            PI
        } else if v == PI {
            -PI
        } else {
            v
        };
        self.contains_raw(v) || self.contains_raw(alt)
    }

    fn contains_raw(
        &self,
        v: f64,
    ) -> bool {
        if self.is_inverted() {
            v >= self.lo || v <= self.hi
        } else {
            self.lo <= v && v <= self.hi
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Own methods
////////////////////////////////////////////////////////////////////////////////

impl LatLngRect {
    pub fn new(
        lat: LatInterval,
        lng: LngInterval,
    ) -> Self {
        Self { lat, lng }
    }

    /// Builds a rect from corner degrees without normalisation.
    pub fn from_degrees(
        lat_lo: f64,
        lng_lo: f64,
        lat_hi: f64,
        lng_hi: f64,
    ) -> Self {
        Self {
            lat: LatInterval::new(lat_lo.to_radians(), lat_hi.to_radians()),
            lng: LngInterval::new(lng_lo.to_radians(), lng_hi.to_radians()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lat.is_empty()
    }

    /// Inclusive point-in-rectangle test.
    pub fn contains_point(
        &self,
        point: &GeoPoint,
    ) -> bool {
        self.lat.contains(point.lat_radians()) && self.lng.contains(point.lon_radians())
    }

    /// The same rect as an S2 region, grown by `margin` radians on every
    /// side.
    ///
    /// Latitudes are clamped to the poles; a longitude interval that grows
    /// past a full turn becomes full.
    pub fn to_s2_padded(
        &self,
        margin: f64,
    ) -> Rect {
        let lat = r1::interval::Interval::new(
            (self.lat.lo - margin).max(-PI / 2.0),
            (self.lat.hi + margin).min(PI / 2.0),
        );
        let width = if self.lng.is_inverted() {
            self.lng.hi - self.lng.lo + 2.0 * PI
        } else {
            self.lng.hi - self.lng.lo
        };
        let lng = if self.lng.is_full() || width + 2.0 * margin >= 2.0 * PI {
            s1::interval::Interval::new(-PI, PI)
        } else {
            s1::interval::Interval::new(
                wrap_radians(self.lng.lo - margin),
                wrap_radians(self.lng.hi + margin),
            )
        };
        Rect { lat, lng }
    }
}

/// Brings an angle that left `[-PI, PI]` by less than a turn back into it.
fn wrap_radians(v: f64) -> f64 {
    if v < -PI {
        v + 2.0 * PI
    } else if v > PI {
        v - 2.0 * PI
    } else {
        v
    }
}

/// Bounding region of a rectangle query.
///
/// Corners are used as given: `min.lon > max.lon` selects the band that
/// wraps across the antimeridian, `min.lat > max.lat` yields an empty
/// region.
pub fn bounding_region_for_rectangle(
    min_point: Option<&GeoPoint>,
    max_point: Option<&GeoPoint>,
) -> GeoResult<LatLngRect> {
    let min = min_point.ok_or(GeoError::MissingPoint("min_point"))?;
    let max = max_point.ok_or(GeoError::MissingPoint("max_point"))?;
    min.validate()?;
    max.validate()?;

    Ok(LatLngRect::from_degrees(min.lat, min.lon, max.lat, max.lon))
}

/// Square-ish bounding region around `center` that approximately contains
/// the circle of `radius_m` meters.
///
/// Degrees-per-meter is calibrated locally with reference points one degree
/// away (towards the equator and towards the prime meridian). Regions that
/// reach a pole, or whose longitudinal extent cannot be measured, span every
/// longitude.
pub fn bounding_region_for_radius(
    center: &GeoPoint,
    radius_m: f64,
) -> GeoResult<LatLngRect> {
    center.validate()?;
    if !radius_m.is_finite() || radius_m <= 0.0 {
        return Err(GeoError::InvalidRadius(radius_m));
    }

    let lat_reference_unit = if center.lat > 0.0 { -1.0 } else { 1.0 };
    let lat_reference = GeoPoint {
        lat: center.lat + lat_reference_unit,
        lon: center.lon,
    };
    let lng_reference_unit = if center.lon > 0.0 { -1.0 } else { 1.0 };
    let lng_reference = GeoPoint {
        lat: center.lat,
        lon: center.lon + lng_reference_unit,
    };

    let lat_for_radius = radius_m / haversine_distance(*center, lat_reference);
    let lng_for_radius = radius_m / haversine_distance(*center, lng_reference);

    let lat_lo = (center.lat - lat_for_radius).max(-90.0);
    let lat_hi = (center.lat + lat_for_radius).min(90.0);
    let lat = LatInterval::new(lat_lo.to_radians(), lat_hi.to_radians());

    let touches_pole = lat_lo <= -90.0 || lat_hi >= 90.0;
    let lng = if touches_pole || !lng_for_radius.is_finite() || lng_for_radius >= 180.0 {
        LngInterval::full()
    } else {
        let lo = normalize_lon_degrees(center.lon - lng_for_radius);
        let hi = normalize_lon_degrees(center.lon + lng_for_radius);
        LngInterval::new(lo.to_radians(), hi.to_radians())
    };

    Ok(LatLngRect { lat, lng })
}

/// Human readable bounds in degrees, for logs.
pub fn describe(rect: &LatLngRect) -> String {
    format!(
        "lat [{:.6}, {:.6}] lng [{:.6}, {:.6}]",
        rect.lat.lo.to_degrees(),
        rect.lat.hi.to_degrees(),
        rect.lng.lo.to_degrees(),
        rect.lng.hi.to_degrees()
    )
}
