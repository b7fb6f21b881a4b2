use crate::GeoPoint;

/// Mean Earth radius used for every distance computation, meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine formula - great-circle distance in meters.
pub fn haversine_distance(
    p1: GeoPoint,
    p2: GeoPoint,
) -> f64 {
    let dlat = (p2.lat - p1.lat).to_radians();
    let dlon = (p2.lon - p1.lon).to_radians();
    let lat1 = p1.lat.to_radians();
    let lat2 = p2.lat.to_radians();

    let a = (dlat * 0.5).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon * 0.5).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());
    EARTH_RADIUS_METERS * c
}

/// Point reached by travelling `distance_m` from `origin` along the
/// great circle with initial `bearing_deg` (clockwise from north).
pub fn destination_point(
    origin: GeoPoint,
    bearing_deg: f64,
    distance_m: f64,
) -> GeoPoint {
    let delta = distance_m / EARTH_RADIUS_METERS;
    let theta = bearing_deg.to_radians();
    let phi1 = origin.lat.to_radians();
    let lambda1 = origin.lon.to_radians();

    let sin_phi2 = phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos();
    let phi2 = sin_phi2.clamp(-1.0, 1.0).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * sin_phi2);

    GeoPoint {
        lat: phi2.to_degrees(),
        lon: normalize_lon_degrees(lambda2.to_degrees()),
    }
}

/// Wraps a longitude into `[-180, 180]`, keeping `180` as is.
pub fn normalize_lon_degrees(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        return lon;
    }
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lon > 0.0 {
        180.0
    } else {
        wrapped
    }
}
