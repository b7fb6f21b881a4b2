use serde::{Deserialize, Serialize};

use crate::{
    error::{GeoError, GeoResult},
    GeoPoint,
};

/// Serialized point payload stored under the `geoJson` attribute.
///
/// `coordinates` is `[lon, lat]` (GeoJSON order) or `[lat, lon]`,
/// depending on the configured coordinate order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonPoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: [f64; 2],
}

impl GeoJsonPoint {
    pub fn from_point(
        point: &GeoPoint,
        point_type: &str,
        longitude_first: bool,
    ) -> Self {
        let coordinates = if longitude_first {
            [point.lon, point.lat]
        } else {
            [point.lat, point.lon]
        };
        Self {
            kind: point_type.to_string(),
            coordinates,
        }
    }

    pub fn to_point(
        &self,
        longitude_first: bool,
    ) -> GeoPoint {
        let [a, b] = self.coordinates;
        if longitude_first {
            GeoPoint { lat: b, lon: a }
        } else {
            GeoPoint { lat: a, lon: b }
        }
    }
}

/// Encodes the payload string written next to every point.
pub fn encode_point(
    point: &GeoPoint,
    point_type: &str,
    longitude_first: bool,
) -> GeoResult<String> {
    serde_json::to_string(&GeoJsonPoint::from_point(point, point_type, longitude_first)).map_err(
        |e| GeoError::GeoJson {
            payload: format!("{point:?}"),
            reason: e.to_string(),
        },
    )
}

/// Parses a stored payload back into a point. The `type` label is not
/// inspected.
pub fn decode_point(
    payload: &str,
    longitude_first: bool,
) -> GeoResult<GeoPoint> {
    let parsed: GeoJsonPoint = serde_json::from_str(payload).map_err(|e| GeoError::GeoJson {
        payload: payload.to_string(),
        reason: e.to_string(),
    })?;
    Ok(parsed.to_point(longitude_first))
}
