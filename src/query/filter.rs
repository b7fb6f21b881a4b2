use crate::{
    engine::GeoItem,
    error::GeoResult,
    geo::{haversine_distance, LatLngRect},
    GeoPoint,
};

/// Slack on the radius test, meters, absorbing floating-point noise.
pub const RADIUS_TOLERANCE_METERS: f64 = 1e-3;

/// The exact shape a query asked for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExactFilter {
    /// Inclusive on every edge.
    Rectangle(LatLngRect),
    Radius { center: GeoPoint, radius_m: f64 },
}

impl ExactFilter {
    pub fn matches(
        &self,
        point: &GeoPoint,
    ) -> bool {
        match self {
            ExactFilter::Rectangle(rect) => rect.contains_point(point),
            ExactFilter::Radius { center, radius_m } => {
                haversine_distance(*center, *point) <= radius_m + RADIUS_TOLERANCE_METERS
            }
        }
    }

    pub fn shape(&self) -> &'static str {
        match self {
            ExactFilter::Rectangle(_) => "rectangle",
            ExactFilter::Radius { .. } => "radius",
        }
    }

    /// Keeps items whose stored location lies inside the shape. A payload
    /// that does not decode fails the whole call.
    pub fn apply(
        &self,
        items: Vec<GeoItem>,
        longitude_first: bool,
    ) -> GeoResult<Vec<GeoItem>> {
        let mut kept = Vec::with_capacity(items.len());
        for item in items {
            if self.matches(&item.point(longitude_first)?) {
                kept.push(item);
            }
        }
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::GeoError,
        geo::{bounding_region_for_rectangle, destination_point},
    };

    fn item(
        range_key: &str,
        geo_json: &str,
    ) -> GeoItem {
        GeoItem {
            hash_key: 0,
            range_key: range_key.to_string(),
            geohash: 0,
            geo_json: geo_json.to_string(),
            attributes: Default::default(),
        }
    }

    #[test]
    fn test_rectangle_edges_are_inclusive() {
        let rect = bounding_region_for_rectangle(
            Some(&GeoPoint::new(48.0, -1.0)),
            Some(&GeoPoint::new(52.0, 3.0)),
        )
        .unwrap();
        let filter = ExactFilter::Rectangle(rect);
        assert!(filter.matches(&GeoPoint::new(48.0, -1.0)));
        assert!(filter.matches(&GeoPoint::new(52.0, 3.0)));
        assert!(filter.matches(&GeoPoint::new(50.0, 0.0)));
        assert!(!filter.matches(&GeoPoint::new(52.000001, 0.0)));
        assert!(!filter.matches(&GeoPoint::new(50.0, 3.000001)));
    }

    #[test]
    fn test_rectangle_across_antimeridian() {
        let rect = bounding_region_for_rectangle(
            Some(&GeoPoint::new(-5.0, 170.0)),
            Some(&GeoPoint::new(5.0, -170.0)),
        )
        .unwrap();
        let filter = ExactFilter::Rectangle(rect);
        assert!(filter.matches(&GeoPoint::new(0.0, 179.0)));
        assert!(filter.matches(&GeoPoint::new(0.0, -175.0)));
        assert!(!filter.matches(&GeoPoint::new(0.0, 0.0)));
    }

    #[test]
    fn test_radius_boundary() {
        let center = GeoPoint::new(52.22573, 0.149593);
        let filter = ExactFilter::Radius {
            center,
            radius_m: 1_000.0,
        };
        let inside = destination_point(center, 90.0, 999.0);
        let on_edge = destination_point(center, 45.0, 1_000.0);
        let outside = destination_point(center, 180.0, 1_001.0);
        assert!(filter.matches(&inside));
        assert!(filter.matches(&on_edge));
        assert!(!filter.matches(&outside));
    }

    #[test]
    fn test_apply_fails_on_malformed_payload() {
        let filter = ExactFilter::Radius {
            center: GeoPoint::new(0.0, 0.0),
            radius_m: 10.0,
        };
        let items = vec![
            item("ok", r#"{"type":"Point","coordinates":[0.0,0.0]}"#),
            item("bad", "not json"),
        ];
        assert!(matches!(
            filter.apply(items, true),
            Err(GeoError::GeoJson { .. })
        ));
    }

    #[test]
    fn test_apply_respects_coordinate_order() {
        let filter = ExactFilter::Radius {
            center: GeoPoint::new(51.51, -0.13),
            radius_m: 10.0,
        };
        let lon_first = vec![item("a", r#"{"type":"Point","coordinates":[-0.13,51.51]}"#)];
        let lat_first = vec![item("a", r#"{"type":"Point","coordinates":[51.51,-0.13]}"#)];
        assert_eq!(filter.apply(lon_first.clone(), true).unwrap().len(), 1);
        assert!(filter.apply(lon_first, false).unwrap().is_empty());
        assert_eq!(filter.apply(lat_first, false).unwrap().len(), 1);
    }
}
