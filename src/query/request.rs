use serde::{Deserialize, Serialize};

use crate::{engine::GeoItem, geo::LatLngRect, model::GeohashRange, GeoPoint};

/// Per-query overrides of the store request parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Page size per scan request.
    pub limit: Option<usize>,
    /// Overrides `GeoConfig::consistent_read`.
    pub consistent_read: Option<bool>,
}

/// Axis-aligned box query. Both corners are required; a missing corner is
/// reported as an input error instead of scanning anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRectangleInput {
    pub min_point: Option<GeoPoint>,
    pub max_point: Option<GeoPoint>,
    #[serde(default)]
    pub options: QueryOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRadiusInput {
    pub center_point: GeoPoint,
    pub radius_in_meter: f64,
    #[serde(default)]
    pub options: QueryOptions,
}

/// The scans a query would issue, computed without touching the store.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub region: LatLngRect,
    /// Cells in the covering, before splitting and merging.
    pub cell_count: usize,
    /// Partition-confined ranges, ascending and disjoint.
    pub ranges: Vec<GeohashRange>,
    pub hash_key_length: usize,
}

/// Counters gathered while executing a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueryStats {
    pub cells: usize,
    pub ranges: usize,
    pub pages: usize,
    /// Items returned by the store, before deduplication and filtering.
    pub scanned: usize,
    pub returned: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    pub items: Vec<GeoItem>,
    pub stats: QueryStats,
}

impl QueryRectangleInput {
    pub fn new(
        min_point: GeoPoint,
        max_point: GeoPoint,
    ) -> Self {
        Self {
            min_point: Some(min_point),
            max_point: Some(max_point),
            options: QueryOptions::default(),
        }
    }
}

impl QueryRadiusInput {
    pub fn new(
        center_point: GeoPoint,
        radius_in_meter: f64,
    ) -> Self {
        Self {
            center_point,
            radius_in_meter,
            options: QueryOptions::default(),
        }
    }
}

impl QueryPlan {
    /// `(partition key, range)` for every scan, in plan order.
    pub fn scans(&self) -> impl Iterator<Item = (i64, GeohashRange)> + '_ {
        self.ranges
            .iter()
            .map(|r| (r.hash_key(self.hash_key_length), *r))
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
