use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::update::UpdateItemRequest;
use crate::{
    config::GeoConfig,
    error::{GeoResult, StoreResult},
    geo::decode_point,
    model::GeohashRange,
    GeoPoint,
};

/// Free-form, caller-owned attributes of an item.
pub type Attributes = serde_json::Map<String, Value>;

/// Table key: partition key plus the caller's range key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrimaryKey {
    pub hash_key: i64,
    pub range_key: String,
}

/// One stored point. `geohash` is the sort key of the geohash index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoItem {
    pub hash_key: i64,
    pub range_key: String,
    pub geohash: i64,
    pub geo_json: String,
    #[serde(default)]
    pub attributes: Attributes,
}

/// Opaque resume position returned by a paginated scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationToken(pub String);

/// One page request of a partition-scoped range scan over the geohash index.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    pub hash_key: i64,
    pub range: GeohashRange,
    pub exclusive_start_key: Option<ContinuationToken>,
    /// Page size override; the store default applies when `None`.
    pub limit: Option<usize>,
    pub consistent_read: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPage {
    pub items: Vec<GeoItem>,
    /// Present while more items may follow.
    pub last_evaluated_key: Option<ContinuationToken>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchWriteOutput {
    pub written: usize,
    pub unprocessed_items: Vec<GeoItem>,
}

/// The key-value store behind the index.
///
/// A scan must return items of one partition whose `geohash` lies within
/// the requested range, ascending by `geohash`, in pages threaded by
/// continuation tokens.
#[async_trait]
pub trait GeoStore: Send + Sync + 'static {
    async fn query_page(
        &self,
        request: ScanRequest,
    ) -> StoreResult<ScanPage>;

    /// Inserts or replaces; returns the previous item.
    async fn put_item(
        &self,
        item: GeoItem,
    ) -> StoreResult<Option<GeoItem>>;

    async fn get_item(
        &self,
        key: &PrimaryKey,
        consistent_read: bool,
    ) -> StoreResult<Option<GeoItem>>;

    /// Removes and returns the item, if present.
    async fn delete_item(
        &self,
        key: &PrimaryKey,
    ) -> StoreResult<Option<GeoItem>>;

    /// Applies the update to an existing item and returns the new version.
    async fn update_item(
        &self,
        request: UpdateItemRequest,
    ) -> StoreResult<GeoItem>;

    async fn batch_write(
        &self,
        items: Vec<GeoItem>,
    ) -> StoreResult<BatchWriteOutput>;
}

////////////////////////////////////////////////////////////////////////////////
// Own methods
////////////////////////////////////////////////////////////////////////////////

impl PrimaryKey {
    pub fn new(
        hash_key: i64,
        range_key: impl Into<String>,
    ) -> Self {
        Self {
            hash_key,
            range_key: range_key.into(),
        }
    }
}

impl GeoItem {
    pub fn key(&self) -> PrimaryKey {
        PrimaryKey::new(self.hash_key, self.range_key.clone())
    }

    /// Location decoded from the stored payload.
    pub fn point(
        &self,
        longitude_first: bool,
    ) -> GeoResult<GeoPoint> {
        decode_point(&self.geo_json, longitude_first)
    }

    /// Flat record as the table sees it, using the configured attribute
    /// names. Index attributes win over same-named caller attributes.
    pub fn to_document(
        &self,
        config: &GeoConfig,
    ) -> Value {
        let mut doc = self.attributes.clone();
        doc.insert(
            config.hash_key_attribute_name.clone(),
            Value::from(self.hash_key),
        );
        doc.insert(
            config.range_key_attribute_name.clone(),
            Value::from(self.range_key.clone()),
        );
        doc.insert(
            config.geohash_attribute_name.clone(),
            Value::from(self.geohash),
        );
        doc.insert(
            config.geo_json_attribute_name.clone(),
            Value::from(self.geo_json.clone()),
        );
        Value::Object(doc)
    }
}

impl fmt::Display for ContinuationToken {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}
