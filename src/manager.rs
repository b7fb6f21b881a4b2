//! [`GeoDataManager`]: the public entry point for writing and querying
//! points.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    config::GeoConfig,
    curve::{generate_hash_key, CellId, RegionCoverer, S2Coverer},
    engine::{
        validate_protected_attributes, Attributes, BatchWriteOutput, GeoItem, GeoStore,
        PrimaryKey, UpdateItemInput, UpdateItemRequest,
    },
    error::{GeoError, GeoResult},
    geo::{bounding_region_for_radius, bounding_region_for_rectangle, encode_point},
    query::{
        execute_plan, plan_region, ExactFilter, QueryOutput, QueryPlan, QueryRadiusInput,
        QueryRectangleInput,
    },
    GeoPoint,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PutPointInput {
    pub range_key: String,
    pub point: GeoPoint,
    /// Caller attributes; names of index attributes are dropped.
    #[serde(default)]
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetPointInput {
    pub range_key: String,
    pub point: GeoPoint,
    #[serde(default)]
    pub consistent_read: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePointInput {
    pub range_key: String,
    pub point: GeoPoint,
    pub update: UpdateItemInput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletePointInput {
    pub range_key: String,
    pub point: GeoPoint,
}

/// Writes points with their index attributes and answers rectangle and
/// radius queries over a [`GeoStore`].
pub struct GeoDataManager<S: GeoStore> {
    store: Arc<S>,
    config: GeoConfig,
    coverer: Arc<dyn RegionCoverer>,
}

impl PutPointInput {
    pub fn new(
        range_key: impl Into<String>,
        point: GeoPoint,
    ) -> Self {
        Self {
            range_key: range_key.into(),
            point,
            attributes: Attributes::new(),
        }
    }

    pub fn attribute(
        mut self,
        name: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }
}

////////////////////////////////////////////////////////////////////////////////
// Own methods
////////////////////////////////////////////////////////////////////////////////

impl<S: GeoStore> GeoDataManager<S> {
    /// Manager over `store` using the built-in S2 coverer.
    pub fn new(
        store: Arc<S>,
        config: GeoConfig,
    ) -> GeoResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            coverer: Arc::new(S2Coverer),
        })
    }

    pub fn with_coverer(
        mut self,
        coverer: impl RegionCoverer + 'static,
    ) -> Self {
        self.coverer = Arc::new(coverer);
        self
    }

    pub fn config(&self) -> &GeoConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// `(hash_key, geohash)` of a point.
    pub fn index_point(
        &self,
        point: &GeoPoint,
    ) -> GeoResult<(i64, i64)> {
        point.validate()?;
        let geohash = CellId::from_point(point).as_i64();
        Ok((
            generate_hash_key(geohash, self.config.hash_key_length),
            geohash,
        ))
    }

    fn primary_key(
        &self,
        point: &GeoPoint,
        range_key: &str,
    ) -> GeoResult<PrimaryKey> {
        let (hash_key, _) = self.index_point(point)?;
        Ok(PrimaryKey::new(hash_key, range_key))
    }

    fn build_item(
        &self,
        input: PutPointInput,
    ) -> GeoResult<GeoItem> {
        let (hash_key, geohash) = self.index_point(&input.point)?;
        let geo_json = encode_point(
            &input.point,
            &self.config.geo_json_point_type,
            self.config.longitude_first,
        )?;

        let reserved = self.config.reserved_attributes();
        let mut attributes = input.attributes;
        attributes.retain(|name, _| {
            let clash = reserved.contains(&name.as_str());
            if clash {
                warn!(
                    attribute = %name,
                    range_key = %input.range_key,
                    "Dropping caller attribute that shadows an index attribute"
                );
            }
            !clash
        });

        Ok(GeoItem {
            hash_key,
            range_key: input.range_key,
            geohash,
            geo_json,
            attributes,
        })
    }

    /// Writes one point; returns the item it replaced.
    pub async fn put_point(
        &self,
        input: PutPointInput,
    ) -> GeoResult<Option<GeoItem>> {
        let item = self.build_item(input)?;
        debug!(
            hash_key = item.hash_key,
            geohash = item.geohash,
            range_key = %item.range_key,
            "Putting point"
        );
        Ok(self.store.put_item(item).await?)
    }

    /// Writes up to `batch_write_size` points in one store call.
    pub async fn batch_write_points(
        &self,
        inputs: Vec<PutPointInput>,
    ) -> GeoResult<BatchWriteOutput> {
        if inputs.len() > self.config.batch_write_size {
            return Err(GeoError::BatchTooLarge {
                size: inputs.len(),
                limit: self.config.batch_write_size,
            });
        }
        if inputs.is_empty() {
            return Ok(BatchWriteOutput::default());
        }

        let items = inputs
            .into_iter()
            .map(|input| self.build_item(input))
            .collect::<GeoResult<Vec<_>>>()?;
        debug!(count = items.len(), "Batch writing points");
        Ok(self.store.batch_write(items).await?)
    }

    pub async fn get_point(
        &self,
        input: &GetPointInput,
    ) -> GeoResult<Option<GeoItem>> {
        let key = self.primary_key(&input.point, &input.range_key)?;
        let consistent_read = input
            .consistent_read
            .unwrap_or(self.config.consistent_read);
        Ok(self.store.get_item(&key, consistent_read).await?)
    }

    /// Updates caller attributes of a stored point. Touching an index
    /// attribute is rejected before the store is called.
    pub async fn update_point(
        &self,
        input: UpdatePointInput,
    ) -> GeoResult<GeoItem> {
        validate_protected_attributes(&input.update, &self.config.reserved_attributes())?;
        let key = self.primary_key(&input.point, &input.range_key)?;
        Ok(self
            .store
            .update_item(UpdateItemRequest {
                key,
                input: input.update,
            })
            .await?)
    }

    /// Deletes a point; returns the removed item.
    pub async fn delete_point(
        &self,
        input: &DeletePointInput,
    ) -> GeoResult<Option<GeoItem>> {
        let key = self.primary_key(&input.point, &input.range_key)?;
        Ok(self.store.delete_item(&key).await?)
    }

    pub fn plan_rectangle(
        &self,
        input: &QueryRectangleInput,
    ) -> GeoResult<QueryPlan> {
        let region =
            bounding_region_for_rectangle(input.min_point.as_ref(), input.max_point.as_ref())?;
        Ok(plan_region(region, self.coverer.as_ref(), &self.config))
    }

    pub fn plan_radius(
        &self,
        input: &QueryRadiusInput,
    ) -> GeoResult<QueryPlan> {
        let region = bounding_region_for_radius(&input.center_point, input.radius_in_meter)?;
        Ok(plan_region(region, self.coverer.as_ref(), &self.config))
    }

    /// Points inside the rectangle, edges included.
    pub async fn query_rectangle(
        &self,
        input: &QueryRectangleInput,
    ) -> GeoResult<QueryOutput> {
        let plan = self.plan_rectangle(input)?;
        let filter = ExactFilter::Rectangle(plan.region);
        execute_plan(&self.store, &plan, &filter, &self.config, &input.options).await
    }

    /// Points within `radius_in_meter` of the center.
    pub async fn query_radius(
        &self,
        input: &QueryRadiusInput,
    ) -> GeoResult<QueryOutput> {
        let plan = self.plan_radius(input)?;
        let filter = ExactFilter::Radius {
            center: input.center_point,
            radius_m: input.radius_in_meter,
        };
        execute_plan(&self.store, &plan, &filter, &self.config, &input.options).await
    }
}
