use serde::{Deserialize, Serialize};

use crate::{
    curve::{CoverOptions, MAX_HASH_KEY_LENGTH},
    error::{GeoError, GeoResult},
};

pub const DEFAULT_TABLE_NAME: &str = "geo_points";
pub const DEFAULT_HASH_KEY_ATTRIBUTE: &str = "hashKey";
pub const DEFAULT_RANGE_KEY_ATTRIBUTE: &str = "rangeKey";
pub const DEFAULT_GEOHASH_ATTRIBUTE: &str = "geohash";
pub const DEFAULT_GEO_JSON_ATTRIBUTE: &str = "geoJson";
pub const DEFAULT_GEOHASH_INDEX: &str = "geohash-index";
pub const DEFAULT_HASH_KEY_LENGTH: usize = 2;
pub const DEFAULT_MERGE_THRESHOLD: u64 = 2;
pub const DEFAULT_POINT_TYPE: &str = "Point";
pub const DEFAULT_BATCH_WRITE_SIZE: usize = 25;

/// Index layout and query tuning shared by writers and readers.
///
/// Every field must agree between the process that wrote the points and the
/// one querying them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    pub table_name: String,
    pub hash_key_attribute_name: String,
    pub range_key_attribute_name: String,
    pub geohash_attribute_name: String,
    pub geo_json_attribute_name: String,
    pub geohash_index_name: String,
    /// Decimal digits of a cell id used as the partition key.
    pub hash_key_length: usize,
    /// Largest gap between two ranges that still merges them into one scan.
    pub merge_threshold: u64,
    /// `[lon, lat]` coordinate order in the stored point payload.
    pub longitude_first: bool,
    pub geo_json_point_type: String,
    pub consistent_read: bool,
    pub batch_write_size: usize,
    pub cover: CoverOptions,
}

/// Step-by-step [`GeoConfig`] construction, validated on `build`.
#[derive(Debug, Clone, Default)]
pub struct GeoConfigBuilder {
    config: GeoConfig,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            hash_key_attribute_name: DEFAULT_HASH_KEY_ATTRIBUTE.to_string(),
            range_key_attribute_name: DEFAULT_RANGE_KEY_ATTRIBUTE.to_string(),
            geohash_attribute_name: DEFAULT_GEOHASH_ATTRIBUTE.to_string(),
            geo_json_attribute_name: DEFAULT_GEO_JSON_ATTRIBUTE.to_string(),
            geohash_index_name: DEFAULT_GEOHASH_INDEX.to_string(),
            hash_key_length: DEFAULT_HASH_KEY_LENGTH,
            merge_threshold: DEFAULT_MERGE_THRESHOLD,
            longitude_first: true,
            geo_json_point_type: DEFAULT_POINT_TYPE.to_string(),
            consistent_read: false,
            batch_write_size: DEFAULT_BATCH_WRITE_SIZE,
            cover: CoverOptions::default(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Own methods
////////////////////////////////////////////////////////////////////////////////

impl GeoConfig {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Default::default()
        }
    }

    pub fn builder() -> GeoConfigBuilder {
        GeoConfigBuilder::default()
    }

    pub fn validate(&self) -> GeoResult<()> {
        if self.hash_key_length == 0 || self.hash_key_length > MAX_HASH_KEY_LENGTH {
            return Err(GeoError::InvalidHashKeyLength(self.hash_key_length));
        }
        if self.batch_write_size == 0 {
            return Err(GeoError::Config(
                "batch_write_size must be at least 1".to_string(),
            ));
        }
        for (field, value) in [
            ("hash_key_attribute_name", &self.hash_key_attribute_name),
            ("range_key_attribute_name", &self.range_key_attribute_name),
            ("geohash_attribute_name", &self.geohash_attribute_name),
            ("geo_json_attribute_name", &self.geo_json_attribute_name),
        ] {
            if value.is_empty() {
                return Err(GeoError::Config(format!("{field} must not be empty")));
            }
        }
        self.cover.validate()
    }

    /// Attribute names a caller may not supply or overwrite.
    pub fn reserved_attributes(&self) -> [&str; 4] {
        [
            &self.hash_key_attribute_name,
            &self.range_key_attribute_name,
            &self.geohash_attribute_name,
            &self.geo_json_attribute_name,
        ]
    }
}

impl GeoConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table_name(
        mut self,
        name: impl Into<String>,
    ) -> Self {
        self.config.table_name = name.into();
        self
    }

    pub fn hash_key_attribute_name(
        mut self,
        name: impl Into<String>,
    ) -> Self {
        self.config.hash_key_attribute_name = name.into();
        self
    }

    pub fn range_key_attribute_name(
        mut self,
        name: impl Into<String>,
    ) -> Self {
        self.config.range_key_attribute_name = name.into();
        self
    }

    pub fn geohash_attribute_name(
        mut self,
        name: impl Into<String>,
    ) -> Self {
        self.config.geohash_attribute_name = name.into();
        self
    }

    pub fn geo_json_attribute_name(
        mut self,
        name: impl Into<String>,
    ) -> Self {
        self.config.geo_json_attribute_name = name.into();
        self
    }

    pub fn geohash_index_name(
        mut self,
        name: impl Into<String>,
    ) -> Self {
        self.config.geohash_index_name = name.into();
        self
    }

    pub fn hash_key_length(
        mut self,
        length: usize,
    ) -> Self {
        self.config.hash_key_length = length;
        self
    }

    pub fn merge_threshold(
        mut self,
        threshold: u64,
    ) -> Self {
        self.config.merge_threshold = threshold;
        self
    }

    pub fn longitude_first(
        mut self,
        longitude_first: bool,
    ) -> Self {
        self.config.longitude_first = longitude_first;
        self
    }

    pub fn geo_json_point_type(
        mut self,
        point_type: impl Into<String>,
    ) -> Self {
        self.config.geo_json_point_type = point_type.into();
        self
    }

    pub fn consistent_read(
        mut self,
        consistent_read: bool,
    ) -> Self {
        self.config.consistent_read = consistent_read;
        self
    }

    pub fn batch_write_size(
        mut self,
        size: usize,
    ) -> Self {
        self.config.batch_write_size = size;
        self
    }

    pub fn cover_options(
        mut self,
        cover: CoverOptions,
    ) -> Self {
        self.config.cover = cover;
        self
    }

    /// Validates and returns the config.
    pub fn build(self) -> GeoResult<GeoConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
