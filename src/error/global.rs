use thiserror::Error;

use super::StoreError;

pub type GeoResult<T> = Result<T, GeoError>;

#[derive(Error, Debug)]
pub enum GeoError {
    // ==== Input ====
    #[error("Missing required point: {0}")]
    MissingPoint(&'static str),

    #[error("Invalid point (lat {lat}, lon {lon}): {reason}")]
    InvalidPoint { lat: f64, lon: f64, reason: String },

    #[error("Invalid radius: {0} meters (must be a positive finite number)")]
    InvalidRadius(f64),

    #[error("Invalid hash key length: {0} (expected 1..=19 digits)")]
    InvalidHashKeyLength(usize),

    #[error("Invalid cover options: {0}")]
    InvalidCoverOptions(String),

    #[error("Batch of {size} points exceeds the batch write limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    // ==== Protected attributes ====
    #[error(
        "Cannot update protected attribute: {attribute}{}. The attribute is auto-generated from the point location and cannot be modified directly",
        .alias.as_ref().map(|a| format!(" (referenced as {a})")).unwrap_or_default()
    )]
    ProtectedAttribute {
        attribute: String,
        alias: Option<String>,
    },

    // ==== Stored data ====
    #[error("Malformed point payload '{payload}': {reason}")]
    GeoJson { payload: String, reason: String },

    // ==== Store / runtime ====
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Range scan task failed: {0}")]
    Task(String),
}

impl From<config::ConfigError> for GeoError {
    fn from(err: config::ConfigError) -> Self {
        GeoError::Config(err.to_string())
    }
}

impl GeoError {
    /// `true` for errors raised before any store I/O took place.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            GeoError::MissingPoint(_)
                | GeoError::InvalidPoint { .. }
                | GeoError::InvalidRadius(_)
                | GeoError::InvalidHashKeyLength(_)
                | GeoError::InvalidCoverOptions(_)
                | GeoError::BatchTooLarge { .. }
                | GeoError::ProtectedAttribute { .. }
        )
    }
}
