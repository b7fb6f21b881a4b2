use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a [`GeoStore`](crate::engine::GeoStore) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid continuation token: {0}")]
    InvalidContinuationToken(String),

    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    #[error("Item not found: hash key {hash_key}, range key '{range_key}'")]
    ItemNotFound { hash_key: i64, range_key: String },

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
