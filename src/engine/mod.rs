//! Storage boundary: the async [`GeoStore`] trait, its in-memory
//! implementation and item updates.

pub mod memory;
pub mod storage;
pub mod update;

pub use memory::{InMemoryStore, StoreStatsSnapshot, DEFAULT_PAGE_SIZE};
pub use storage::{
    Attributes, BatchWriteOutput, ContinuationToken, GeoItem, GeoStore, PrimaryKey, ScanPage,
    ScanRequest,
};
pub use update::{
    validate_protected_attributes, AttributeAction, AttributeValueUpdate, UpdateItemInput,
    UpdateItemRequest,
};
