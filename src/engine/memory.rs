use std::{
    collections::{BTreeSet, HashMap},
    ops::Bound,
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::{
    storage::{
        BatchWriteOutput, ContinuationToken, GeoItem, GeoStore, PrimaryKey, ScanPage, ScanRequest,
    },
    update::{apply_update, UpdateItemRequest},
};
use crate::error::{StoreError, StoreResult};

pub const DEFAULT_PAGE_SIZE: usize = 100;

/// One partition: items by range key plus the `(geohash, range_key)` index.
#[derive(Debug, Default)]
struct Partition {
    items: HashMap<String, GeoItem>,
    index: BTreeSet<(i64, String)>,
}

/// Decoded form of a [`ContinuationToken`].
#[derive(Debug, Serialize, Deserialize)]
struct ResumeKey {
    hash_key: i64,
    geohash: i64,
    range_key: String,
}

/// Request counters, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct StoreStats {
    pub query_requests: AtomicU64,
    pub items_returned: AtomicU64,
    pub write_requests: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStatsSnapshot {
    pub query_requests: u64,
    pub items_returned: u64,
    pub write_requests: u64,
}

/// In-process [`GeoStore`] with the partitioning and paging behaviour of a
/// remote key-value table.
#[derive(Debug)]
pub struct InMemoryStore {
    partitions: DashMap<i64, Partition>,
    page_size: usize,
    stats: StoreStats,
}

impl Partition {
    fn insert(
        &mut self,
        item: GeoItem,
    ) -> Option<GeoItem> {
        let entry = (item.geohash, item.range_key.clone());
        let previous = self.items.insert(item.range_key.clone(), item);
        if let Some(old) = &previous {
            self.index.remove(&(old.geohash, old.range_key.clone()));
        }
        self.index.insert(entry);
        previous
    }

    fn remove(
        &mut self,
        range_key: &str,
    ) -> Option<GeoItem> {
        let item = self.items.remove(range_key)?;
        self.index.remove(&(item.geohash, item.range_key.clone()));
        Some(item)
    }
}

impl StoreStats {
    pub fn snapshot(&self) -> StoreStatsSnapshot {
        StoreStatsSnapshot {
            query_requests: self.query_requests.load(Ordering::Relaxed),
            items_returned: self.items_returned.load(Ordering::Relaxed),
            write_requests: self.write_requests.load(Ordering::Relaxed),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Own methods
////////////////////////////////////////////////////////////////////////////////

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Store returning at most `page_size` items per scan request.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            partitions: DashMap::new(),
            page_size: page_size.max(1),
            stats: StoreStats::default(),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn stats(&self) -> StoreStatsSnapshot {
        self.stats.snapshot()
    }

    /// Total number of stored items.
    pub fn len(&self) -> usize {
        self.partitions.iter().map(|p| p.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    fn encode_token(
        hash_key: i64,
        item: &GeoItem,
    ) -> StoreResult<ContinuationToken> {
        let key = ResumeKey {
            hash_key,
            geohash: item.geohash,
            range_key: item.range_key.clone(),
        };
        Ok(ContinuationToken(serde_json::to_string(&key)?))
    }

    fn decode_token(
        token: &ContinuationToken,
        request: &ScanRequest,
    ) -> StoreResult<ResumeKey> {
        let key: ResumeKey = serde_json::from_str(&token.0)
            .map_err(|e| StoreError::InvalidContinuationToken(e.to_string()))?;
        if key.hash_key != request.hash_key
            || key.geohash < request.range.range_min
            || key.geohash > request.range.range_max
        {
            return Err(StoreError::InvalidContinuationToken(format!(
                "token {token} does not belong to partition {} range [{}, {}]",
                request.hash_key, request.range.range_min, request.range.range_max
            )));
        }
        Ok(key)
    }

    fn insert_item(
        &self,
        item: GeoItem,
    ) -> Option<GeoItem> {
        self.partitions
            .entry(item.hash_key)
            .or_default()
            .insert(item)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GeoStore for InMemoryStore {
    async fn query_page(
        &self,
        request: ScanRequest,
    ) -> StoreResult<ScanPage> {
        self.stats.query_requests.fetch_add(1, Ordering::Relaxed);

        let start = match &request.exclusive_start_key {
            Some(token) => {
                let key = Self::decode_token(token, &request)?;
                Bound::Excluded((key.geohash, key.range_key))
            }
            None => Bound::Included((request.range.range_min, String::new())),
        };

        let Some(partition) = self.partitions.get(&request.hash_key) else {
            return Ok(ScanPage::default());
        };

        let limit = request.limit.unwrap_or(self.page_size).max(1);
        let range_max = request.range.range_max;
        let (items, more) = {
            let mut matching = partition
                .index
                .range((start, Bound::Unbounded))
                .take_while(|(geohash, _)| *geohash <= range_max);

            let mut items = Vec::with_capacity(limit.min(64));
            for (_, range_key) in matching.by_ref().take(limit) {
                if let Some(item) = partition.items.get(range_key) {
                    items.push(item.clone());
                }
            }
            (items, matching.next().is_some())
        };
        drop(partition);

        let last_evaluated_key = match items.last() {
            Some(last) if more => Some(Self::encode_token(request.hash_key, last)?),
            _ => None,
        };

        self.stats
            .items_returned
            .fetch_add(items.len() as u64, Ordering::Relaxed);
        Ok(ScanPage {
            items,
            last_evaluated_key,
        })
    }

    async fn put_item(
        &self,
        item: GeoItem,
    ) -> StoreResult<Option<GeoItem>> {
        self.stats.write_requests.fetch_add(1, Ordering::Relaxed);
        Ok(self.insert_item(item))
    }

    async fn get_item(
        &self,
        key: &PrimaryKey,
        _consistent_read: bool,
    ) -> StoreResult<Option<GeoItem>> {
        Ok(self
            .partitions
            .get(&key.hash_key)
            .and_then(|p| p.items.get(&key.range_key).cloned()))
    }

    async fn delete_item(
        &self,
        key: &PrimaryKey,
    ) -> StoreResult<Option<GeoItem>> {
        self.stats.write_requests.fetch_add(1, Ordering::Relaxed);
        let removed = self
            .partitions
            .get_mut(&key.hash_key)
            .and_then(|mut p| p.remove(&key.range_key));
        self.partitions
            .remove_if(&key.hash_key, |_, p| p.items.is_empty());
        Ok(removed)
    }

    async fn update_item(
        &self,
        request: UpdateItemRequest,
    ) -> StoreResult<GeoItem> {
        self.stats.write_requests.fetch_add(1, Ordering::Relaxed);
        let not_found = || StoreError::ItemNotFound {
            hash_key: request.key.hash_key,
            range_key: request.key.range_key.clone(),
        };

        let mut partition = self
            .partitions
            .get_mut(&request.key.hash_key)
            .ok_or_else(not_found)?;
        let item = partition
            .items
            .get_mut(&request.key.range_key)
            .ok_or_else(not_found)?;
        apply_update(item, &request.input)?;
        Ok(item.clone())
    }

    async fn batch_write(
        &self,
        items: Vec<GeoItem>,
    ) -> StoreResult<BatchWriteOutput> {
        self.stats.write_requests.fetch_add(1, Ordering::Relaxed);
        let written = items.len();
        for item in items {
            self.insert_item(item);
        }
        Ok(BatchWriteOutput {
            written,
            unprocessed_items: Vec::new(),
        })
    }
}
