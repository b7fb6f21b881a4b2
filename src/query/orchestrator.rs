//! Planning and fan-out execution of curve-range scans.
//!
//! A query is turned into a [`QueryPlan`] (region -> covering -> split and
//! merged ranges), then every range is scanned on its own tokio task. Pages
//! within one range are fetched strictly in order; ranges run concurrently.
//! The first failing range aborts the others.

use std::{collections::HashSet, sync::Arc};

use tokio::task::JoinSet;
use tracing::{debug, field, info_span, warn, Instrument};

use super::{
    filter::ExactFilter,
    request::{QueryOptions, QueryOutput, QueryPlan, QueryStats},
};
use crate::{
    config::GeoConfig,
    curve::RegionCoverer,
    engine::{GeoItem, GeoStore, PrimaryKey, ScanRequest},
    error::{GeoError, GeoResult},
    geo::{region::describe, LatLngRect},
    model::{merge_ranges, Covering, GeohashRange},
};

/// Result of one fully paginated range scan.
#[derive(Debug, Default)]
struct RangeScan {
    items: Vec<GeoItem>,
    pages: usize,
}

/// Computes the scans needed to cover `region`.
pub fn plan_region(
    region: LatLngRect,
    coverer: &dyn RegionCoverer,
    config: &GeoConfig,
) -> QueryPlan {
    let covering = Covering::new(coverer.cover(&region, &config.cover));
    let split = covering.get_geohash_ranges(config.hash_key_length);
    let split_count = split.len();
    let ranges = merge_ranges(split, config.merge_threshold, config.hash_key_length);

    debug!(
        region = %describe(&region),
        cells = covering.number_of_cells(),
        split_ranges = split_count,
        ranges = ranges.len(),
        "Planned query"
    );

    QueryPlan {
        region,
        cell_count: covering.number_of_cells(),
        ranges,
        hash_key_length: config.hash_key_length,
    }
}

/// Scans one range to exhaustion, threading continuation tokens in order.
async fn scan_range<S: GeoStore>(
    store: Arc<S>,
    hash_key: i64,
    range: GeohashRange,
    limit: Option<usize>,
    consistent_read: bool,
) -> GeoResult<RangeScan> {
    let mut scan = RangeScan::default();
    let mut request = ScanRequest {
        hash_key,
        range,
        exclusive_start_key: None,
        limit,
        consistent_read,
    };

    loop {
        let page = store.query_page(request.clone()).await?;
        scan.pages += 1;
        scan.items.extend(page.items);
        match page.last_evaluated_key {
            Some(token) => request.exclusive_start_key = Some(token),
            None => break,
        }
    }

    debug!(
        hash_key,
        range_min = range.range_min,
        range_max = range.range_max,
        pages = scan.pages,
        items = scan.items.len(),
        "Range scan complete"
    );
    Ok(scan)
}

/// Runs every range scan concurrently and returns their results in plan
/// order.
async fn scan_all<S: GeoStore>(
    store: &Arc<S>,
    plan: &QueryPlan,
    limit: Option<usize>,
    consistent_read: bool,
) -> GeoResult<Vec<RangeScan>> {
    let mut tasks = JoinSet::new();
    for (idx, (hash_key, range)) in plan.scans().enumerate() {
        let store = Arc::clone(store);
        tasks.spawn(
            async move {
                (
                    idx,
                    scan_range(store, hash_key, range, limit, consistent_read).await,
                )
            }
            .in_current_span(),
        );
    }

    let mut results: Vec<Option<RangeScan>> = Vec::new();
    results.resize_with(plan.ranges.len(), || None);

    while let Some(joined) = tasks.join_next().await {
        let outcome = match joined {
            Ok((idx, Ok(scan))) => {
                results[idx] = Some(scan);
                continue;
            }
            Ok((idx, Err(e))) => {
                warn!(range = idx, error = %e, "Range scan failed, aborting query");
                e
            }
            Err(join_err) => GeoError::Task(join_err.to_string()),
        };
        tasks.abort_all();
        return Err(outcome);
    }

    Ok(results.into_iter().flatten().collect())
}

/// Executes `plan`, deduplicates by primary key and keeps only items
/// inside `filter`.
pub async fn execute_plan<S: GeoStore>(
    store: &Arc<S>,
    plan: &QueryPlan,
    filter: &ExactFilter,
    config: &GeoConfig,
    options: &QueryOptions,
) -> GeoResult<QueryOutput> {
    let span = info_span!(
        "geo_query",
        shape = filter.shape(),
        cells = plan.cell_count,
        ranges = plan.ranges.len(),
        pages = field::Empty,
        scanned = field::Empty,
        returned = field::Empty,
    );

    async move {
        let consistent_read = options.consistent_read.unwrap_or(config.consistent_read);
        let scans = scan_all(store, plan, options.limit, consistent_read).await?;

        let mut stats = QueryStats {
            cells: plan.cell_count,
            ranges: plan.ranges.len(),
            ..Default::default()
        };
        let mut seen: HashSet<PrimaryKey> = HashSet::new();
        let mut merged = Vec::new();
        for scan in scans {
            stats.pages += scan.pages;
            stats.scanned += scan.items.len();
            for item in scan.items {
                if seen.insert(item.key()) {
                    merged.push(item);
                }
            }
        }

        let items = filter.apply(merged, config.longitude_first)?;
        stats.returned = items.len();

        let span = tracing::Span::current();
        span.record("pages", stats.pages);
        span.record("scanned", stats.scanned);
        span.record("returned", stats.returned);
        debug!(?stats, "Query complete");

        Ok::<_, GeoError>(QueryOutput { items, stats })
    }
    .instrument(span)
    .await
}
