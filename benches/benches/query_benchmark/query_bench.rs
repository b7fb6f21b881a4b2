//! Benchmarks for query planning and execution.
//!
//! Run: `cargo bench -p geoscan-benchmark --bench query_benchmark`

use std::{hint::black_box, sync::Arc};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use geoscan::{
    model::merge_ranges, CoverOptions, GeoConfig, GeoDataManager, GeoPoint, GeohashRange,
    InMemoryStore, LatLngRect, PutPointInput, QueryRadiusInput, QueryRectangleInput,
    RegionCoverer, S2Coverer,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::runtime::Runtime;

const SEED: u64 = 0x6765_6f73;

/// Random points in a box around London.
fn generate_points(count: usize) -> Vec<PutPointInput> {
    let mut rng = StdRng::seed_from_u64(SEED);
    (0..count)
        .map(|i| {
            let lat = rng.gen_range(50.5..52.5);
            let lon = rng.gen_range(-1.5..1.5);
            PutPointInput::new(format!("point_{i}"), GeoPoint::new(lat, lon))
        })
        .collect()
}

fn loaded_manager(
    rt: &Runtime,
    count: usize,
) -> GeoDataManager<InMemoryStore> {
    let manager = GeoDataManager::new(Arc::new(InMemoryStore::new()), GeoConfig::default())
        .expect("default config is valid");
    let points = generate_points(count);
    rt.block_on(async {
        for chunk in points.chunks(manager.config().batch_write_size) {
            manager
                .batch_write_points(chunk.to_vec())
                .await
                .expect("batch write");
        }
    });
    manager
}

/// Benchmark: covering rectangles of growing size.
fn bench_covering(c: &mut Criterion) {
    let mut group = c.benchmark_group("covering");

    for span in [0.01, 0.1, 1.0, 10.0] {
        let rect = LatLngRect::from_degrees(51.0, -0.5, 51.0 + span, -0.5 + span);
        for max_cells in [8, 32] {
            let options = CoverOptions {
                max_cells,
                ..CoverOptions::default()
            };
            group.bench_with_input(
                BenchmarkId::new(format!("max_cells_{max_cells}"), span),
                &rect,
                |b, rect| b.iter(|| black_box(S2Coverer.cover(rect, &options))),
            );
        }
    }

    group.finish();
}

/// Benchmark: split and merge of a range that crosses many partitions.
fn bench_split_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_merge");
    let range = GeohashRange::new(5_177_531_549_489_041_509, 5_179_531_549_489_041_509);

    for hash_key_length in [2, 4, 6] {
        let pieces = range.try_split(hash_key_length);
        group.throughput(Throughput::Elements(pieces.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("split", hash_key_length),
            &hash_key_length,
            |b, &len| b.iter(|| black_box(range.try_split(len))),
        );
        group.bench_with_input(
            BenchmarkId::new("merge", hash_key_length),
            &pieces,
            |b, pieces| b.iter(|| black_box(merge_ranges(pieces.clone(), 2, hash_key_length))),
        );
    }

    group.finish();
}

/// Benchmark: radius and rectangle queries on different dataset sizes.
fn bench_queries(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("query");
    group.sample_size(30);

    for size in [1_000, 10_000] {
        let manager = loaded_manager(&rt, size);
        group.throughput(Throughput::Elements(size as u64));

        let radius = QueryRadiusInput::new(GeoPoint::new(51.51, -0.13), 10_000.0);
        group.bench_with_input(BenchmarkId::new("radius_10km", size), &radius, |b, input| {
            b.iter(|| black_box(rt.block_on(manager.query_radius(input)).expect("query")))
        });

        let rect = QueryRectangleInput::new(GeoPoint::new(51.3, -0.5), GeoPoint::new(51.7, 0.3));
        group.bench_with_input(BenchmarkId::new("rectangle", size), &rect, |b, input| {
            b.iter(|| black_box(rt.block_on(manager.query_rectangle(input)).expect("query")))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_covering, bench_split_merge, bench_queries);
criterion_main!(benches);
