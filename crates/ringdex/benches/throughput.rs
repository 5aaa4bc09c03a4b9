use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ringdex::{FieldSpec, FieldValue, Fields, IndexedRing, MemoryStore, NullSink, RingConfig};
use std::sync::Arc;

const OPS: u64 = 10_000;

fn fields(value: &str) -> Fields {
    let mut fields = Fields::new();
    fields.insert("a".into(), FieldValue::from(value));
    fields.insert("b".into(), FieldValue::from(1_i64));
    fields
}

fn new_cache(capacity: u64) -> IndexedRing {
    let config = RingConfig::new(vec![
        FieldSpec::new("a"),
        FieldSpec::new("b"),
        FieldSpec::new("c").mutable(),
    ])
    .with_initial_size(capacity);
    IndexedRing::builder(config, Arc::new(MemoryStore::new()))
        .sink(Arc::new(NullSink))
        .build()
        .unwrap()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    group.throughput(Throughput::Elements(OPS));

    // Capacity above OPS: pure insertion, no eviction traffic.
    group.bench_function("new_ids", |b| {
        b.iter(|| {
            let cache = new_cache(OPS * 2);
            let payload = fields("v");
            for i in 0..OPS {
                cache.set(&format!("id-{i}"), black_box(&payload));
            }
        });
    });

    // Capacity far below OPS: every wrap evicts through the null sink.
    group.bench_function("new_ids_with_eviction", |b| {
        b.iter(|| {
            let cache = new_cache(OPS / 10);
            let payload = fields("v");
            for i in 0..OPS {
                cache.set(&format!("id-{i}"), black_box(&payload));
            }
        });
    });

    group.finish();
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("update");
    group.throughput(Throughput::Elements(OPS));

    group.bench_function("merge_in_place", |b| {
        let cache = new_cache(64);
        cache.set("hot", &fields("v"));
        let payload = fields("w");
        b.iter(|| {
            for _ in 0..OPS {
                cache.set("hot", black_box(&payload));
            }
        });
    });

    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(OPS));

    group.bench_function("resident_id", |b| {
        let cache = new_cache(64);
        cache.set("hot", &fields("v"));
        b.iter(|| {
            for _ in 0..OPS {
                black_box(cache.get(black_box("hot")));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_insert, bench_update, bench_get);
criterion_main!(benches);
