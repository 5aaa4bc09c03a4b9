//! Deterministic traffic simulation for the ringdex cache.
//!
//! Drives several monitoring windows of seeded random traffic against an
//! auto-resizing ring over the in-memory store, with a manual clock so
//! the run is reproducible. Each window changes the ingestion rate to
//! show the controller chasing the residency target; the run ends with a
//! full drain.
//!
//! Run with `RUST_LOG=debug` to see per-slot eviction traffic.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use ringdex::{
    Clock, EjectError, FieldSpec, FieldValue, Fields, IndexedRing, ManualClock, MemoryStore,
    Readable, RingConfig,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const SEED: u64 = 0x5eed_cafe;

/// New-id inserts per simulated minute, one entry per monitoring window.
const WINDOW_RATES: &[u64] = &[100, 400, 400, 150, 50, 50];

fn main() {
    init_tracing();

    let evictions = Arc::new(AtomicU64::new(0));
    let drained = Arc::new(AtomicU64::new(0));
    let sink = {
        let evictions = Arc::clone(&evictions);
        let drained = Arc::clone(&drained);
        move |_id: &str, _record: &Readable, is_full_drain: bool| -> Result<(), EjectError> {
            if is_full_drain {
                drained.fetch_add(1, Ordering::Relaxed);
            } else {
                evictions.fetch_add(1, Ordering::Relaxed);
            }
            Ok(())
        }
    };

    let clock = Arc::new(ManualClock::new(0));
    let config = RingConfig::new(vec![
        FieldSpec::new("visitor").lock_key(),
        FieldSpec::new("source").immutable(),
        FieldSpec::new("score").mutable(),
        FieldSpec::new("note"),
    ])
    .with_initial_size(2_000)
    .with_auto_resize(true)
    .with_auto_bounds(500, 50_000)
    .with_desired_eject_mins(15.0)
    .with_monitor_period_mins(10.0);
    let monitor_period_mins = config.monitor_period_mins as u64;

    let cache = IndexedRing::builder(config, Arc::new(MemoryStore::new()))
        .sink(Arc::new(sink))
        .clock(Arc::clone(&clock) as Arc<dyn Clock>)
        .build()
        .expect("schema compiles");

    let mut rng = SmallRng::seed_from_u64(SEED);
    let mut next_id = 0u64;

    for (window, &rate) in WINDOW_RATES.iter().enumerate() {
        for _ in 0..monitor_period_mins {
            for _ in 0..rate {
                let id = insert(&cache, &mut rng, &mut next_id);
                // Roughly a third of ids see a follow-up update.
                if rng.gen_bool(0.3) {
                    update(&cache, &id, &mut rng);
                }
            }
            clock.advance(60);
        }
        // Push past the window boundary so the next insert evaluates it.
        clock.advance(1);
        insert(&cache, &mut rng, &mut next_id);

        let stats = cache.stats();
        info!(
            window,
            rate_per_min = rate,
            current_size = stats.current_size,
            last_period_avg_mins = stats.last_period_avg_mins,
            total_item_count = stats.total_item_count,
            evictions = evictions.load(Ordering::Relaxed),
            "window closed"
        );
    }

    assert!(cache.drain(), "no competing drain in the simulation");
    let stats = cache.stats();
    info!(
        drained = drained.load(Ordering::Relaxed),
        total_req_count = stats.total_req_count,
        total_item_count = stats.total_item_count,
        server_start = %stats.server_start,
        "simulation complete"
    );
}

fn insert(cache: &IndexedRing, rng: &mut SmallRng, next_id: &mut u64) -> String {
    let id = format!("visitor-{}", *next_id);
    *next_id += 1;

    let mut fields = Fields::new();
    fields.insert("visitor".into(), FieldValue::from(id.as_str()));
    fields.insert(
        "source".into(),
        FieldValue::from(["direct", "search", "referral"][rng.gen_range(0..3)]),
    );
    fields.insert("score".into(), FieldValue::Int(rng.gen_range(0..100)));
    cache.set(&id, &fields);
    id
}

fn update(cache: &IndexedRing, id: &str, rng: &mut SmallRng) {
    let mut fields = Fields::new();
    fields.insert("score".into(), FieldValue::Int(rng.gen_range(0..100)));
    fields.insert("note".into(), FieldValue::from("revisit"));
    cache.set(id, &fields);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}
