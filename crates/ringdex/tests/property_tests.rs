//! Property-based tests for the ring invariants.
//!
//! Coverage:
//! - resident ids never exceed capacity, for any insert sequence
//! - a drained ring is empty with the cursor reset
//! - merge is monotonic with respect to lock state
//! - two sets compose exactly like two merges (no-eviction window)

use proptest::prelude::*;
use ringdex::{FieldSpec, FieldValue, Fields, IndexedRing, MemoryStore, RingConfig};
use std::sync::Arc;

fn field_names() -> &'static [&'static str] {
    &["lock", "owner", "note", "plain"]
}

fn schema_params() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("lock").lock_key(),
        FieldSpec::new("owner").immutable(),
        FieldSpec::new("note").mutable(),
        FieldSpec::new("plain"),
    ]
}

/// Maps of known field names to short values; empty strings included so
/// the unset sentinel gets exercised.
fn fields_strategy() -> impl Strategy<Value = Fields> {
    prop::collection::btree_map(
        prop::sample::select(field_names()).prop_map(str::to_owned),
        "[a-z]{0,3}".prop_map(FieldValue::from),
        0..4,
    )
}

fn new_cache(capacity: u64) -> IndexedRing {
    IndexedRing::new(
        RingConfig::new(schema_params()).with_initial_size(capacity),
        Arc::new(MemoryStore::new()),
    )
    .unwrap()
}

proptest! {
    /// Resident ids never exceed `currentSize`, whatever the insert mix.
    #[test]
    fn prop_resident_ids_bounded_by_capacity(
        capacity in 1u64..8,
        ops in prop::collection::vec((0usize..20, fields_strategy()), 1..120),
    ) {
        let cache = new_cache(capacity);

        for (id_index, fields) in &ops {
            cache.set(&format!("id-{id_index}"), fields);
        }

        let resident = (0..20)
            .filter(|i| cache.get(&format!("id-{i}")).is_some())
            .count() as u64;
        prop_assert!(
            resident <= capacity,
            "{resident} resident ids in a {capacity}-slot ring"
        );
    }

    /// After a drain the ring holds nothing and the cursor restarts.
    #[test]
    fn prop_drain_leaves_nothing_resident(
        ops in prop::collection::vec((0usize..10, fields_strategy()), 1..60),
    ) {
        let cache = new_cache(4);

        for (id_index, fields) in &ops {
            cache.set(&format!("id-{id_index}"), fields);
        }

        prop_assert!(cache.drain());

        for i in 0..10 {
            let key = format!("id-{i}");
            prop_assert!(cache.get(&key).is_none());
        }

        // The ring accepts writes again, starting from slot 1.
        let mut fields = Fields::new();
        fields.insert("plain".into(), FieldValue::from("x"));
        cache.set("fresh", &fields);
        prop_assert!(cache.get("fresh").is_some());
    }

    /// Once the lock field is set, later merges leave every non-mutable,
    /// already-populated field unchanged.
    #[test]
    fn prop_merge_is_lock_monotonic(
        first in fields_strategy(),
        later in prop::collection::vec(fields_strategy(), 1..6),
    ) {
        let cache = new_cache(16);

        let mut locking = first.clone();
        locking.insert("lock".into(), FieldValue::from("held"));
        cache.set("t", &locking);

        let before = cache.get("t").unwrap();

        for fields in &later {
            cache.set("t", fields);
        }
        let after = cache.get("t").unwrap();

        for name in field_names() {
            if *name == "note" {
                continue; // explicitly mutable
            }
            if let Some(value) = before.get(*name) {
                prop_assert_eq!(
                    after.get(*name),
                    Some(value),
                    "locked field {} changed",
                    name
                );
            }
        }
    }

    /// `set(id, x); set(id, y)` observes exactly `merge(merge(∅, x), y)`
    /// projected to readable names, absent any eviction of `id`.
    #[test]
    fn prop_two_sets_compose_like_two_merges(
        x in fields_strategy(),
        y in fields_strategy(),
    ) {
        let cache = new_cache(16);
        cache.set("id", &x);
        cache.set("id", &y);

        let schema = cache.schema();
        let mut expected = schema.build_record(&x);
        schema.merge_into(&mut expected, &y);

        prop_assert_eq!(cache.get("id").unwrap(), schema.readable(&expected));
    }
}
