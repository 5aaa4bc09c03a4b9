//! Shared-store abstraction: the only durable state the cache has.
//!
//! The core opens three namespaces — `ring` (slot → record), `index`
//! (id → slot), `stats` (counters and control flags) — and reaches them
//! exclusively through the [`Namespace`] trait. Any keyed backend with
//! atomic `incr` and first-writer-wins `add` can sit behind it; the
//! in-process [`MemoryStore`] is the reference implementation and the
//! default for tests and single-process deployments.

use crate::error::StoreError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One keyed namespace of the shared store.
///
/// Values are opaque strings. `set`/`get`/`delete` are per-key
/// last-writer-wins; `incr` and `add` must be atomic with respect to all
/// other operations on the same namespace.
pub trait Namespace: Send + Sync {
    /// Returns the value under `key`, if present.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`. Removing an absent key is a no-op.
    fn delete(&self, key: &str);

    /// Atomically adds `delta` to the integer under `key` and returns the
    /// post-increment value. An absent key counts as 0, so the first
    /// `incr(key, 1)` returns 1.
    fn incr(&self, key: &str, delta: i64) -> Result<i64, StoreError>;

    /// Stores `value` under `key` only if the key is absent. Returns
    /// `true` if this caller's write won. First-writer-wins: this is the
    /// store's mutex primitive.
    fn add(&self, key: &str, value: &str) -> Result<bool, StoreError>;

    /// Removes every key in the namespace.
    fn flush_all(&self);
}

/// Factory for namespaces. Asking twice for the same name must yield
/// handles over the same underlying data.
pub trait SharedStore: Send + Sync {
    /// Opens (or creates) the namespace called `name`.
    fn namespace(&self, name: &str) -> Arc<dyn Namespace>;
}

/// In-process reference store: one `Mutex<HashMap>` per namespace.
///
/// `incr` and `add` hold the namespace lock across read-modify-write, so
/// they are atomic exactly as the trait requires.
#[derive(Default)]
pub struct MemoryStore {
    namespaces: Mutex<HashMap<String, Arc<MemoryNamespace>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SharedStore for MemoryStore {
    fn namespace(&self, name: &str) -> Arc<dyn Namespace> {
        let mut namespaces = self.namespaces.lock().unwrap();
        Arc::clone(
            namespaces
                .entry(name.to_owned())
                .or_insert_with(|| Arc::new(MemoryNamespace::default())),
        ) as Arc<dyn Namespace>
    }
}

/// A single in-memory namespace.
#[derive(Default)]
pub struct MemoryNamespace {
    entries: Mutex<HashMap<String, String>>,
}

impl Namespace for MemoryNamespace {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn delete(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }

    fn incr(&self, key: &str, delta: i64) -> Result<i64, StoreError> {
        let mut entries = self.entries.lock().unwrap();
        let current = match entries.get(key) {
            Some(raw) => raw.parse::<i64>().map_err(|_| StoreError::NotNumeric {
                key: key.to_owned(),
            })?,
            None => 0,
        };
        let next = current + delta;
        entries.insert(key.to_owned(), next.to_string());
        Ok(next)
    }

    fn add(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_owned(), value.to_owned());
        Ok(true)
    }

    fn flush_all(&self) {
        self.entries.lock().unwrap().clear();
    }
}
