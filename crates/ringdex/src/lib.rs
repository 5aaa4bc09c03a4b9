//! Ringdex - Indexed Ring-Buffer Cache
//!
//! A fixed-capacity, FIFO-style in-memory store mapping user-supplied
//! identifiers to structured records. The oldest occupant is evicted
//! when a slot is reused, an external sink is notified of every
//! eviction, and an optional capacity controller resizes the ring from
//! the observed ingestion rate so records stay resident for a target
//! duration.
//!
//! All durable state lives in a pluggable shared store (three keyed
//! namespaces with atomic `incr` and first-writer-wins `add`), so one
//! cache can be shared by many parallel request handlers: every
//! operation is `&self`, bounded, and non-blocking modulo store latency.
//!
//! # Example
//!
//! ```
//! use ringdex::{FieldSpec, FieldValue, IndexedRing, MemoryStore, RingConfig};
//! use std::sync::Arc;
//!
//! let config = RingConfig::new(vec![
//!     FieldSpec::new("status").lock_key(),
//!     FieldSpec::new("owner").immutable(),
//!     FieldSpec::new("note").mutable(),
//! ])
//! .with_initial_size(10_000);
//!
//! let cache = IndexedRing::new(config, Arc::new(MemoryStore::new())).unwrap();
//!
//! let mut fields = ringdex::Fields::new();
//! fields.insert("status".into(), FieldValue::from("open"));
//! cache.set("ticket-1", &fields);
//!
//! let record = cache.get("ticket-1").unwrap();
//! assert_eq!(record["status"], FieldValue::from("open"));
//! ```

mod config;
mod controller;
mod eject;
mod error;
mod record;
mod ring;
mod schema;
mod stats;
mod store;
mod time;

pub use config::RingConfig;
pub use eject::{EjectRequest, EjectSink, EjectTransport, NullSink};
pub use error::{EjectError, SchemaError, StoreError};
pub use record::{FieldValue, Fields, Readable, Record, SlotEntry};
pub use ring::{IndexedRing, IndexedRingBuilder};
pub use schema::{FieldSpec, Schema};
pub use stats::{ns, StatsSnapshot};
pub use store::{MemoryStore, Namespace, SharedStore};
pub use time::{Clock, ManualClock, SystemClock};
