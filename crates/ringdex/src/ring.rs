//! Ring core: slot discipline, id index, eviction, drain and resize.
//!
//! All durable state lives in three shared-store namespaces; an
//! [`IndexedRing`] handle is effectively stateless past construction and
//! is shared freely between parallel request handlers (`&self`
//! everywhere).
//!
//! Slot discipline: new identifiers reserve a slot by atomically
//! incrementing the `pos` cursor, wrapping to 1 past `currentSize`. The
//! previous occupant of a reused slot is announced to the eviction sink
//! before the new record lands, so the ring is FIFO by slot reuse. The
//! id → slot index is a non-owning location hint: entries may lag behind
//! the ring and are repaired lazily on write, tolerated on read.
//!
//! The wrap reset is not atomic with the increment. A storm of inserts
//! crossing the boundary can briefly land more than one of them on slot
//! 1; the normal overwrite-and-evict path resolves it.

use crate::config::RingConfig;
use crate::controller;
use crate::eject::{EjectBatcher, EjectRequest, EjectSink, EjectTransport};
use crate::error::SchemaError;
use crate::record::{Fields, Readable, SlotEntry};
use crate::schema::Schema;
use crate::stats::{iso8601_utc, key, ns, StatsSnapshot, DRAINING_KEY};
use crate::store::{Namespace, SharedStore};
use crate::time::{Clock, SystemClock};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Fixed-capacity FIFO cache with O(1) id lookup and rate-adaptive
/// capacity.
pub struct IndexedRing {
    schema: Schema,
    config: RingConfig,
    ring: Arc<dyn Namespace>,
    index: Arc<dyn Namespace>,
    stats: Arc<dyn Namespace>,
    sink: Option<Arc<dyn EjectSink>>,
    transport: Option<Arc<dyn EjectTransport>>,
    clock: Arc<dyn Clock>,
}

impl IndexedRing {
    /// Starts building a cache over `store` with the given configuration.
    pub fn builder(config: RingConfig, store: Arc<dyn SharedStore>) -> IndexedRingBuilder {
        IndexedRingBuilder {
            config,
            store,
            sink: None,
            transport: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Builds a cache with no sink, no transport, and the system clock.
    pub fn new(config: RingConfig, store: Arc<dyn SharedStore>) -> Result<Self, SchemaError> {
        Self::builder(config, store).build()
    }

    /// The compiled schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The construction configuration.
    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    // ---------------------------------------------------------------------
    // WRITE PATH
    // ---------------------------------------------------------------------

    /// Inserts a new record or merges into an existing one.
    ///
    /// Silently dropped while a full drain is in flight. An unknown id
    /// reserves the next slot (evicting its previous occupant); a known
    /// id merges in place without touching cursor or index.
    pub fn set(&self, id: &str, fields: &Fields) {
        if self.is_draining() {
            debug!(id, "write dropped: drain in flight");
            return;
        }

        if let Some(pos) = self.index_pos(id) {
            match self.load_slot(pos) {
                Some(entry) if entry.key == id => {
                    let mut record = entry.data;
                    self.schema.merge_into(&mut record, fields);
                    self.store_slot(pos, &SlotEntry::new(id, record));
                    self.count_request();
                    return;
                }
                // Stale mapping (slot empty or owned by another id):
                // repair it and treat the call as an insertion.
                _ => self.index.delete(id),
            }
        }

        self.insert_new(id, fields);
    }

    fn insert_new(&self, id: &str, fields: &Fields) {
        let current_size = self.current_size();

        let mut pos = match self.stats.incr(key::POS, 1) {
            Ok(v) => v as u64,
            Err(err) => {
                warn!(id, %err, "cursor increment failed; write dropped");
                return;
            }
        };
        if pos > current_size {
            // Wrap to slot 1. Not atomic with the increment; see module
            // docs for the bounded storm-at-slot-1 race.
            self.write_stat(key::POS, "1");
            pos = 1;
        }

        if let Some(occupant) = self.load_slot(pos) {
            self.notify_sink(pos, &occupant, false);
            self.index.delete(&occupant.key);
            self.ring.delete(&pos.to_string());
        }

        if let Err(err) = self.index.set(id, &pos.to_string()) {
            warn!(id, pos, %err, "index write failed");
        }
        self.store_slot(pos, &SlotEntry::new(id, self.schema.build_record(fields)));

        self.count_request();
        self.count_item();
        if self.config.auto_resize {
            self.check_size_adjust();
        }
    }

    // ---------------------------------------------------------------------
    // READ PATH
    // ---------------------------------------------------------------------

    /// Returns the readable projection of `id`'s record, if resident.
    ///
    /// A stale index entry produces a miss; it is reported but not
    /// repaired here (the next `set` for the id repairs it).
    pub fn get(&self, id: &str) -> Option<Readable> {
        let pos = self.index_pos(id)?;
        match self.load_slot(pos) {
            Some(entry) if entry.key == id => Some(self.schema.readable(&entry.data)),
            Some(entry) => {
                warn!(id, pos, occupant = %entry.key, "stale index entry on read");
                None
            }
            None => {
                warn!(id, pos, "stale index entry on read: slot empty");
                None
            }
        }
    }

    /// Snapshot of capacity, lifetime counters, rates, and drain state.
    pub fn stats(&self) -> StatsSnapshot {
        let now = self.clock.now_epoch_secs();
        let server_start = self.read_stat_u64(key::SERVER_START).unwrap_or(now);
        let uptime_secs = now.saturating_sub(server_start).max(1) as f64;

        let total_req_count = self.read_stat_u64(key::TOTAL_REQ_COUNT).unwrap_or(0);
        let total_item_count = self.read_stat_u64(key::TOTAL_ITEM_COUNT).unwrap_or(0);

        StatsSnapshot {
            current_size: self.current_size(),
            total_req_count,
            total_item_count,
            req_per_sec: total_req_count as f64 / uptime_secs,
            item_per_sec: total_item_count as f64 / uptime_secs,
            last_period_avg_mins: self.read_stat_f64(key::LAST_PERIOD_AVG_MINS),
            draining: self.is_draining(),
            server_start: iso8601_utc(server_start),
        }
    }

    // ---------------------------------------------------------------------
    // EVICTION
    // ---------------------------------------------------------------------

    /// Ejects the occupant of `pos`, deleting the slot and its index
    /// entry when `also_delete` is set.
    ///
    /// This is the callback entry point for the parallel eject transport;
    /// ejections routed through it report `is_full_drain = false`.
    pub fn eject_item(&self, pos: u64, also_delete: bool) {
        self.eject_slot(pos, also_delete, false);
    }

    fn eject_slot(&self, pos: u64, also_delete: bool, is_full_drain: bool) {
        let Some(entry) = self.load_slot(pos) else {
            debug!(pos, "eject: slot already empty");
            return;
        };
        self.notify_sink(pos, &entry, is_full_drain);
        if also_delete {
            self.index.delete(&entry.key);
            self.ring.delete(&pos.to_string());
        }
    }

    fn notify_sink(&self, pos: u64, entry: &SlotEntry, is_full_drain: bool) {
        // Logged whether or not a sink is configured.
        debug!(pos, id = %entry.key, full_drain = is_full_drain, "ejecting record");
        if let Some(sink) = &self.sink {
            let readable = self.schema.readable(&entry.data);
            if let Err(err) = sink.eject(&entry.key, &readable, is_full_drain) {
                warn!(id = %entry.key, %err, "eviction sink failed");
            }
        }
    }

    // ---------------------------------------------------------------------
    // RESIZE & DRAIN
    // ---------------------------------------------------------------------

    /// Sets the ring capacity.
    ///
    /// Growing is cheap: future inserts use the new range. Shrinking
    /// pulls the cursor back to the new boundary and evicts every
    /// occupant above it (deleting slots and index entries), batched
    /// through the transport when one is configured.
    ///
    /// Holds no lock and may race with `set`; a write landing above the
    /// new boundary in the window is swept up, at the cost of one extra
    /// eviction. Behavior while a full drain is in flight is unspecified.
    pub fn resize(&self, new_size: u64) {
        let prev_size = self.current_size();
        self.write_stat(key::CURRENT_SIZE, &new_size.to_string());
        if new_size >= prev_size {
            return;
        }

        info!(prev_size, new_size, "shrinking ring");
        if self.read_stat_u64(key::POS).unwrap_or(0) > new_size {
            self.write_stat(key::POS, &new_size.to_string());
        }

        let mut batcher = self.batcher();
        let mut pos = new_size + 1;
        while self.ring.get(&pos.to_string()).is_some() {
            match &mut batcher {
                Some(b) => b.push(EjectRequest { pos, delete: true }),
                None => self.eject_slot(pos, true, false),
            }
            pos += 1;
        }
        if let Some(b) = batcher {
            b.finish();
        }
    }

    /// Empties the ring, announcing every occupant to the sink with
    /// `is_full_drain = true`, then resets the cursor.
    ///
    /// Single-flight: the `draining` gate is taken first-writer-wins, and
    /// only the winning caller sweeps. Returns whether this call
    /// performed the drain. Writes arriving while the gate is held are
    /// silently dropped.
    pub fn drain(&self) -> bool {
        match self.ring.add(DRAINING_KEY, "1") {
            Ok(true) => {}
            Ok(false) => {
                debug!("drain already in flight");
                return false;
            }
            Err(err) => {
                warn!(%err, "drain gate unavailable");
                return false;
            }
        }

        let mut swept = 0u64;
        let mut batcher = self.batcher();
        let mut pos = 1u64;
        while self.ring.get(&pos.to_string()).is_some() {
            match &mut batcher {
                Some(b) => b.push(EjectRequest { pos, delete: false }),
                None => self.eject_slot(pos, false, true),
            }
            swept += 1;
            pos += 1;
        }
        if let Some(b) = batcher {
            b.finish();
        }

        self.ring.flush_all();
        self.index.flush_all();
        self.write_stat(key::POS, "0");
        self.ring.delete(DRAINING_KEY);
        info!(swept, "ring drained");
        true
    }

    fn batcher(&self) -> Option<EjectBatcher<'_>> {
        self.transport
            .as_deref()
            .map(|t| EjectBatcher::new(t, self.config.drain_parallel_items))
    }

    // ---------------------------------------------------------------------
    // CAPACITY CONTROLLER CHOREOGRAPHY
    // ---------------------------------------------------------------------

    /// Closes the monitoring window if it has elapsed, applying at most
    /// one resize decision. The `locked` flag (first-writer-wins `add`)
    /// keeps the decision path single-flight; losers fall through.
    fn check_size_adjust(&self) {
        let now = self.clock.now_epoch_secs();
        let period_start = self.read_stat_u64(key::PERIOD_START).unwrap_or(now);
        let elapsed_secs = now.saturating_sub(period_start) as f64;
        if elapsed_secs <= self.config.monitor_period_mins * 60.0 {
            return;
        }

        match self.stats.add(key::LOCKED, "1") {
            Ok(true) => {}
            Ok(false) => return,
            Err(err) => {
                warn!(%err, "resize lock unavailable");
                return;
            }
        }

        let items = self.read_stat_u64(key::ITEM_COUNT).unwrap_or(0);
        if let Some(decision) = controller::decide(self.current_size(), items, &self.config) {
            self.write_stat(
                key::LAST_PERIOD_AVG_MINS,
                &decision.avg_eject_mins.to_string(),
            );
            if let Some(new_size) = decision.new_size {
                info!(
                    items,
                    avg_eject_mins = decision.avg_eject_mins,
                    new_size,
                    "capacity adjustment"
                );
                self.resize(new_size);
            }
        }

        // Reinitialize the window, then release the lock.
        self.write_stat(key::ITEM_COUNT, "0");
        self.write_stat(key::PERIOD_START, &now.to_string());
        self.stats.delete(key::LOCKED);
    }

    // ---------------------------------------------------------------------
    // STORE HELPERS
    // ---------------------------------------------------------------------

    fn bootstrap(&self) {
        let now = self.clock.now_epoch_secs();
        // First-writer-wins: handlers sharing one store agree on the
        // initial values.
        for (k, v) in [
            (key::CURRENT_SIZE, self.config.initial_size.to_string()),
            (key::SERVER_START, now.to_string()),
            (key::PERIOD_START, now.to_string()),
        ] {
            if let Err(err) = self.stats.add(k, &v) {
                warn!(key = k, %err, "stats bootstrap write failed");
            }
        }
    }

    fn is_draining(&self) -> bool {
        self.ring.get(DRAINING_KEY).is_some()
    }

    fn current_size(&self) -> u64 {
        self.read_stat_u64(key::CURRENT_SIZE)
            .unwrap_or(self.config.initial_size)
    }

    fn index_pos(&self, id: &str) -> Option<u64> {
        self.index.get(id)?.parse().ok()
    }

    fn load_slot(&self, pos: u64) -> Option<SlotEntry> {
        let raw = self.ring.get(&pos.to_string())?;
        match SlotEntry::decode(&raw) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(pos, %err, "undecodable slot treated as empty");
                None
            }
        }
    }

    fn store_slot(&self, pos: u64, entry: &SlotEntry) {
        match entry.encode() {
            Ok(raw) => {
                if let Err(err) = self.ring.set(&pos.to_string(), &raw) {
                    warn!(pos, %err, "slot write failed");
                }
            }
            Err(err) => warn!(pos, %err, "slot encode failed"),
        }
    }

    fn write_stat(&self, k: &str, value: &str) {
        if let Err(err) = self.stats.set(k, value) {
            warn!(key = k, %err, "stats write failed");
        }
    }

    fn count_request(&self) {
        if let Err(err) = self.stats.incr(key::TOTAL_REQ_COUNT, 1) {
            warn!(%err, "request counter increment failed");
        }
    }

    fn count_item(&self) {
        if let Err(err) = self.stats.incr(key::TOTAL_ITEM_COUNT, 1) {
            warn!(%err, "item counter increment failed");
        }
        if self.config.auto_resize {
            if let Err(err) = self.stats.incr(key::ITEM_COUNT, 1) {
                warn!(%err, "window counter increment failed");
            }
        }
    }

    fn read_stat_u64(&self, k: &str) -> Option<u64> {
        self.stats.get(k)?.parse().ok()
    }

    fn read_stat_f64(&self, k: &str) -> Option<f64> {
        self.stats.get(k)?.parse().ok()
    }
}

/// Builder wiring the runtime collaborators: eviction sink, parallel
/// eject transport, and clock.
pub struct IndexedRingBuilder {
    config: RingConfig,
    store: Arc<dyn SharedStore>,
    sink: Option<Arc<dyn EjectSink>>,
    transport: Option<Arc<dyn EjectTransport>>,
    clock: Arc<dyn Clock>,
}

impl IndexedRingBuilder {
    /// Sets the eviction sink.
    pub fn sink(mut self, sink: Arc<dyn EjectSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets the parallel eject transport.
    pub fn transport(mut self, transport: Arc<dyn EjectTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replaces the system clock (tests, simulations).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Compiles the schema, opens the three namespaces, and publishes
    /// bootstrap state.
    pub fn build(self) -> Result<IndexedRing, SchemaError> {
        let schema = Schema::compile(&self.config.params)?;
        let cache = IndexedRing {
            schema,
            ring: self.store.namespace(ns::RING),
            index: self.store.namespace(ns::INDEX),
            stats: self.store.namespace(ns::STATS),
            config: self.config,
            sink: self.sink,
            transport: self.transport,
            clock: self.clock,
        };
        cache.bootstrap();
        Ok(cache)
    }
}
