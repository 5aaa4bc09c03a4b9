//! Eviction sink and the parallel-eject transport.
//!
//! The sink is the external consumer sitting behind the cache: it is
//! told about every record that leaves the ring (overwrite, shrink,
//! full drain). Delivery is at-most-once — failures are logged by the
//! caller and never retried.
//!
//! The transport is an optional fan-out for drain/shrink sweeps: slot
//! positions are accumulated into batches of `drain_parallel_items` and
//! handed off in one call, with the final partial batch flushed at the
//! end of the sweep. Dispatching a batch must have the same effect as
//! calling [`IndexedRing::eject_item`](crate::IndexedRing::eject_item)
//! for each element; the choice of transport vs inline is purely a
//! performance decision.

use crate::error::EjectError;
use crate::record::Readable;
use tracing::warn;

/// External consumer notified for each evicted record.
pub trait EjectSink: Send + Sync {
    /// Called with the owning id, the readable projection of the record,
    /// and whether the eviction came from a full drain (as opposed to
    /// overwrite or shrink).
    fn eject(&self, id: &str, record: &Readable, is_full_drain: bool) -> Result<(), EjectError>;
}

/// Plain functions and closures can serve as sinks directly.
impl<F> EjectSink for F
where
    F: Fn(&str, &Readable, bool) -> Result<(), EjectError> + Send + Sync,
{
    fn eject(&self, id: &str, record: &Readable, is_full_drain: bool) -> Result<(), EjectError> {
        self(id, record, is_full_drain)
    }
}

/// Sink that discards every eviction. Useful for benchmarks and for
/// deployments that only want the ring's bounding behavior.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EjectSink for NullSink {
    fn eject(&self, _id: &str, _record: &Readable, _is_full_drain: bool) -> Result<(), EjectError> {
        Ok(())
    }
}

/// One element of a transport batch: evict the occupant of `pos`,
/// deleting the slot and its index entry when `delete` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EjectRequest {
    /// Slot position to eject.
    pub pos: u64,
    /// Whether the slot and index entry should be deleted afterwards.
    pub delete: bool,
}

/// Fan-out handle that runs ejection for a batch of slot positions
/// externally, typically by calling back into the core from parallel
/// workers.
pub trait EjectTransport: Send + Sync {
    /// Dispatches one batch. Must be equivalent to running
    /// `eject_item(pos, delete)` for every element.
    fn dispatch(&self, batch: &[EjectRequest]) -> Result<(), EjectError>;
}

/// Accumulates eject requests and flushes them through the transport in
/// `limit`-sized batches. Callers must invoke [`finish`](Self::finish)
/// to flush the final partial batch.
pub(crate) struct EjectBatcher<'a> {
    transport: &'a dyn EjectTransport,
    limit: usize,
    pending: Vec<EjectRequest>,
}

impl<'a> EjectBatcher<'a> {
    pub(crate) fn new(transport: &'a dyn EjectTransport, limit: usize) -> Self {
        Self {
            transport,
            // A zero limit would never flush; treat it as batches of one.
            limit: limit.max(1),
            pending: Vec::with_capacity(limit.max(1)),
        }
    }

    pub(crate) fn push(&mut self, request: EjectRequest) {
        self.pending.push(request);
        if self.pending.len() >= self.limit {
            self.flush();
        }
    }

    pub(crate) fn finish(mut self) {
        if !self.pending.is_empty() {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if let Err(err) = self.transport.dispatch(&self.pending) {
            warn!(batch = self.pending.len(), %err, "eject transport dispatch failed");
        }
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Transport that records every dispatched batch.
    #[derive(Default)]
    struct RecordingTransport {
        batches: Mutex<Vec<Vec<EjectRequest>>>,
    }

    impl EjectTransport for RecordingTransport {
        fn dispatch(&self, batch: &[EjectRequest]) -> Result<(), EjectError> {
            self.batches.lock().unwrap().push(batch.to_vec());
            Ok(())
        }
    }

    fn req(pos: u64) -> EjectRequest {
        EjectRequest { pos, delete: true }
    }

    #[test]
    fn batcher_flushes_full_batches_and_final_partial() {
        let transport = RecordingTransport::default();
        let mut batcher = EjectBatcher::new(&transport, 3);
        for pos in 1..=7 {
            batcher.push(req(pos));
        }
        batcher.finish();

        let batches = transport.batches.lock().unwrap();
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(batches[2][0], req(7));
    }

    #[test]
    fn batcher_with_nothing_pending_dispatches_nothing() {
        let transport = RecordingTransport::default();
        let batcher = EjectBatcher::new(&transport, 3);
        batcher.finish();
        assert!(transport.batches.lock().unwrap().is_empty());
    }

    #[test]
    fn zero_limit_degrades_to_batches_of_one() {
        let transport = RecordingTransport::default();
        let mut batcher = EjectBatcher::new(&transport, 0);
        batcher.push(req(1));
        batcher.push(req(2));
        batcher.finish();
        let batches = transport.batches.lock().unwrap();
        assert_eq!(batches.len(), 2);
    }

    #[test]
    fn closures_are_sinks() {
        let sink = |id: &str, _record: &Readable, full: bool| {
            assert_eq!(id, "x");
            assert!(!full);
            Ok(())
        };
        sink.eject("x", &Readable::new(), false).unwrap();
    }
}
