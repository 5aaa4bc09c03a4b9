//! Error types for cache construction and external collaborators.

use thiserror::Error;

/// Errors detected while compiling a schema from its parameter list.
///
/// These are the only errors surfaced at construction time; once an
/// [`IndexedRing`](crate::IndexedRing) is built, its operations never fail
/// outward (store and sink failures are logged and swallowed).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The parameter list was empty.
    #[error("schema parameter list is empty")]
    EmptyParams,

    /// Two parameters share the same input name.
    #[error("duplicate field name {0:?} in schema")]
    DuplicateField(String),

    /// More than one parameter is flagged as the lock field.
    #[error("schema declares more than one lock field ({first:?} and {second:?})")]
    MultipleLockFields {
        /// Name of the first lock-bearing field encountered.
        first: String,
        /// Name of the conflicting one.
        second: String,
    },
}

/// Errors reported by a [`Namespace`](crate::Namespace) implementation.
///
/// The cache core treats every `StoreError` as non-fatal: it logs the
/// failure and completes the operation with whatever state did land.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// `incr` was called on a key whose current value is not an integer.
    #[error("value at key {key:?} is not numeric")]
    NotNumeric {
        /// The offending key.
        key: String,
    },

    /// Backend-specific failure (connection loss, capacity, ...).
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Errors reported by an eviction sink or the parallel eject transport.
///
/// Delivery is at-most-once: failures are logged, never retried.
#[derive(Debug, Clone, Error)]
pub enum EjectError {
    /// The eviction sink rejected or failed to process the record.
    #[error("eviction sink failed: {0}")]
    Sink(String),

    /// The fan-out transport failed to dispatch a batch.
    #[error("eject transport failed: {0}")]
    Transport(String),
}
