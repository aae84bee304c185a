//! Backend trait for durable counter storage
//!
//! The engine is specified against these abstract operations, not a query
//! language. A relational implementation maps them onto conditional upserts
//! (`INSERT ... ON CONFLICT`) and ordered range scans; the crate ships an
//! in-memory implementation for tests and prototyping
//! ([`crate::store::MemoryBackend`]).

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{CounterRow, RowKey, ScopeFilter};

/// Durable storage for counter rows
///
/// # Concurrency contract
///
/// `upsert_add` and `upsert_set` must be atomic conditional upserts: two
/// concurrent calls on the same key must both be reflected in the final row
/// (no lost updates) and must never create a second row for the key. A
/// read-then-write implementation violates this contract.
///
/// Scans are read-only and may observe an eventually-consistent snapshot;
/// no point-in-time isolation is required of implementations.
#[async_trait]
pub trait CounterBackend: Send + Sync + 'static {
    /// Unique identifier for this backend
    fn backend_id(&self) -> &str;

    /// Atomically add `delta` to the row for `key`, creating it with value
    /// `delta` if absent
    ///
    /// Returns the value after the mutation. Accumulator overflow is a
    /// fatal [`StoreError::Overflow`], never a wrap.
    async fn upsert_add(&self, key: &RowKey, delta: i64) -> Result<i64, StoreError>;

    /// Atomically set the row for `key` to `value`, creating it if absent
    ///
    /// Returns the value after the mutation (always `value`).
    async fn upsert_set(&self, key: &RowKey, value: i64) -> Result<i64, StoreError>;

    /// Insert a new row for `key`, failing with [`StoreError::RowExists`]
    /// if one is already present
    async fn insert_new(&self, key: &RowKey, value: i64) -> Result<CounterRow, StoreError>;

    /// All rows matching `filter`, ordered ascending by `bucket_time`
    async fn scan_range(&self, filter: &ScopeFilter) -> Result<Vec<CounterRow>, StoreError>;

    /// Minimum and maximum `bucket_time` of the rows matching `filter`
    ///
    /// `None` when the scope holds no rows. Bucket bounds on the filter are
    /// honored.
    async fn bucket_extent(&self, filter: &ScopeFilter)
        -> Result<Option<(i64, i64)>, StoreError>;
}
