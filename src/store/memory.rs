//! In-memory counter backend
//!
//! A sharded-map implementation of [`CounterBackend`] intended for unit and
//! integration testing without an external database, and for prototyping.
//! All data is lost on drop; it is not a durable store.
//!
//! The no-lost-updates contract is satisfied by performing every mutation
//! inside the map's per-key entry guard, so concurrent upserts on one key
//! serialize on the shard lock rather than racing a read-modify-write pair.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::trace;

use crate::error::StoreError;
use crate::store::backend::CounterBackend;
use crate::types::{CounterRow, RowKey, ScopeFilter, SubjectId};

/// Map key: the row uniqueness tuple
type Key = (String, Option<SubjectId>, String, i64);

fn key_of(key: &RowKey) -> Key {
    (
        key.subject_type.clone(),
        key.subject_id,
        key.name.clone(),
        key.bucket_time,
    )
}

/// In-memory implementation of [`CounterBackend`]
///
/// # Example
///
/// ```rust,ignore
/// use tally_store::store::MemoryBackend;
///
/// let backend = MemoryBackend::new();
/// let value = backend.upsert_add(&key, 3).await?;
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    rows: DashMap<Key, i64>,
}

impl MemoryBackend {
    /// Create an empty in-memory backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored, across all scopes
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn collect(&self, filter: &ScopeFilter) -> Vec<CounterRow> {
        let mut rows: Vec<CounterRow> = self
            .rows
            .iter()
            .map(|entry| {
                let (subject_type, subject_id, name, bucket_time) = entry.key().clone();
                CounterRow {
                    subject_type,
                    subject_id,
                    name,
                    value: *entry.value(),
                    bucket_time,
                }
            })
            .filter(|row| filter.matches(row))
            .collect();
        rows.sort_by_key(|row| (row.bucket_time, row.subject_id));
        rows
    }
}

#[async_trait]
impl CounterBackend for MemoryBackend {
    fn backend_id(&self) -> &str {
        "memory"
    }

    async fn upsert_add(&self, key: &RowKey, delta: i64) -> Result<i64, StoreError> {
        // The entry guard holds the shard lock for the whole add, making
        // the insert-or-update atomic per key.
        let mut entry = self.rows.entry(key_of(key)).or_insert(0);
        let updated = entry
            .value()
            .checked_add(delta)
            .ok_or(StoreError::Overflow {
                bucket_time: key.bucket_time,
            })?;
        *entry.value_mut() = updated;
        trace!(bucket_time = key.bucket_time, delta, updated, "upsert_add");
        Ok(updated)
    }

    async fn upsert_set(&self, key: &RowKey, value: i64) -> Result<i64, StoreError> {
        self.rows.insert(key_of(key), value);
        trace!(bucket_time = key.bucket_time, value, "upsert_set");
        Ok(value)
    }

    async fn insert_new(&self, key: &RowKey, value: i64) -> Result<CounterRow, StoreError> {
        match self.rows.entry(key_of(key)) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(StoreError::RowExists {
                bucket_time: key.bucket_time,
            }),
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(value);
                Ok(key.clone().into_row(value))
            }
        }
    }

    async fn scan_range(&self, filter: &ScopeFilter) -> Result<Vec<CounterRow>, StoreError> {
        Ok(self.collect(filter))
    }

    async fn bucket_extent(
        &self,
        filter: &ScopeFilter,
    ) -> Result<Option<(i64, i64)>, StoreError> {
        let mut extent: Option<(i64, i64)> = None;
        for entry in self.rows.iter() {
            let (subject_type, subject_id, name, bucket_time) = entry.key();
            let row = CounterRow {
                subject_type: subject_type.clone(),
                subject_id: *subject_id,
                name: name.clone(),
                value: *entry.value(),
                bucket_time: *bucket_time,
            };
            if !filter.matches(&row) {
                continue;
            }
            extent = Some(match extent {
                None => (row.bucket_time, row.bucket_time),
                Some((lo, hi)) => (lo.min(row.bucket_time), hi.max(row.bucket_time)),
            });
        }
        Ok(extent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(bucket_time: i64) -> RowKey {
        RowKey {
            subject_type: "Ball".into(),
            subject_id: Some(1),
            name: "rotations".into(),
            bucket_time,
        }
    }

    fn scope() -> ScopeFilter {
        ScopeFilter {
            subject_type: "Ball".into(),
            subject_id: Some(1),
            name: "rotations".into(),
            bucket_lo: None,
            bucket_hi: None,
        }
    }

    #[tokio::test]
    async fn upsert_add_creates_then_accumulates() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.upsert_add(&key(0), 3).await.unwrap(), 3);
        assert_eq!(backend.upsert_add(&key(0), 2).await.unwrap(), 5);
        assert_eq!(backend.row_count(), 1);
    }

    #[tokio::test]
    async fn upsert_add_overflow_is_fatal() {
        let backend = MemoryBackend::new();
        backend.upsert_add(&key(0), i64::MAX).await.unwrap();
        assert!(matches!(
            backend.upsert_add(&key(0), 1).await,
            Err(StoreError::Overflow { .. })
        ));
    }

    #[tokio::test]
    async fn insert_new_conflicts_on_existing_row() {
        let backend = MemoryBackend::new();
        backend.insert_new(&key(0), 1).await.unwrap();
        assert!(matches!(
            backend.insert_new(&key(0), 2).await,
            Err(StoreError::RowExists { bucket_time: 0 })
        ));
    }

    #[tokio::test]
    async fn scan_range_orders_by_bucket_time() {
        let backend = MemoryBackend::new();
        backend.upsert_set(&key(600), 2).await.unwrap();
        backend.upsert_set(&key(0), 1).await.unwrap();
        backend.upsert_set(&key(300), 3).await.unwrap();

        let rows = backend.scan_range(&scope()).await.unwrap();
        let times: Vec<i64> = rows.iter().map(|r| r.bucket_time).collect();
        assert_eq!(times, vec![0, 300, 600]);
    }

    #[tokio::test]
    async fn bucket_extent_reflects_scope() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.bucket_extent(&scope()).await.unwrap(), None);
        backend.upsert_set(&key(300), 1).await.unwrap();
        backend.upsert_set(&key(900), 1).await.unwrap();
        assert_eq!(
            backend.bucket_extent(&scope()).await.unwrap(),
            Some((300, 900))
        );
    }

    #[tokio::test]
    async fn concurrent_upserts_lose_no_updates() {
        use std::sync::Arc;

        let backend = Arc::new(MemoryBackend::new());
        let mut handles = Vec::new();
        for _ in 0..64 {
            let backend = Arc::clone(&backend);
            handles.push(tokio::spawn(async move {
                for _ in 0..100 {
                    backend.upsert_add(&key(0), 1).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        let rows = backend.scan_range(&scope()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, 6_400);
    }
}
