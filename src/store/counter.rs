//! Scoped counter mutation handle
//!
//! A [`CounterStore`] is bound to one (subject_type, subject_id, name) scope
//! and its registered base interval. Every mutation resolves its instant
//! through the bucket boundary calculator first, then performs exactly one
//! atomic backend upsert; there is no read-modify-write anywhere on the
//! mutation path.

use std::sync::Arc;

use chrono::Utc;
use chrono_tz::Tz;
use tracing::debug;

use crate::boundary;
use crate::error::{MutationError, Result, StoreError};
use crate::interval::Interval;
use crate::store::backend::CounterBackend;
use crate::types::{CounterRow, Direction, RowKey, SubjectId};

/// Mutation operations for one counter on one subject
///
/// Obtained from [`crate::engine::CounterEngine::counter`] or a
/// [`crate::engine::SubjectCounters`] accessor; carries the declared base
/// interval and the zone used for calendar bucket resolution.
pub struct CounterStore {
    subject_type: String,
    subject_id: Option<SubjectId>,
    name: String,
    base: Interval,
    zone: Tz,
    backend: Arc<dyn CounterBackend>,
}

impl CounterStore {
    pub(crate) fn new(
        subject_type: String,
        subject_id: Option<SubjectId>,
        name: String,
        base: Interval,
        zone: Tz,
        backend: Arc<dyn CounterBackend>,
    ) -> Self {
        Self {
            subject_type,
            subject_id,
            name,
            base,
            zone,
            backend,
        }
    }

    /// The counter's declared base interval
    pub fn base_interval(&self) -> Interval {
        self.base
    }

    /// Atomically add `amount` to the bucket containing `at`
    ///
    /// Creates the row with value `amount` when absent. `at` defaults to
    /// the current instant. Returns the value after the mutation.
    pub async fn increase_by(&self, amount: i64, at: Option<i64>) -> Result<i64> {
        let key = self.resolve_bucket(at)?;
        debug!(
            subject_type = %self.subject_type,
            name = %self.name,
            bucket_time = key.bucket_time,
            amount,
            "increase"
        );
        self.map_store_err(self.backend.upsert_add(&key, amount).await, key.bucket_time)
    }

    /// Atomically subtract `amount` from the bucket containing `at`
    pub async fn decrease_by(&self, amount: i64, at: Option<i64>) -> Result<i64> {
        let key = self.resolve_bucket(at)?;
        let negated = amount
            .checked_neg()
            .ok_or_else(|| self.overflow(key.bucket_time))?;
        debug!(
            subject_type = %self.subject_type,
            name = %self.name,
            bucket_time = key.bucket_time,
            amount,
            "decrease"
        );
        self.map_store_err(self.backend.upsert_add(&key, negated).await, key.bucket_time)
    }

    /// Atomically set the bucket containing `at` to `value`
    ///
    /// Creates the row when absent; prior content is discarded.
    pub async fn reset_to(&self, value: i64, at: Option<i64>) -> Result<i64> {
        let key = self.resolve_bucket(at)?;
        debug!(
            subject_type = %self.subject_type,
            name = %self.name,
            bucket_time = key.bucket_time,
            value,
            "reset"
        );
        self.map_store_err(self.backend.upsert_set(&key, value).await, key.bucket_time)
    }

    /// Create the row for the bucket containing `at` with `value`
    ///
    /// With `force`, an existing row is overwritten in place. Without it,
    /// an existing row is a [`MutationError::BucketConflict`]; callers that
    /// need idempotent "set if absent" must pass `force`.
    pub async fn make(&self, value: i64, at: Option<i64>, force: bool) -> Result<CounterRow> {
        let key = self.resolve_bucket(at)?;
        if force {
            let value = self
                .map_store_err(self.backend.upsert_set(&key, value).await, key.bucket_time)?;
            return Ok(key.into_row(value));
        }
        match self.backend.insert_new(&key, value).await {
            Ok(row) => Ok(row),
            Err(StoreError::RowExists { bucket_time }) => Err(MutationError::BucketConflict {
                subject_type: self.subject_type.clone(),
                name: self.name.clone(),
                bucket_time,
            }
            .into()),
            Err(other) => Err(other.into()),
        }
    }

    /// Directed mutation: add `amount` up or down, or with `force` reset
    /// the bucket to the signed amount
    ///
    /// The counterpart of the increment/decrement entry points: `amount`
    /// is always positive at call sites and the sign is applied by
    /// `direction`, so decrements below zero are permitted.
    pub async fn change(
        &self,
        amount: i64,
        direction: Direction,
        at: Option<i64>,
        force: bool,
    ) -> Result<i64> {
        let signed = direction.signed(amount);
        if force {
            self.reset_to(signed, at).await
        } else {
            self.increase_by(signed, at).await
        }
    }

    /// Floor `at` (default: now) to the base interval's bucket boundary
    fn resolve_bucket(&self, at: Option<i64>) -> Result<RowKey> {
        let instant = at.unwrap_or_else(|| Utc::now().timestamp());
        let bucket_time = boundary::bucket_start(&self.base, instant, self.zone)?;
        Ok(RowKey {
            subject_type: self.subject_type.clone(),
            subject_id: self.subject_id,
            name: self.name.clone(),
            bucket_time,
        })
    }

    fn map_store_err(
        &self,
        result: std::result::Result<i64, StoreError>,
        bucket_time: i64,
    ) -> Result<i64> {
        match result {
            Ok(value) => Ok(value),
            Err(StoreError::Overflow { .. }) => Err(self.overflow(bucket_time).into()),
            Err(other) => Err(other.into()),
        }
    }

    fn overflow(&self, bucket_time: i64) -> MutationError {
        MutationError::Overflow {
            subject_type: self.subject_type.clone(),
            name: self.name.clone(),
            bucket_time,
        }
    }
}
