//! Gap-filled aggregation queries
//!
//! The query path mirrors the mutation path in reverse: validate the
//! requested interval against the counter's base, scan the stored rows for
//! the scope, re-bucket each row's boundary into the requested (possibly
//! coarser) interval in the query zone, sum per boundary, then left-merge
//! the sums against offline-generated series boundaries so every bucket
//! appears, zero-filled where no data exists.
//!
//! Aggregation runs in application logic over an ordered range scan; a
//! backend that can push grouped sums and calendar truncation into its own
//! query language is free to do so behind [`crate::store::CounterBackend`],
//! as long as the boundary and gap-fill semantics match.
//!
//! # Example
//!
//! ```rust,ignore
//! use chrono_tz::US::Eastern;
//! use tally_store::query::DataQuery;
//!
//! let query = DataQuery::new("Ball", "rotations")
//!     .subject(ball_id)
//!     .interval(Interval::minutes(10)?)
//!     .zone(Eastern);
//! let series = engine.data_for(&query).await?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono_tz::Tz;
use tracing::debug;

use crate::boundary;
use crate::error::{MutationError, Result};
use crate::interval::Interval;
use crate::registry::CounterRegistry;
use crate::series::BucketSeries;
use crate::store::CounterBackend;
use crate::types::{ScopeFilter, SeriesPoint, SubjectId, TimeRange};

/// An aggregation query specification
///
/// Built with the fluent methods below; unset options fall back to the
/// counter's base interval, the full stored extent, and UTC.
#[derive(Debug, Clone)]
pub struct DataQuery {
    /// Subject type owning the counter
    pub subject_type: String,

    /// Counter name
    pub name: String,

    /// Restrict to one subject instance; `None` aggregates across all
    /// subjects of the type (cross-subject totals per bucket)
    pub subject_id: Option<SubjectId>,

    /// Requested interval; must be a valid coarsening of the base
    pub interval: Option<Interval>,

    /// Explicit instant range; endpoints are floored to containing buckets,
    /// so the final partial bucket is included
    pub range: Option<TimeRange>,

    /// Zone for calendar truncation and boundary generation
    pub zone: Tz,
}

impl DataQuery {
    /// Create a query for a counter, defaulting to the counter's base
    /// interval, the full stored extent, and UTC
    pub fn new(subject_type: &str, name: &str) -> Self {
        Self {
            subject_type: subject_type.to_string(),
            name: name.to_string(),
            subject_id: None,
            interval: None,
            range: None,
            zone: chrono_tz::UTC,
        }
    }

    /// Restrict the query to one subject instance
    pub fn subject(mut self, id: SubjectId) -> Self {
        self.subject_id = Some(id);
        self
    }

    /// Request a coarser interval than the base
    pub fn interval(mut self, interval: Interval) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Restrict the query to an explicit instant range
    pub fn range(mut self, range: TimeRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Set the zone used for calendar bucket boundaries
    pub fn zone(mut self, zone: Tz) -> Self {
        self.zone = zone;
        self
    }
}

/// Executes [`DataQuery`]s against a registry and a backend
///
/// Read-only: runs concurrently with mutations and observes whatever
/// read-consistency the backend provides.
pub struct QueryEngine {
    registry: Arc<CounterRegistry>,
    backend: Arc<dyn CounterBackend>,
    max_series_len: usize,
}

impl QueryEngine {
    pub(crate) fn new(
        registry: Arc<CounterRegistry>,
        backend: Arc<dyn CounterBackend>,
        max_series_len: usize,
    ) -> Self {
        Self {
            registry,
            backend,
            max_series_len,
        }
    }

    /// Run a query, returning the complete ordered, zero-filled series
    ///
    /// Validation happens before any storage access. An empty counter with
    /// no explicit range yields an empty series.
    pub async fn data_for(&self, query: &DataQuery) -> Result<Vec<SeriesPoint>> {
        let interval = self.registry.validate_query_interval(
            &query.subject_type,
            &query.name,
            query.interval,
        )?;

        let mut filter = ScopeFilter {
            subject_type: query.subject_type.clone(),
            subject_id: query.subject_id,
            name: query.name.clone(),
            bucket_lo: None,
            bucket_hi: None,
        };

        let (lo, hi) = match query.range {
            Some(range) => {
                let lo = boundary::bucket_start(&interval, range.start, query.zone)?;
                let hi = boundary::bucket_start(&interval, range.end, query.zone)?;
                // Scan through the end of the final partial bucket so rows
                // inside it contribute, but rows beyond it cannot.
                filter.bucket_lo = Some(lo);
                filter.bucket_hi = Some(boundary::next_boundary(&interval, hi, query.zone)?);
                (lo, hi)
            }
            None => match self.backend.bucket_extent(&filter).await? {
                None => return Ok(Vec::new()),
                Some((min, max)) => (
                    boundary::bucket_start(&interval, min, query.zone)?,
                    boundary::bucket_start(&interval, max, query.zone)?,
                ),
            },
        };

        let rows = self.backend.scan_range(&filter).await?;
        debug!(
            subject_type = %query.subject_type,
            name = %query.name,
            rows = rows.len(),
            %interval,
            "aggregating"
        );

        let mut sums: BTreeMap<i64, i64> = BTreeMap::new();
        for row in &rows {
            let bucket = boundary::bucket_start(&interval, row.bucket_time, query.zone)?;
            let entry = sums.entry(bucket).or_insert(0);
            *entry = entry
                .checked_add(row.value)
                .ok_or_else(|| MutationError::Overflow {
                    subject_type: query.subject_type.clone(),
                    name: query.name.clone(),
                    bucket_time: bucket,
                })?;
        }

        let boundaries = BucketSeries::new(interval, lo, hi, query.zone)
            .collect_bounded(self.max_series_len)?;

        Ok(boundaries
            .into_iter()
            .map(|boundary| SeriesPoint::new(boundary, sums.get(&boundary).copied().unwrap_or(0)))
            .collect())
    }
}
