//! Core data types used throughout the counter engine
//!
//! # Key Types
//!
//! - **`CounterRow`**: the only persisted entity, one row per
//!   (subject, counter, bucket)
//! - **`RowKey`**: the uniqueness key a backend upsert is conditioned on
//! - **`ScopeFilter`**: row selection for scans and aggregation
//! - **`SeriesPoint`**: a single (bucket timestamp, value) query result entry
//! - **`TimeRange`**: inclusive instant range for queries
//! - **`Direction`**: mutation direction for `change`-style calls
//!
//! # Example
//!
//! ```rust
//! use tally_store::types::{Direction, TimeRange};
//!
//! let range = TimeRange::new(1_000, 2_000).unwrap();
//! assert!(range.contains(1_500));
//!
//! let dir: Direction = "up".parse().unwrap();
//! assert_eq!(dir, Direction::Up);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MutationError;

/// Identifier of a subject instance
///
/// Counters may also be scoped only by subject type (global counters), in
/// which case the id is absent.
pub type SubjectId = i64;

/// The persisted counter entity
///
/// At most one row exists per (subject_type, subject_id, name, bucket_time);
/// the backend's conditional upsert enforces this atomically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRow {
    /// Kind of the owning entity, e.g. `"Ball"`
    pub subject_type: String,

    /// Owning entity instance; `None` for type-global counters
    pub subject_id: Option<SubjectId>,

    /// Counter name, unique per subject instance together with `bucket_time`
    pub name: String,

    /// Signed accumulator value
    pub value: i64,

    /// Canonical bucket boundary in epoch seconds
    ///
    /// This is a bucket key, not a creation timestamp: every mutation first
    /// floors its instant to the counter's base interval and addresses the
    /// row by the resulting boundary.
    pub bucket_time: i64,
}

/// The uniqueness key of a counter row
///
/// Backend upserts are conditioned on this key; two concurrent mutations
/// with the same key must both land on the same row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowKey {
    /// Kind of the owning entity
    pub subject_type: String,
    /// Owning entity instance, if any
    pub subject_id: Option<SubjectId>,
    /// Counter name
    pub name: String,
    /// Canonical bucket boundary, epoch seconds
    pub bucket_time: i64,
}

impl RowKey {
    /// Build the row this key addresses, with the given value
    pub fn into_row(self, value: i64) -> CounterRow {
        CounterRow {
            subject_type: self.subject_type,
            subject_id: self.subject_id,
            name: self.name,
            value,
            bucket_time: self.bucket_time,
        }
    }
}

/// Row selection for scans and aggregation
///
/// A `None` subject id selects rows across *all* subjects of the type
/// (cross-subject totals), unlike [`RowKey`] where `None` addresses the
/// type-global row. Bucket bounds are half-open `[lo, hi)` epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFilter {
    /// Kind of the owning entity
    pub subject_type: String,
    /// Restrict to one subject instance; `None` spans all instances
    pub subject_id: Option<SubjectId>,
    /// Counter name
    pub name: String,
    /// Lower bucket_time bound, inclusive
    pub bucket_lo: Option<i64>,
    /// Upper bucket_time bound, exclusive
    pub bucket_hi: Option<i64>,
}

impl ScopeFilter {
    /// Whether a row falls inside this filter
    pub fn matches(&self, row: &CounterRow) -> bool {
        if row.subject_type != self.subject_type || row.name != self.name {
            return false;
        }
        if let Some(id) = self.subject_id {
            if row.subject_id != Some(id) {
                return false;
            }
        }
        if let Some(lo) = self.bucket_lo {
            if row.bucket_time < lo {
                return false;
            }
        }
        if let Some(hi) = self.bucket_hi {
            if row.bucket_time >= hi {
                return false;
            }
        }
        true
    }
}

/// One entry of an aggregated time series
///
/// `timestamp` is the bucket boundary in epoch seconds; `value` is the sum
/// of all counter rows re-bucketed into that boundary, zero when the bucket
/// holds no data (gap-fill).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Bucket boundary, epoch seconds
    pub timestamp: i64,
    /// Aggregated signed value, zero for empty buckets
    pub value: i64,
}

impl SeriesPoint {
    /// Create a new series point
    pub fn new(timestamp: i64, value: i64) -> Self {
        Self { timestamp, value }
    }
}

/// Inclusive instant range for queries, in epoch seconds
///
/// Both endpoints are inclusive. The query engine floors each endpoint to
/// its containing bucket start, so the resulting series includes the final
/// partial bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start instant, inclusive
    pub start: i64,
    /// End instant, inclusive
    pub end: i64,
}

impl TimeRange {
    /// Create a new time range, validating that start <= end
    pub fn new(start: i64, end: i64) -> Result<Self, crate::error::Error> {
        if start > end {
            return Err(crate::error::Error::Configuration(format!(
                "Invalid time range: start {} > end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Check whether an instant falls within this range (inclusive)
    pub fn contains(&self, instant: i64) -> bool {
        instant >= self.start && instant <= self.end
    }
}

/// Mutation direction for `change`-style calls
///
/// The typed API makes an invalid direction unrepresentable; the string
/// surface (`FromStr`) is where [`MutationError::InvalidDirection`] comes
/// from, for callers driven by config or wire input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Increase the bucket value
    Up,
    /// Decrease the bucket value
    Down,
}

impl Direction {
    /// Apply this direction's sign to an amount
    pub fn signed(&self, amount: i64) -> i64 {
        match self {
            Direction::Up => amount,
            Direction::Down => -amount,
        }
    }
}

impl FromStr for Direction {
    type Err = MutationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(MutationError::InvalidDirection {
                given: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}
