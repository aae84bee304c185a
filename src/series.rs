//! Bucket boundary series generation
//!
//! Produces the complete ordered sequence of bucket boundaries a query must
//! report, including boundaries with no stored data (those are zero-filled
//! by the query engine). The series is a lazy finite iterator, regenerable
//! deterministically from the same inputs.

use chrono_tz::Tz;

use crate::boundary;
use crate::error::{Error, Result};
use crate::interval::Interval;

/// Ordered sequence of bucket boundaries from `lo` to `hi` inclusive
///
/// `lo` and `hi` must already be bucket boundaries for the interval in the
/// given zone (the query engine floors range endpoints before constructing
/// the series). Fixed intervals step arithmetically; calendar intervals step
/// by wall-clock unit, so month steps vary in length.
///
/// # Example
///
/// ```rust
/// use chrono_tz::UTC;
/// use tally_store::interval::Interval;
/// use tally_store::series::BucketSeries;
///
/// let series = BucketSeries::new(Interval::minutes(5).unwrap(), 0, 1_800, UTC);
/// let boundaries: Vec<i64> = series.collect();
/// assert_eq!(boundaries, vec![0, 300, 600, 900, 1_200, 1_500, 1_800]);
/// ```
#[derive(Debug, Clone)]
pub struct BucketSeries {
    interval: Interval,
    next: Option<i64>,
    hi: i64,
    zone: Tz,
}

impl BucketSeries {
    /// Create a series spanning `[lo, hi]`
    ///
    /// An inverted range (`lo > hi`) yields an empty series, matching the
    /// empty-counter case where no extent exists.
    pub fn new(interval: Interval, lo: i64, hi: i64, zone: Tz) -> Self {
        Self {
            interval,
            next: (lo <= hi).then_some(lo),
            hi,
            zone,
        }
    }

    /// Collect the series, failing if it exceeds `max_len` boundaries
    ///
    /// Guards pathological ranges (a one-second interval over a decade) so
    /// query time stays proportional to the number of buckets reported.
    pub fn collect_bounded(self, max_len: usize) -> Result<Vec<i64>> {
        let mut boundaries = Vec::new();
        for boundary in self {
            if boundaries.len() >= max_len {
                return Err(Error::Configuration(format!(
                    "Bucket series exceeds the configured maximum of {} entries",
                    max_len
                )));
            }
            boundaries.push(boundary);
        }
        Ok(boundaries)
    }
}

impl Iterator for BucketSeries {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        let current = self.next?;
        self.next = match boundary::next_boundary(&self.interval, current, self.zone) {
            // Stepping must advance; a stalled or out-of-range step ends
            // the series instead of looping.
            Ok(following) if following > current && following <= self.hi => Some(following),
            _ => None,
        };
        Some(current)
    }
}
