//! Bucket boundary calculation
//!
//! Maps an instant + interval + time zone to the canonical bucket boundary
//! the instant belongs to.
//!
//! Fixed durations floor on epoch seconds: zone-independent integer
//! arithmetic, inherently DST-safe. Calendar units truncate on the zone's
//! wall-clock fields (start of day, Monday-week, month, year), so the same
//! instant can land in different buckets in different zones, and a DST
//! transition inside a period does not move the boundary.
//!
//! An instant exactly on a boundary maps to itself (floor, never round).
//!
//! # Example
//!
//! ```rust
//! use chrono_tz::UTC;
//! use tally_store::boundary::bucket_start;
//! use tally_store::interval::Interval;
//!
//! let five_minutes = Interval::minutes(5).unwrap();
//! // 1:14 floors to 1:10 on a 300s interval
//! let boundary = bucket_start(&five_minutes, 4_440, UTC).unwrap();
//! assert_eq!(boundary, 4_200);
//! ```

use chrono::{Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

use crate::error::{Error, Result};
use crate::interval::{CalendarUnit, Interval};

/// Compute the canonical bucket boundary containing `instant`
///
/// `instant` is epoch seconds. Fixed intervals ignore the zone entirely;
/// calendar intervals decompose the instant into the zone's wall clock and
/// truncate to the start of the enclosing period.
pub fn bucket_start(interval: &Interval, instant: i64, zone: Tz) -> Result<i64> {
    match interval {
        Interval::Fixed(secs) => {
            let d = i64::from(*secs);
            Ok(instant.div_euclid(d) * d)
        }
        Interval::Calendar(unit) => calendar_start(*unit, instant, zone),
    }
}

/// Compute the boundary of the period *after* the one starting at `boundary`
///
/// `boundary` must itself be a bucket boundary for `interval` in `zone`.
/// Fixed intervals step by their duration; calendar intervals step by one
/// unit of wall-clock time, respecting variable month and year lengths.
pub fn next_boundary(interval: &Interval, boundary: i64, zone: Tz) -> Result<i64> {
    match interval {
        Interval::Fixed(secs) => boundary
            .checked_add(i64::from(*secs))
            .ok_or_else(|| out_of_range(boundary)),
        Interval::Calendar(unit) => {
            let local = local_wall_clock(boundary, zone)?;
            let start = truncate_date(*unit, local.date())?;
            let next = advance_date(*unit, start)?;
            resolve_local(zone, midnight(next)?)
        }
    }
}

/// Exclusive end boundary of the calendar period containing `instant`
///
/// Used to build inclusive range endpoints: the period `[start, end)` of a
/// range's upper instant ends at this boundary.
pub fn period_end(unit: CalendarUnit, instant: i64, zone: Tz) -> Result<i64> {
    let start = calendar_start(unit, instant, zone)?;
    next_boundary(&Interval::Calendar(unit), start, zone)
}

fn calendar_start(unit: CalendarUnit, instant: i64, zone: Tz) -> Result<i64> {
    let local = local_wall_clock(instant, zone)?;
    let start = truncate_date(unit, local.date())?;
    // When a DST gap swallows midnight the resolved boundary is the first
    // representable wall-clock time of the period, still <= every instant
    // inside it.
    resolve_local(zone, midnight(start)?)
}

/// Decompose an instant into the zone's wall-clock representation
fn local_wall_clock(instant: i64, zone: Tz) -> Result<NaiveDateTime> {
    let dt = zone
        .timestamp_opt(instant, 0)
        .single()
        .ok_or_else(|| out_of_range(instant))?;
    Ok(dt.naive_local())
}

/// Truncate a local date to the start date of its enclosing period
fn truncate_date(unit: CalendarUnit, date: NaiveDate) -> Result<NaiveDate> {
    let start = match unit {
        CalendarUnit::Day => Some(date),
        CalendarUnit::Week => {
            let back = i64::from(date.weekday().num_days_from_monday());
            date.checked_sub_signed(Duration::days(back))
        }
        CalendarUnit::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1),
        CalendarUnit::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1),
    };
    start.ok_or_else(|| date_out_of_range(date))
}

/// Step a period start date forward by one unit
fn advance_date(unit: CalendarUnit, start: NaiveDate) -> Result<NaiveDate> {
    let next = match unit {
        CalendarUnit::Day => start.checked_add_signed(Duration::days(1)),
        CalendarUnit::Week => start.checked_add_signed(Duration::days(7)),
        CalendarUnit::Month => start.checked_add_months(chrono::Months::new(1)),
        CalendarUnit::Year => start.checked_add_months(chrono::Months::new(12)),
    };
    next.ok_or_else(|| date_out_of_range(start))
}

fn midnight(date: NaiveDate) -> Result<NaiveDateTime> {
    date.and_hms_opt(0, 0, 0).ok_or_else(|| date_out_of_range(date))
}

/// Map a local wall-clock time back to an instant in `zone`
///
/// DST policy: an ambiguous local time (fall-back) resolves to the earlier
/// offset; a nonexistent local time (spring-forward gap, which can swallow
/// midnight in zones like America/Sao_Paulo) rolls forward in 15-minute
/// steps until a representable time is found.
fn resolve_local(zone: Tz, naive: NaiveDateTime) -> Result<i64> {
    let mut candidate = naive;
    // DST gaps are at most a few hours; 16 steps cover 4h.
    for _ in 0..16 {
        match zone.from_local_datetime(&candidate) {
            LocalResult::Single(dt) => return Ok(dt.timestamp()),
            LocalResult::Ambiguous(earlier, later) => {
                return Ok(earlier.timestamp().min(later.timestamp()));
            }
            LocalResult::None => {
                candidate = candidate
                    .checked_add_signed(Duration::minutes(15))
                    .ok_or_else(|| out_of_range(naive.and_utc().timestamp()))?;
            }
        }
    }
    Err(Error::Configuration(format!(
        "Unresolvable local time {} in zone {}",
        naive, zone
    )))
}

fn out_of_range(instant: i64) -> Error {
    Error::Configuration(format!("Timestamp {} is out of representable range", instant))
}

fn date_out_of_range(date: NaiveDate) -> Error {
    Error::Configuration(format!("Date {} is out of representable range", date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::{America::New_York, America::Sao_Paulo, Europe::Moscow, UTC};

    fn utc_secs(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> i64 {
        UTC.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap().timestamp()
    }

    #[test]
    fn fixed_floor_is_zone_independent() {
        let interval = Interval::minutes(5).unwrap();
        let t = utc_secs(2014, 1, 1, 1, 14, 30);
        let expected = utc_secs(2014, 1, 1, 1, 10, 0);
        assert_eq!(bucket_start(&interval, t, UTC).unwrap(), expected);
        assert_eq!(bucket_start(&interval, t, New_York).unwrap(), expected);
        assert_eq!(bucket_start(&interval, t, Moscow).unwrap(), expected);
    }

    #[test]
    fn boundary_maps_to_itself() {
        let interval = Interval::minutes(5).unwrap();
        let t = utc_secs(2014, 1, 1, 1, 10, 0);
        assert_eq!(bucket_start(&interval, t, UTC).unwrap(), t);

        let day = Interval::Calendar(CalendarUnit::Day);
        let midnight = utc_secs(2014, 1, 1, 0, 0, 0);
        assert_eq!(bucket_start(&day, midnight, UTC).unwrap(), midnight);
    }

    #[test]
    fn fixed_floor_before_epoch() {
        let interval = Interval::minutes(1).unwrap();
        // -30s floors to -60, not to 0
        assert_eq!(bucket_start(&interval, -30, UTC).unwrap(), -60);
    }

    #[test]
    fn day_truncation_depends_on_zone() {
        // 2014-01-01 02:00 UTC is still 2013-12-31 21:00 in New York
        let t = utc_secs(2014, 1, 1, 2, 0, 0);
        let day = Interval::Calendar(CalendarUnit::Day);

        let utc_day = bucket_start(&day, t, UTC).unwrap();
        assert_eq!(utc_day, utc_secs(2014, 1, 1, 0, 0, 0));

        let ny_day = bucket_start(&day, t, New_York).unwrap();
        let expected = New_York
            .with_ymd_and_hms(2013, 12, 31, 0, 0, 0)
            .unwrap()
            .timestamp();
        assert_eq!(ny_day, expected);
    }

    #[test]
    fn week_starts_monday() {
        // 2014-01-01 was a Wednesday; its week starts Monday 2013-12-30
        let t = utc_secs(2014, 1, 1, 12, 0, 0);
        let week = Interval::Calendar(CalendarUnit::Week);
        assert_eq!(
            bucket_start(&week, t, UTC).unwrap(),
            utc_secs(2013, 12, 30, 0, 0, 0)
        );
    }

    #[test]
    fn month_and_year_truncation() {
        let t = utc_secs(2014, 3, 15, 18, 30, 0);
        assert_eq!(
            bucket_start(&Interval::Calendar(CalendarUnit::Month), t, UTC).unwrap(),
            utc_secs(2014, 3, 1, 0, 0, 0)
        );
        assert_eq!(
            bucket_start(&Interval::Calendar(CalendarUnit::Year), t, UTC).unwrap(),
            utc_secs(2014, 1, 1, 0, 0, 0)
        );
    }

    #[test]
    fn month_boundary_spans_dst_transition() {
        // March 2021 in New York contains the spring-forward on the 14th.
        // The month boundary is local midnight March 1 regardless.
        let t = New_York
            .with_ymd_and_hms(2021, 3, 20, 12, 0, 0)
            .unwrap()
            .timestamp();
        let expected = New_York
            .with_ymd_and_hms(2021, 3, 1, 0, 0, 0)
            .unwrap()
            .timestamp();
        assert_eq!(
            bucket_start(&Interval::Calendar(CalendarUnit::Month), t, New_York).unwrap(),
            expected
        );
    }

    #[test]
    fn dst_gap_at_midnight_rolls_forward() {
        // Sao Paulo's 2017 spring-forward (Oct 15) skipped midnight:
        // clocks jumped 23:59:59 -> 01:00:00. The day boundary resolves to
        // the first representable wall-clock time of that day.
        let t = Sao_Paulo
            .with_ymd_and_hms(2017, 10, 15, 12, 0, 0)
            .unwrap()
            .timestamp();
        let boundary =
            bucket_start(&Interval::Calendar(CalendarUnit::Day), t, Sao_Paulo).unwrap();
        let resolved = Sao_Paulo.timestamp_opt(boundary, 0).unwrap();
        assert_eq!(resolved.naive_local().to_string(), "2017-10-15 01:00:00");
    }

    #[test]
    fn next_boundary_steps_variable_month_lengths() {
        let month = Interval::Calendar(CalendarUnit::Month);
        let jan = utc_secs(2014, 1, 1, 0, 0, 0);
        let feb = next_boundary(&month, jan, UTC).unwrap();
        assert_eq!(feb, utc_secs(2014, 2, 1, 0, 0, 0));
        let mar = next_boundary(&month, feb, UTC).unwrap();
        assert_eq!(mar, utc_secs(2014, 3, 1, 0, 0, 0));
    }

    #[test]
    fn next_boundary_fixed_is_plain_addition() {
        let interval = Interval::minutes(5).unwrap();
        assert_eq!(next_boundary(&interval, 300, UTC).unwrap(), 600);
    }

    #[test]
    fn period_end_is_exclusive_upper_bound() {
        let t = utc_secs(2014, 1, 15, 12, 0, 0);
        assert_eq!(
            period_end(CalendarUnit::Month, t, UTC).unwrap(),
            utc_secs(2014, 2, 1, 0, 0, 0)
        );
        assert_eq!(
            period_end(CalendarUnit::Year, t, UTC).unwrap(),
            utc_secs(2015, 1, 1, 0, 0, 0)
        );
    }

    #[test]
    fn fall_back_ambiguity_takes_earlier_offset() {
        // 2021-11-07 in New York repeats 01:00-02:00. A day boundary is
        // midnight (unambiguous), but resolve a week containing it to make
        // sure stepping across the transition stays stable.
        let week = Interval::Calendar(CalendarUnit::Week);
        let sunday = New_York
            .with_ymd_and_hms(2021, 11, 7, 12, 0, 0)
            .unwrap()
            .timestamp();
        let start = bucket_start(&week, sunday, New_York).unwrap();
        let expected = New_York
            .with_ymd_and_hms(2021, 11, 1, 0, 0, 0)
            .unwrap()
            .timestamp();
        assert_eq!(start, expected);
        // The following week starts Nov 8; the 25-hour day in between
        // must not shift the boundary off midnight.
        let next = next_boundary(&week, start, New_York).unwrap();
        let resolved = New_York.timestamp_opt(next, 0).unwrap();
        assert_eq!(resolved.naive_local().to_string(), "2021-11-08 00:00:00");
    }
}
