//! Interval model: fixed durations and calendar units
//!
//! A counter's granularity is either a fixed number of seconds or a calendar
//! unit (day, week, month, year). The two behave very differently at bucket
//! boundaries: fixed durations floor on epoch arithmetic, calendar units
//! truncate on wall-clock fields (see [`crate::boundary`]).
//!
//! # Example
//!
//! ```rust
//! use tally_store::interval::{CalendarUnit, Interval};
//!
//! let five_minutes = Interval::minutes(5).unwrap();
//! assert_eq!(five_minutes.to_scalar(), 300);
//! assert!(!five_minutes.is_calendar());
//!
//! let monthly = Interval::Calendar(CalendarUnit::Month);
//! assert!(monthly.is_calendar());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::IntervalError;

/// A calendar unit with variable-length periods
///
/// Months and years differ in length between periods, and days and weeks
/// differ across DST transitions, so calendar buckets cannot be derived from
/// epoch arithmetic alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarUnit {
    /// One calendar day, midnight to midnight in the query zone
    Day,
    /// One calendar week, starting Monday
    Week,
    /// One calendar month
    Month,
    /// One calendar year
    Year,
}

impl CalendarUnit {
    /// Canonical reference magnitude in seconds
    ///
    /// These are the conventional average-length constants (a month is
    /// 30.436875 days, a year 365.2425 days). They are used only for
    /// ordering comparisons against fixed durations; bucket math never
    /// touches them.
    pub fn approx_seconds(self) -> i64 {
        match self {
            CalendarUnit::Day => 86_400,
            CalendarUnit::Week => 604_800,
            CalendarUnit::Month => 2_629_746,
            CalendarUnit::Year => 31_556_952,
        }
    }
}

impl fmt::Display for CalendarUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CalendarUnit::Day => "day",
            CalendarUnit::Week => "week",
            CalendarUnit::Month => "month",
            CalendarUnit::Year => "year",
        };
        write!(f, "{}", s)
    }
}

/// A counter granularity: fixed duration or calendar unit
///
/// `Interval` is a plain value object. It is declared once per counter as
/// the base interval and may also appear as the requested interval of a
/// query, where it must be a valid coarsening of the base (validated by
/// [`crate::registry::CounterRegistry::validate_query_interval`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    /// A fixed duration in seconds, always positive
    Fixed(u32),
    /// A variable-length calendar unit
    Calendar(CalendarUnit),
}

impl Interval {
    /// Create a fixed interval from a number of seconds
    ///
    /// Returns [`IntervalError::ZeroDuration`] for zero; fixed intervals
    /// must span at least one second.
    pub fn fixed(seconds: u32) -> Result<Self, IntervalError> {
        if seconds == 0 {
            return Err(IntervalError::ZeroDuration);
        }
        Ok(Interval::Fixed(seconds))
    }

    /// Create a fixed interval from a number of minutes
    pub fn minutes(minutes: u32) -> Result<Self, IntervalError> {
        Self::fixed(minutes.saturating_mul(60))
    }

    /// Create a fixed interval from a number of hours
    pub fn hours(hours: u32) -> Result<Self, IntervalError> {
        Self::fixed(hours.saturating_mul(3_600))
    }

    /// Scalar magnitude in seconds, for ordering comparisons only
    ///
    /// Fixed durations return their exact second count. Calendar units
    /// return the approximate reference magnitude from
    /// [`CalendarUnit::approx_seconds`]; the approximation is advisory and
    /// can misclassify edge cases (a 6-day fixed base accepts a week
    /// request). Bucket boundary math never uses this value for calendar
    /// units.
    pub fn to_scalar(&self) -> i64 {
        match self {
            Interval::Fixed(secs) => i64::from(*secs),
            Interval::Calendar(unit) => unit.approx_seconds(),
        }
    }

    /// Whether this interval is a calendar unit
    pub fn is_calendar(&self) -> bool {
        matches!(self, Interval::Calendar(_))
    }

    /// The exact second count of a fixed interval, if fixed
    pub fn fixed_seconds(&self) -> Option<i64> {
        match self {
            Interval::Fixed(secs) => Some(i64::from(*secs)),
            Interval::Calendar(_) => None,
        }
    }
}

impl From<CalendarUnit> for Interval {
    fn from(unit: CalendarUnit) -> Self {
        Interval::Calendar(unit)
    }
}

/// Fixed intervals render as a second count with an `s` suffix, calendar
/// intervals as their unit name; this is the form embedded in diagnostics.
impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Fixed(secs) => write!(f, "{}s", secs),
            Interval::Calendar(unit) => write!(f, "{}", unit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_rejects_zero() {
        assert!(matches!(Interval::fixed(0), Err(IntervalError::ZeroDuration)));
        assert!(Interval::fixed(1).is_ok());
    }

    #[test]
    fn constructors_scale() {
        assert_eq!(Interval::minutes(5).unwrap(), Interval::Fixed(300));
        assert_eq!(Interval::hours(2).unwrap(), Interval::Fixed(7_200));
    }

    #[test]
    fn scalar_magnitudes() {
        assert_eq!(Interval::Fixed(300).to_scalar(), 300);
        assert_eq!(Interval::Calendar(CalendarUnit::Day).to_scalar(), 86_400);
        assert_eq!(Interval::Calendar(CalendarUnit::Week).to_scalar(), 604_800);
        assert_eq!(
            Interval::Calendar(CalendarUnit::Month).to_scalar(),
            2_629_746
        );
        assert_eq!(
            Interval::Calendar(CalendarUnit::Year).to_scalar(),
            31_556_952
        );
    }

    #[test]
    fn calendar_detection() {
        assert!(Interval::Calendar(CalendarUnit::Week).is_calendar());
        assert!(!Interval::Fixed(60).is_calendar());
        assert_eq!(Interval::Fixed(60).fixed_seconds(), Some(60));
        assert_eq!(Interval::Calendar(CalendarUnit::Week).fixed_seconds(), None);
    }

    #[test]
    fn display_formats() {
        assert_eq!(Interval::Fixed(300).to_string(), "300s");
        assert_eq!(Interval::Calendar(CalendarUnit::Month).to_string(), "month");
    }

    #[test]
    fn serde_round_trip() {
        let json = serde_json_like(&Interval::Calendar(CalendarUnit::Week));
        assert!(json.contains("week"));
    }

    fn serde_json_like(interval: &Interval) -> String {
        toml::to_string(&std::collections::BTreeMap::from([("interval", interval)])).unwrap()
    }
}
