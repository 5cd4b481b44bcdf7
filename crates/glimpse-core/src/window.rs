//! Normalization of user-supplied date ranges into query windows.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::error::WindowError;

/// Date format accepted for `startDate` / `endDate`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Lookback used when a request carries no explicit range.
pub const DEFAULT_LOOKBACK_HOURS: i64 = 24;

/// Time-series granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketSize {
    Hour,
    Day,
}

impl BucketSize {
    pub fn label(self) -> &'static str {
        match self {
            BucketSize::Hour => "1 hour",
            BucketSize::Day => "1 day",
        }
    }

    /// Unit name understood by SQL `date_trunc`.
    pub fn trunc_unit(self) -> &'static str {
        match self {
            BucketSize::Hour => "hour",
            BucketSize::Day => "day",
        }
    }
}

impl fmt::Display for BucketSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for BucketSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// An explicit calendar range: `start` inclusive, `end` exclusive.
///
/// Only constructed by [`normalize_window`], so `start < end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// Absolute instants a store query is scoped to. `end: None` is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && self.end.map_or(true, |end| instant < end)
    }
}

/// A validated analytics window for one application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestWindow {
    tracking_id: Uuid,
    range: Option<DateRange>,
    bucket: BucketSize,
}

impl RequestWindow {
    pub fn tracking_id(&self) -> Uuid {
        self.tracking_id
    }

    pub fn range(&self) -> Option<DateRange> {
        self.range
    }

    pub fn bucket(&self) -> BucketSize {
        self.bucket
    }

    /// Resolve the window to absolute instants. An unset range means the last
    /// 24 hours before `now`.
    pub fn time_range(&self, now: DateTime<Utc>) -> TimeRange {
        match self.range {
            Some(range) => TimeRange {
                start: range.start.and_time(chrono::NaiveTime::MIN).and_utc(),
                end: Some(range.end.and_time(chrono::NaiveTime::MIN).and_utc()),
            },
            None => TimeRange {
                start: now - Duration::hours(DEFAULT_LOOKBACK_HOURS),
                end: None,
            },
        }
    }
}

/// Turn optional `YYYY-MM-DD` strings into a [`RequestWindow`].
///
/// Empty strings count as absent. With both dates present the end date is
/// shifted one day forward so the whole end day is included.
pub fn normalize_window(
    tracking_id: Uuid,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<RequestWindow, WindowError> {
    let start_date = start_date.map(str::trim).filter(|s| !s.is_empty());
    let end_date = end_date.map(str::trim).filter(|s| !s.is_empty());

    let (start_raw, end_raw) = match (start_date, end_date) {
        (None, None) => {
            return Ok(RequestWindow {
                tracking_id,
                range: None,
                bucket: BucketSize::Hour,
            })
        }
        (Some(start), Some(end)) => (start, end),
        _ => return Err(WindowError::IncompleteRange),
    };

    let start = parse_date(start_raw)?;
    let end = parse_date(end_raw)?;

    if start > end {
        return Err(WindowError::RangeInverted);
    }
    if start == end {
        return Err(WindowError::RangeEmpty);
    }

    let end = end
        .succ_opt()
        .ok_or_else(|| WindowError::InvalidDateFormat(end_raw.to_string()))?;

    Ok(RequestWindow {
        tracking_id,
        range: Some(DateRange { start, end }),
        bucket: BucketSize::Day,
    })
}

/// Strict `YYYY-MM-DD`. chrono alone also accepts unpadded months and days.
fn parse_date(raw: &str) -> Result<NaiveDate, WindowError> {
    let invalid = || WindowError::InvalidDateFormat(raw.to_string());
    let date = NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| invalid())?;
    if date.format(DATE_FORMAT).to_string() != raw {
        return Err(invalid());
    }
    Ok(date)
}
