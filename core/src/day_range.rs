//! Calendar-day boundaries in a fixed reference timezone.
//!
//! Entries are stored with absolute UTC timestamps, but users think in civil
//! days of one particular zone. A day is the half-open interval from local
//! midnight of the date to local midnight of the next date, which is 23, 24
//! or 25 hours of absolute time depending on DST. Nothing in here reads the
//! host's timezone or the wall clock: the zone and "now" are arguments.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::{Error, Result};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// `[start, end)` in absolute time for one civil date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayRange {
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayRange {
    pub fn for_date(date: NaiveDate, tz: Tz) -> Result<Self> {
        let next = date
            .succ_opt()
            .ok_or_else(|| Error::InvalidDateFormat(date.format(DATE_FORMAT).to_string()))?;
        Ok(Self {
            date,
            start: start_of_day(date, tz),
            end: start_of_day(next, tz),
        })
    }

    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    #[must_use]
    pub fn length(&self) -> TimeDelta {
        self.end - self.start
    }
}

/// Parse a strict `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| Error::InvalidDateFormat(input.to_string()))
}

/// The civil date in `tz` at the instant `now`.
#[must_use]
pub fn today_in(tz: Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Resolve an optional date string to its absolute range.
///
/// `None` means "today in `tz` as of `now`"; `now` is not used otherwise.
pub fn resolve_day_range(date: Option<&str>, tz: Tz, now: DateTime<Utc>) -> Result<DayRange> {
    let date = match date {
        Some(s) => parse_date(s)?,
        None => today_in(tz, now),
    };
    DayRange::for_date(date, tz)
}

/// First instant of `date` in `tz`.
///
/// Midnight may fall inside a DST gap in a few zones; the day then starts at
/// the first local time that exists. An ambiguous midnight resolves to the
/// earlier instant.
fn start_of_day(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let mut local = date.and_time(NaiveTime::MIN);
    loop {
        if let Some(instant) = tz.from_local_datetime(&local).earliest() {
            return instant.with_timezone(&Utc);
        }
        local += TimeDelta::minutes(15);
    }
}
