//! Journal-day computation.
//!
//! A journal day runs from `cutoff_hour:00` local time to the same hour on the
//! next calendar day, so a post written at 01:30 still belongs to the evening
//! before it.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::shared::DomainError;

/// Timezone-local calendar date an activity is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JournalDate(NaiveDate);

impl JournalDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, DomainError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| {
                DomainError::Validation(format!("Invalid date: {year:04}-{month:02}-{day:02}"))
            })
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }

    pub fn previous(&self) -> Self {
        Self(self.0 - Duration::days(1))
    }

    pub fn next(&self) -> Self {
        Self(self.0 + Duration::days(1))
    }

    /// Signed number of days from `earlier` to `self`.
    pub fn days_since(&self, earlier: JournalDate) -> i64 {
        (self.0 - earlier.0).num_days()
    }

    pub fn is_day_after(&self, other: JournalDate) -> bool {
        self.days_since(other) == 1
    }
}

impl fmt::Display for JournalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for JournalDate {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self)
            .map_err(|e| DomainError::Validation(format!("Invalid journal date '{s}': {e}")))
    }
}

/// Local hour-of-day before which activity counts towards the previous date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct CutoffHour(u32);

impl CutoffHour {
    pub fn new(hour: u32) -> Result<Self, DomainError> {
        if hour > 23 {
            return Err(DomainError::Validation(format!(
                "Cutoff hour must be between 0 and 23, got {hour}"
            )));
        }
        Ok(Self(hour))
    }

    pub fn hour(&self) -> u32 {
        self.0
    }
}

impl Default for CutoffHour {
    fn default() -> Self {
        Self(6)
    }
}

impl TryFrom<u32> for CutoffHour {
    type Error = DomainError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CutoffHour> for u32 {
    fn from(value: CutoffHour) -> Self {
        value.0
    }
}

/// Resolve an IANA timezone identifier such as `America/New_York`.
pub fn resolve_timezone(timezone_id: &str) -> Result<Tz, DomainError> {
    timezone_id
        .trim()
        .parse::<Tz>()
        .map_err(|_| DomainError::InvalidTimezone(timezone_id.to_string()))
}

/// Wall-clock time in `timezone_id` at `instant_utc`.
pub fn local_time(
    instant_utc: DateTime<Utc>,
    timezone_id: &str,
) -> Result<NaiveDateTime, DomainError> {
    let tz = resolve_timezone(timezone_id)?;
    Ok(instant_utc.with_timezone(&tz).naive_local())
}

pub fn compute_journal_date(
    instant_utc: DateTime<Utc>,
    timezone_id: &str,
    cutoff: CutoffHour,
) -> Result<JournalDate, DomainError> {
    let local = local_time(instant_utc, timezone_id)?;
    Ok(journal_date_for_local(local, cutoff))
}

/// Cutoff adjustment applied to an already-converted local time.
pub fn journal_date_for_local(local: NaiveDateTime, cutoff: CutoffHour) -> JournalDate {
    let date = local.date();
    if local.hour() < cutoff.hour() {
        JournalDate(date - Duration::days(1))
    } else {
        JournalDate(date)
    }
}

/// Source of the current instant; injected so scans can be replayed in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
