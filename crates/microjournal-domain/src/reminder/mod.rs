//! Reminder windows and the delivery ledger that keeps reminders idempotent.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::clock::JournalDate;
use crate::shared::{DomainError, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    DailyReminder,
    StreakExpiry,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderKind::DailyReminder => "daily_reminder",
            ReminderKind::StreakExpiry => "streak_expiry",
        }
    }
}

impl FromStr for ReminderKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily_reminder" => Ok(ReminderKind::DailyReminder),
            "streak_expiry" => Ok(ReminderKind::StreakExpiry),
            _ => Err(DomainError::DataIntegrity(format!(
                "Unknown reminder kind: {s}"
            ))),
        }
    }
}

impl fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Local-time interval `[start, start + minutes]`, inclusive at both ends.
///
/// Windows may cross midnight (e.g. 23:55 for 10 minutes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WindowConfig", into = "WindowConfig")]
pub struct ReminderWindow {
    start: NaiveTime,
    minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WindowConfig {
    start: String,
    minutes: u32,
}

impl ReminderWindow {
    const MINUTES_PER_DAY: u32 = 24 * 60;

    pub fn new(start: NaiveTime, minutes: u32) -> Result<Self, DomainError> {
        if minutes >= Self::MINUTES_PER_DAY {
            return Err(DomainError::Validation(format!(
                "Reminder window must be shorter than a day, got {minutes} minutes"
            )));
        }
        Ok(Self { start, minutes })
    }

    /// 21:00 for 5 minutes.
    pub fn daily_default() -> Self {
        Self {
            start: NaiveTime::MIN + Duration::hours(21),
            minutes: 5,
        }
    }

    /// 12:00 for 15 minutes.
    pub fn expiry_default() -> Self {
        Self {
            start: NaiveTime::MIN + Duration::hours(12),
            minutes: 15,
        }
    }

    /// Parse `HH:MM`.
    pub fn parse(start: &str, minutes: u32) -> Result<Self, DomainError> {
        let start = NaiveTime::parse_from_str(start.trim(), "%H:%M").map_err(|e| {
            DomainError::Validation(format!("Invalid window start '{start}': {e}"))
        })?;
        Self::new(start, minutes)
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    /// Seconds are ignored; 21:05:59 is inside a 21:00 + 5 window.
    pub fn contains(&self, local: NaiveTime) -> bool {
        let minute_of_day = |t: NaiveTime| t.hour() * 60 + t.minute();
        let offset = (minute_of_day(local) + Self::MINUTES_PER_DAY - minute_of_day(self.start))
            % Self::MINUTES_PER_DAY;
        offset <= self.minutes
    }
}

impl TryFrom<WindowConfig> for ReminderWindow {
    type Error = DomainError;

    fn try_from(value: WindowConfig) -> Result<Self, Self::Error> {
        Self::parse(&value.start, value.minutes)
    }
}

impl From<ReminderWindow> for WindowConfig {
    fn from(value: ReminderWindow) -> Self {
        Self {
            start: value.start.format("%H:%M").to_string(),
            minutes: value.minutes,
        }
    }
}

/// Record of reminders already sent, keyed by `(user, kind, journal_date)`.
#[async_trait]
pub trait ReminderLedger: Send + Sync {
    /// Claim the slot. Returns `false` if it was already claimed.
    async fn try_claim(
        &self,
        user: UserId,
        kind: ReminderKind,
        journal_date: JournalDate,
        claimed_at: DateTime<Utc>,
    ) -> Result<bool, DomainError>;

    /// Drop a claim so a later scan may retry.
    async fn release(
        &self,
        user: UserId,
        kind: ReminderKind,
        journal_date: JournalDate,
    ) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let window = ReminderWindow::parse("21:00", 5).unwrap();
        assert!(!window.contains(t(20, 59)));
        assert!(window.contains(t(21, 0)));
        assert!(window.contains(t(21, 5)));
        assert!(!window.contains(t(21, 6)));
    }

    #[test]
    fn test_window_wraps_midnight() {
        let window = ReminderWindow::parse("23:55", 10).unwrap();
        assert!(window.contains(t(23, 58)));
        assert!(window.contains(t(0, 5)));
        assert!(!window.contains(t(0, 6)));
        assert!(!window.contains(t(23, 54)));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(ReminderWindow::daily_default(), ReminderWindow::parse("21:00", 5).unwrap());
        assert_eq!(ReminderWindow::expiry_default(), ReminderWindow::parse("12:00", 15).unwrap());
    }

    #[test]
    fn test_window_rejects_bad_input() {
        assert!(ReminderWindow::parse("25:00", 5).is_err());
        assert!(ReminderWindow::parse("12:00", 24 * 60).is_err());
    }

    #[test]
    fn test_window_serde_uses_hh_mm() {
        let window = ReminderWindow::parse("12:00", 15).unwrap();
        let json = serde_json::to_string(&window).unwrap();
        assert_eq!(json, r#"{"start":"12:00","minutes":15}"#);
        let back: ReminderWindow = serde_json::from_str(&json).unwrap();
        assert_eq!(back, window);
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in [ReminderKind::DailyReminder, ReminderKind::StreakExpiry] {
            assert_eq!(kind.as_str().parse::<ReminderKind>().unwrap(), kind);
        }
    }
}
