use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::JournalDate;
use crate::shared::{DomainError, UserId};
use crate::subject::{PairSide, Subject, UserPair};

/// Counter for a single user's daily posting streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SoloStreak {
    streak_count: u32,
    longest_streak: u32,
    last_activity_date: Option<JournalDate>,
}

impl SoloStreak {
    pub fn restore(
        streak_count: u32,
        longest_streak: u32,
        last_activity_date: Option<JournalDate>,
    ) -> Result<Self, DomainError> {
        if longest_streak < streak_count {
            return Err(DomainError::DataIntegrity(format!(
                "longest_streak {longest_streak} is below streak_count {streak_count}"
            )));
        }
        if last_activity_date.is_some() != (streak_count > 0) {
            return Err(DomainError::DataIntegrity(
                "streak_count must be zero exactly when no activity was recorded".to_string(),
            ));
        }
        Ok(Self {
            streak_count,
            longest_streak,
            last_activity_date,
        })
    }

    pub fn streak_count(&self) -> u32 {
        self.streak_count
    }

    pub fn longest_streak(&self) -> u32 {
        self.longest_streak
    }

    pub fn last_activity_date(&self) -> Option<JournalDate> {
        self.last_activity_date
    }

    /// True while posting today still extends the current streak.
    pub fn is_alive(&self, today: JournalDate) -> bool {
        match self.last_activity_date {
            Some(last) => last == today || last == today.previous(),
            None => false,
        }
    }

    fn advance(&self, date: JournalDate) -> Result<Option<Self>, DomainError> {
        let streak_count = match self.last_activity_date {
            Some(last) if last == date => return Ok(None),
            Some(last) if date < last => {
                return Err(DomainError::OutOfOrderActivity(format!(
                    "journal date {date} is before last activity {last}"
                )))
            }
            Some(last) if date.is_day_after(last) => self.streak_count + 1,
            _ => 1,
        };

        Ok(Some(Self {
            streak_count,
            longest_streak: self.longest_streak.max(streak_count),
            last_activity_date: Some(date),
        }))
    }
}

/// Mutual streak between two users.
///
/// Only dates are kept. The count is the length of the current joint chain,
/// i.e. every day from `chain_start` through the pair's completed day
/// (`min(last_first, last_second)`) had a post from both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PairStreak {
    last_first: Option<JournalDate>,
    last_second: Option<JournalDate>,
    chain_start: Option<JournalDate>,
}

impl PairStreak {
    pub fn restore(
        last_first: Option<JournalDate>,
        last_second: Option<JournalDate>,
        chain_start: Option<JournalDate>,
    ) -> Result<Self, DomainError> {
        let streak = Self {
            last_first,
            last_second,
            chain_start,
        };
        if let Some(start) = chain_start {
            match streak.completed_day() {
                Some(completed) if start <= completed => {}
                _ => {
                    return Err(DomainError::DataIntegrity(format!(
                        "chain start {start} is after the pair's completed day"
                    )))
                }
            }
        }
        Ok(streak)
    }

    pub fn last_contribution(&self, side: PairSide) -> Option<JournalDate> {
        match side {
            PairSide::First => self.last_first,
            PairSide::Second => self.last_second,
        }
    }

    pub fn chain_start(&self) -> Option<JournalDate> {
        self.chain_start
    }

    /// Latest day both sides have reached.
    pub fn completed_day(&self) -> Option<JournalDate> {
        match (self.last_first, self.last_second) {
            (Some(a), Some(b)) => Some(a.min(b)),
            _ => None,
        }
    }

    pub fn streak_count(&self) -> u32 {
        match (self.chain_start, self.completed_day()) {
            (Some(start), Some(completed)) => (completed.days_since(start) + 1).max(0) as u32,
            _ => 0,
        }
    }

    /// Both sides posted today or yesterday and a chain is running.
    pub fn is_active(&self, today: JournalDate) -> bool {
        let recent = |date: Option<JournalDate>| {
            date.is_some_and(|d| d == today || d == today.previous())
        };
        self.chain_start.is_some() && recent(self.last_first) && recent(self.last_second)
    }

    /// Count as seen on `today`; a lapsed chain reads as zero.
    pub fn effective_count(&self, today: JournalDate) -> u32 {
        if self.is_active(today) {
            self.streak_count()
        } else {
            0
        }
    }

    pub fn needs_post(&self, side: PairSide, today: JournalDate) -> bool {
        self.last_contribution(side) != Some(today)
    }

    fn advance(&self, side: PairSide, date: JournalDate) -> Result<Option<Self>, DomainError> {
        let mine = self.last_contribution(side);
        if let Some(last) = mine {
            if last == date {
                return Ok(None);
            }
            if date < last {
                return Err(DomainError::OutOfOrderActivity(format!(
                    "journal date {date} is before last contribution {last}"
                )));
            }
        }

        let yesterday = date.previous();
        let posted_yesterday = mine == Some(yesterday);

        let chain_start = match self.last_contribution(side.opposite()) {
            // Both posted today: extend a chain that covered yesterday, else start one.
            Some(other) if other == date => match self.chain_start {
                Some(start) if posted_yesterday => Some(start),
                _ => Some(date),
            },
            // Partner is waiting on today; the chain survives only if we did not skip yesterday.
            Some(other) if other == yesterday && posted_yesterday => self.chain_start,
            _ => None,
        };

        let mut next = *self;
        match side {
            PairSide::First => next.last_first = Some(date),
            PairSide::Second => next.last_second = Some(date),
        }
        next.chain_start = chain_start;
        Ok(Some(next))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum StreakProgress {
    Solo(SoloStreak),
    Pair(PairStreak),
}

impl StreakProgress {
    pub fn streak_count(&self) -> u32 {
        match self {
            StreakProgress::Solo(solo) => solo.streak_count(),
            StreakProgress::Pair(pair) => pair.streak_count(),
        }
    }
}

/// Result of applying one activity to a streak.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Duplicate for an already counted journal date.
    Unchanged,
    Advanced(StreakState),
}

/// StreakState aggregate root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    subject: Subject,
    progress: StreakProgress,
    updated_at: Option<DateTime<Utc>>,
    version: i64,
}

impl StreakState {
    /// State of a subject with no recorded activity.
    pub fn empty(subject: Subject) -> Self {
        let progress = match subject {
            Subject::Solo { .. } => StreakProgress::Solo(SoloStreak::default()),
            Subject::Pair { .. } => StreakProgress::Pair(PairStreak::default()),
        };
        Self {
            subject,
            progress,
            updated_at: None,
            version: 0,
        }
    }

    /// Reconstruct from persistence
    pub fn from_persistence(
        subject: Subject,
        progress: StreakProgress,
        updated_at: DateTime<Utc>,
        version: i64,
    ) -> Result<Self, DomainError> {
        let shapes_match = matches!(
            (&subject, &progress),
            (Subject::Solo { .. }, StreakProgress::Solo(_))
                | (Subject::Pair { .. }, StreakProgress::Pair(_))
        );
        if !shapes_match {
            return Err(DomainError::DataIntegrity(format!(
                "Streak progress shape does not match subject {subject}"
            )));
        }
        Ok(Self {
            subject,
            progress,
            updated_at: Some(updated_at),
            version,
        })
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn progress(&self) -> &StreakProgress {
        &self.progress
    }

    pub fn streak_count(&self) -> u32 {
        self.progress.streak_count()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Version this state was read at; 0 when it was never stored.
    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn as_solo(&self) -> Option<&SoloStreak> {
        match &self.progress {
            StreakProgress::Solo(solo) => Some(solo),
            StreakProgress::Pair(_) => None,
        }
    }

    pub fn as_pair(&self) -> Option<(&UserPair, &PairStreak)> {
        match (&self.subject, &self.progress) {
            (Subject::Pair { pair }, StreakProgress::Pair(progress)) => Some((pair, progress)),
            _ => None,
        }
    }

    /// Apply an activity by `contributor` on `date`.
    ///
    /// The returned state carries `version + 1`; storing it is the caller's job.
    pub fn apply(
        &self,
        contributor: UserId,
        date: JournalDate,
        now: DateTime<Utc>,
    ) -> Result<Transition, DomainError> {
        let next = match (&self.subject, &self.progress) {
            (Subject::Solo { user }, StreakProgress::Solo(solo)) => {
                if *user != contributor {
                    return Err(DomainError::Validation(format!(
                        "User {contributor} cannot contribute to {}",
                        self.subject
                    )));
                }
                solo.advance(date)?.map(StreakProgress::Solo)
            }
            (Subject::Pair { pair }, StreakProgress::Pair(progress)) => {
                let side = pair.side_of(contributor).ok_or_else(|| {
                    DomainError::Validation(format!(
                        "User {contributor} is not part of {}",
                        self.subject
                    ))
                })?;
                progress.advance(side, date)?.map(StreakProgress::Pair)
            }
            _ => {
                return Err(DomainError::DataIntegrity(format!(
                    "Streak progress shape does not match subject {}",
                    self.subject
                )))
            }
        };

        Ok(match next {
            Some(progress) => Transition::Advanced(Self {
                subject: self.subject,
                progress,
                updated_at: Some(now),
                version: self.version + 1,
            }),
            None => Transition::Unchanged,
        })
    }
}
