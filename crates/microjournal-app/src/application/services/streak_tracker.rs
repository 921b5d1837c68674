use log::{debug, warn};
use serde::Serialize;
use std::sync::Arc;

use microjournal_domain::clock::{Clock, JournalDate};
use microjournal_domain::shared::{DomainError, UserId};
use microjournal_domain::streak::{StreakRepository, StreakState, Transition};
use microjournal_domain::subject::Subject;

const DEFAULT_MAX_ATTEMPTS: usize = 8;

/// Result of `record_activity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    pub state: StreakState,
    /// False when the date was already counted.
    pub changed: bool,
}

/// A user's view of one pair streak.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairStreakView {
    pub partner: UserId,
    /// Zero once the chain has lapsed.
    pub streak_count: u32,
    pub is_active: bool,
    pub needs_self_post: bool,
    pub needs_other_post: bool,
    pub last_self: Option<JournalDate>,
    pub last_other: Option<JournalDate>,
}

/// Owns streak state writes. Every write is a compare-and-swap on the stored
/// version; a lost race reloads and re-applies the activity.
pub struct StreakTracker {
    repo: Arc<dyn StreakRepository>,
    clock: Arc<dyn Clock>,
    max_attempts: usize,
}

impl StreakTracker {
    pub fn new(repo: Arc<dyn StreakRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            clock,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub async fn record_activity(
        &self,
        subject: Subject,
        contributor: UserId,
        journal_date: JournalDate,
    ) -> Result<RecordOutcome, DomainError> {
        for attempt in 1..=self.max_attempts {
            let (current, next) = self.plan(subject, contributor, journal_date).await?;
            let Some(next) = next else {
                return Ok(RecordOutcome {
                    state: current,
                    changed: false,
                });
            };

            if self.repo.compare_and_swap(&next).await? {
                debug!(
                    "{subject}: streak {} -> {} (version {})",
                    current.streak_count(),
                    next.streak_count(),
                    next.version()
                );
                return Ok(RecordOutcome {
                    state: next,
                    changed: true,
                });
            }

            debug!(
                "{subject}: version {} was stale, retrying (attempt {attempt}/{})",
                current.version(),
                self.max_attempts
            );
            tokio::task::yield_now().await;
        }

        warn!(
            "{subject}: gave up recording {journal_date} after {} conflicting writes",
            self.max_attempts
        );
        Err(DomainError::Conflict(format!(
            "{subject} kept changing while recording {journal_date}"
        )))
    }

    /// Current state and, unless `journal_date` is already counted, the state
    /// to compare-and-swap in. Callers that write through another store retry
    /// from here on a stale version.
    pub async fn plan(
        &self,
        subject: Subject,
        contributor: UserId,
        journal_date: JournalDate,
    ) -> Result<(StreakState, Option<StreakState>), DomainError> {
        let current = self.read_state(&subject).await?;
        match current.apply(contributor, journal_date, self.clock.now())? {
            Transition::Unchanged => {
                debug!("{subject}: {journal_date} already counted for user {contributor}");
                Ok((current, None))
            }
            Transition::Advanced(next) => Ok((current, Some(next))),
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Stored state, or the empty state for a subject with no activity yet.
    pub async fn read_state(&self, subject: &Subject) -> Result<StreakState, DomainError> {
        Ok(self
            .repo
            .find(subject)
            .await?
            .unwrap_or_else(|| StreakState::empty(*subject)))
    }

    pub async fn pair_streaks_for(
        &self,
        user: UserId,
        today: JournalDate,
    ) -> Result<Vec<PairStreakView>, DomainError> {
        let states = self.repo.find_pairs_for(user).await?;

        let views = states
            .iter()
            .filter_map(|state| {
                let (pair, progress) = state.as_pair()?;
                let side = pair.side_of(user)?;
                let other = side.opposite();
                Some(PairStreakView {
                    partner: pair.member(other),
                    streak_count: progress.effective_count(today),
                    is_active: progress.is_active(today),
                    needs_self_post: progress.needs_post(side, today),
                    needs_other_post: progress.needs_post(other, today),
                    last_self: progress.last_contribution(side),
                    last_other: progress.last_contribution(other),
                })
            })
            .collect();

        Ok(views)
    }
}
