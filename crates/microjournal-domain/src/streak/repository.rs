use async_trait::async_trait;

use super::aggregate::StreakState;
use crate::clock::JournalDate;
use crate::shared::{DomainError, UserId};
use crate::subject::Subject;

/// Solo streak that may need an expiry reminder, joined with the owner's timezone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryCandidate {
    pub user_id: UserId,
    pub timezone: String,
    pub streak_count: u32,
    pub last_activity_date: JournalDate,
}

/// Streak state repository trait
#[async_trait]
pub trait StreakRepository: Send + Sync {
    async fn find(&self, subject: &Subject) -> Result<Option<StreakState>, DomainError>;

    /// Store `state` if the persisted version is still `state.version() - 1`.
    ///
    /// Returns `false` when another writer got there first; nothing is written then.
    async fn compare_and_swap(&self, state: &StreakState) -> Result<bool, DomainError>;

    /// All pair streaks `user` belongs to.
    async fn find_pairs_for(&self, user: UserId) -> Result<Vec<StreakState>, DomainError>;

    /// Solo streaks with a positive count whose owner has a timezone.
    async fn find_expiry_candidates(&self) -> Result<Vec<ExpiryCandidate>, DomainError>;
}
