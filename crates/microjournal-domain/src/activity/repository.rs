use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::aggregate::{ActivityRecord, NewActivity};
use crate::clock::JournalDate;
use crate::shared::{DomainError, UserId};
use crate::streak::StreakState;

#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Insert a post and compare-and-swap the author's solo streak in one
    /// transaction. Either both are stored or neither is.
    ///
    /// A second post for the same `(user, journal_date)` fails with
    /// `DomainError::DuplicateActivity`. Returns `Ok(None)` when `streak` was
    /// stale; nothing is stored then and the caller re-reads and retries.
    async fn insert_with_streak(
        &self,
        user_id: UserId,
        journal_date: JournalDate,
        created_at: DateTime<Utc>,
        payload: &NewActivity,
        streak: Option<&StreakState>,
    ) -> Result<Option<ActivityRecord>, DomainError>;

    async fn exists_for(&self, user_id: UserId, journal_date: JournalDate)
        -> Result<bool, DomainError>;

    async fn find_for(
        &self,
        user_id: UserId,
        journal_date: JournalDate,
    ) -> Result<Option<ActivityRecord>, DomainError>;
}
