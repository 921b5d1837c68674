use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

use microjournal_domain::clock::JournalDate;
use microjournal_domain::reminder::{ReminderKind, ReminderLedger};
use microjournal_domain::shared::{DomainError, UserId};

use crate::persistence::SqliteRepositoryBase;

/// `reminder_deliveries` rows act as claims: the primary key makes the first
/// insert win and every later attempt a no-op.
pub struct SqliteReminderLedger {
    base: SqliteRepositoryBase,
}

impl SqliteReminderLedger {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self {
            base: SqliteRepositoryBase::new(pool),
        }
    }
}

#[async_trait]
impl ReminderLedger for SqliteReminderLedger {
    async fn try_claim(
        &self,
        user: UserId,
        kind: ReminderKind,
        journal_date: JournalDate,
        claimed_at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let query = r#"
            INSERT INTO reminder_deliveries (user_id, kind, journal_date, sent_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id, kind, journal_date) DO NOTHING
        "#;

        let result = self
            .base
            .execute(
                sqlx::query(query)
                    .bind(user.value())
                    .bind(kind.as_str())
                    .bind(journal_date.to_string())
                    .bind(claimed_at),
                "Claim reminder",
            )
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn release(
        &self,
        user: UserId,
        kind: ReminderKind,
        journal_date: JournalDate,
    ) -> Result<(), DomainError> {
        self.base
            .execute(
                sqlx::query(
                    "DELETE FROM reminder_deliveries WHERE user_id = ?1 AND kind = ?2 AND journal_date = ?3",
                )
                .bind(user.value())
                .bind(kind.as_str())
                .bind(journal_date.to_string()),
                "Release reminder claim",
            )
            .await?;

        Ok(())
    }
}
