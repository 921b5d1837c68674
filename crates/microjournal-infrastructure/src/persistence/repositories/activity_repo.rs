use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use std::sync::Arc;

use microjournal_domain::activity::{ActivityRecord, ActivityRepository, NewActivity};
use microjournal_domain::clock::JournalDate;
use microjournal_domain::shared::{ActivityId, DomainError, UserId};
use microjournal_domain::streak::StreakState;

use super::streak_repo::write_state;
use crate::persistence::{RepositoryErrorMapper, ResultExt, SqliteRepositoryBase};

#[derive(FromRow)]
struct PostRow {
    id: i64,
    user_id: i64,
    journal_date: String,
    template_id: Option<i64>,
    text: String,
    photo_path: Option<String>,
    created_at: DateTime<Utc>,
}

impl PostRow {
    #[allow(clippy::wrong_self_convention)]
    fn to_domain(self) -> Result<ActivityRecord, DomainError> {
        let journal_date = self.journal_date.parse::<JournalDate>().map_err(|e| {
            DomainError::DataIntegrity(format!("Post {} has a bad journal date: {e}", self.id))
        })?;

        Ok(ActivityRecord::from_persistence(
            ActivityId::new(self.id),
            UserId::new(self.user_id),
            journal_date,
            self.created_at,
            NewActivity {
                text: self.text,
                template_id: self.template_id,
                photo_path: self.photo_path,
            },
        ))
    }
}

pub struct SqliteActivityRepository {
    base: SqliteRepositoryBase,
}

impl SqliteActivityRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self {
            base: SqliteRepositoryBase::new(pool),
        }
    }
}

#[async_trait]
impl ActivityRepository for SqliteActivityRepository {
    async fn insert_with_streak(
        &self,
        user_id: UserId,
        journal_date: JournalDate,
        created_at: DateTime<Utc>,
        payload: &NewActivity,
        streak: Option<&StreakState>,
    ) -> Result<Option<ActivityRecord>, DomainError> {
        let query = r#"
            INSERT INTO posts (user_id, journal_date, template_id, text, photo_path, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#;

        let mut tx = self.base.pool().begin().await.map_repo_error("Begin post")?;

        let result = sqlx::query(query)
            .bind(user_id.value())
            .bind(journal_date.to_string())
            .bind(payload.template_id)
            .bind(&payload.text)
            .bind(payload.photo_path.as_deref())
            .bind(created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if RepositoryErrorMapper::is_unique_violation(&e) {
                    DomainError::DuplicateActivity(format!("user {user_id} on {journal_date}"))
                } else {
                    RepositoryErrorMapper::map_sqlx_error(e, "Insert post")
                }
            })?;

        if let Some(state) = streak {
            if !write_state(&mut *tx, state).await? {
                tx.rollback().await.map_repo_error("Roll back post")?;
                return Ok(None);
            }
        }

        tx.commit().await.map_repo_error("Commit post")?;

        Ok(Some(ActivityRecord::from_persistence(
            ActivityId::new(result.last_insert_rowid()),
            user_id,
            journal_date,
            created_at,
            payload.clone(),
        )))
    }

    async fn exists_for(
        &self,
        user_id: UserId,
        journal_date: JournalDate,
    ) -> Result<bool, DomainError> {
        let found: Option<i64> = self
            .base
            .fetch_scalar(
                sqlx::query_scalar("SELECT 1 FROM posts WHERE user_id = ?1 AND journal_date = ?2")
                    .bind(user_id.value())
                    .bind(journal_date.to_string()),
                "Check post exists",
            )
            .await?;

        Ok(found.is_some())
    }

    async fn find_for(
        &self,
        user_id: UserId,
        journal_date: JournalDate,
    ) -> Result<Option<ActivityRecord>, DomainError> {
        let query = r#"
            SELECT id, user_id, journal_date, template_id, text, photo_path, created_at
            FROM posts
            WHERE user_id = ?1 AND journal_date = ?2
        "#;

        let row: Option<PostRow> = self
            .base
            .fetch_optional(
                sqlx::query_as(query)
                    .bind(user_id.value())
                    .bind(journal_date.to_string()),
                "Find post by journal date",
            )
            .await?;

        row.map(PostRow::to_domain).transpose()
    }
}
