use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use std::sync::Arc;

use microjournal_domain::shared::{DomainError, UserId};
use microjournal_domain::user::{UserDirectory, UserProfile, UserTimezone};

use crate::persistence::SqliteRepositoryBase;

#[derive(FromRow)]
struct UserRow {
    id: i64,
    display_name: String,
    timezone: Option<String>,
}

impl UserRow {
    fn into_profile(self) -> UserProfile {
        UserProfile {
            id: UserId::new(self.id),
            display_name: self.display_name,
            timezone: self.timezone,
        }
    }
}

#[derive(FromRow)]
struct UserTimezoneRow {
    id: i64,
    timezone: String,
}

pub struct SqliteUserDirectory {
    base: SqliteRepositoryBase,
}

impl SqliteUserDirectory {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self {
            base: SqliteRepositoryBase::new(pool),
        }
    }

    /// Create a user row. Accounts are owned by the surrounding service; this
    /// exists for seeding and tooling.
    pub async fn create(
        &self,
        username: &str,
        display_name: &str,
        timezone: Option<&str>,
    ) -> Result<UserId, DomainError> {
        let result = self
            .base
            .execute(
                sqlx::query(
                    "INSERT INTO users (username, display_name, timezone, created_at) VALUES (?1, ?2, ?3, ?4)",
                )
                .bind(username)
                .bind(display_name)
                .bind(timezone)
                .bind(Utc::now()),
                "Create user",
            )
            .await?;

        Ok(UserId::new(result.last_insert_rowid()))
    }

    pub async fn set_timezone(&self, user: UserId, timezone: Option<&str>) -> Result<(), DomainError> {
        let result = self
            .base
            .execute(
                sqlx::query("UPDATE users SET timezone = ?1 WHERE id = ?2")
                    .bind(timezone)
                    .bind(user.value()),
                "Update user timezone",
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("User {user}")));
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for SqliteUserDirectory {
    async fn find_profile(&self, user: UserId) -> Result<Option<UserProfile>, DomainError> {
        let row: Option<UserRow> = self
            .base
            .fetch_optional(
                sqlx::query_as("SELECT id, display_name, timezone FROM users WHERE id = ?1")
                    .bind(user.value()),
                "Find user profile",
            )
            .await?;

        Ok(row.map(UserRow::into_profile))
    }

    async fn list_with_timezone(&self) -> Result<Vec<UserTimezone>, DomainError> {
        let rows: Vec<UserTimezoneRow> = self
            .base
            .fetch_all(
                sqlx::query_as(
                    "SELECT id, timezone FROM users WHERE timezone IS NOT NULL AND TRIM(timezone) <> '' ORDER BY id",
                ),
                "List users with timezone",
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| UserTimezone {
                user_id: UserId::new(r.id),
                timezone: r.timezone,
            })
            .collect())
    }
}
