use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;

use microjournal_domain::relationship::{FollowStatus, RelationshipDirectory};
use microjournal_domain::shared::{DomainError, UserId};

use crate::persistence::{ResultExt, SqliteRepositoryBase};

pub struct SqliteRelationshipDirectory {
    base: SqliteRepositoryBase,
}

impl SqliteRelationshipDirectory {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self {
            base: SqliteRepositoryBase::new(pool),
        }
    }

    /// Insert or overwrite a follow edge. Used for seeding; the follow
    /// workflow itself lives outside the engine.
    pub async fn upsert_follow(
        &self,
        follower: UserId,
        following: UserId,
        status: FollowStatus,
    ) -> Result<(), DomainError> {
        let query = r#"
            INSERT INTO followers (follower_id, following_id, status, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(follower_id, following_id) DO UPDATE SET status = ?3
        "#;

        self.base
            .execute(
                sqlx::query(query)
                    .bind(follower.value())
                    .bind(following.value())
                    .bind(status.as_str())
                    .bind(Utc::now()),
                "Upsert follow",
            )
            .await?;

        Ok(())
    }

    async fn fetch_ids(
        &self,
        query: &str,
        user: UserId,
        context: &str,
    ) -> Result<Vec<UserId>, DomainError> {
        let ids: Vec<i64> = sqlx::query_scalar(query)
            .bind(user.value())
            .bind(FollowStatus::Accepted.as_str())
            .fetch_all(self.base.pool())
            .await
            .map_repo_error(context)?;

        Ok(ids.into_iter().map(UserId::new).collect())
    }
}

#[async_trait]
impl RelationshipDirectory for SqliteRelationshipDirectory {
    async fn mutual_partners(&self, user: UserId) -> Result<Vec<UserId>, DomainError> {
        let query = r#"
            SELECT outgoing.following_id
            FROM followers outgoing
            JOIN followers incoming
              ON incoming.follower_id = outgoing.following_id
             AND incoming.following_id = outgoing.follower_id
            WHERE outgoing.follower_id = ?1
              AND outgoing.status = ?2
              AND incoming.status = ?2
            ORDER BY outgoing.following_id
        "#;

        self.fetch_ids(query, user, "Find mutual partners").await
    }

    async fn accepted_followers(&self, user: UserId) -> Result<Vec<UserId>, DomainError> {
        let query = r#"
            SELECT follower_id
            FROM followers
            WHERE following_id = ?1 AND status = ?2
            ORDER BY follower_id
        "#;

        self.fetch_ids(query, user, "Find accepted followers").await
    }
}
