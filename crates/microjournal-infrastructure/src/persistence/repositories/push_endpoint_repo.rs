use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use std::sync::Arc;

use microjournal_domain::push::{token_prefix, PushEndpoint, PushEndpointRepository};
use microjournal_domain::shared::{DomainError, UserId};

use crate::persistence::{ResultExt, SqliteRepositoryBase};

#[derive(FromRow)]
struct EndpointRow {
    user_id: i64,
    token: String,
    registered_at: DateTime<Utc>,
}

impl EndpointRow {
    fn into_endpoint(self) -> PushEndpoint {
        PushEndpoint::new(UserId::new(self.user_id), self.token, self.registered_at)
    }
}

pub struct SqlitePushEndpointRepository {
    base: SqliteRepositoryBase,
}

impl SqlitePushEndpointRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self {
            base: SqliteRepositoryBase::new(pool),
        }
    }
}

#[async_trait]
impl PushEndpointRepository for SqlitePushEndpointRepository {
    async fn register(
        &self,
        owner: UserId,
        token: &str,
        registered_at: DateTime<Utc>,
    ) -> Result<PushEndpoint, DomainError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(DomainError::Validation("Push token cannot be empty".to_string()));
        }

        let query = r#"
            INSERT INTO push_endpoints (user_id, token, registered_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id, token) DO UPDATE SET registered_at = ?3
        "#;

        self.base
            .execute(
                sqlx::query(query)
                    .bind(owner.value())
                    .bind(token)
                    .bind(registered_at),
                "Register push endpoint",
            )
            .await?;

        log::debug!(
            "Registered push token {}... for user {}",
            token_prefix(token),
            owner
        );

        Ok(PushEndpoint::new(owner, token, registered_at))
    }

    async fn find_by_owner(&self, owner: UserId) -> Result<Vec<PushEndpoint>, DomainError> {
        let rows: Vec<EndpointRow> = self
            .base
            .fetch_all(
                sqlx::query_as(
                    "SELECT user_id, token, registered_at FROM push_endpoints WHERE user_id = ?1 ORDER BY id",
                )
                .bind(owner.value()),
                "Find push endpoints by owner",
            )
            .await?;

        Ok(rows.into_iter().map(EndpointRow::into_endpoint).collect())
    }

    async fn find_by_owners(&self, owners: &[UserId]) -> Result<Vec<PushEndpoint>, DomainError> {
        if owners.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT user_id, token, registered_at FROM push_endpoints WHERE user_id IN (",
        );
        let mut separated = builder.separated(", ");
        for owner in owners {
            separated.push_bind(owner.value());
        }
        separated.push_unseparated(") ORDER BY user_id, id");

        let rows: Vec<EndpointRow> = builder
            .build_query_as()
            .fetch_all(self.base.pool())
            .await
            .map_repo_error("Find push endpoints by owners")?;

        Ok(rows.into_iter().map(EndpointRow::into_endpoint).collect())
    }

    async fn delete_token(&self, token: &str) -> Result<u64, DomainError> {
        let result = self
            .base
            .execute(
                sqlx::query("DELETE FROM push_endpoints WHERE token = ?1").bind(token),
                "Delete push token",
            )
            .await?;

        Ok(result.rows_affected())
    }
}
