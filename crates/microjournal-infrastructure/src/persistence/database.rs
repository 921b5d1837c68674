use microjournal_domain::clock::CutoffHour;
use microjournal_domain::shared::DomainError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::fs::OpenOptions;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use super::RepositoryErrorMapper;

const CUTOFF_HOUR_KEY: &str = "cutoff_hour";

pub struct Database {
    pool: Arc<SqlitePool>,
}

impl Database {
    pub async fn new(db_path: &str) -> Result<Self, DomainError> {
        let path = Path::new(db_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DomainError::Infrastructure(format!("Failed to create DB directory: {}", e))
            })?;
        }

        if !path.exists() {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(false)
                .open(path)
                .map_err(|e| {
                    DomainError::Infrastructure(format!("Failed to create DB file: {}", e))
                })?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path))
            .map_err(|e| DomainError::Infrastructure(e.to_string()))?
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| DomainError::Infrastructure(e.to_string()))?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Single-connection in-memory database; the connection is never recycled
    /// so the schema lives as long as the pool.
    pub async fn in_memory() -> Result<Self, DomainError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| DomainError::Infrastructure(e.to_string()))?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub async fn run_migrations(&self) -> Result<(), DomainError> {
        sqlx::migrate!("./migrations")
            .run(&*self.pool)
            .await
            .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
        Ok(())
    }

    /// Record the deployment cutoff on first use and refuse a different one later.
    ///
    /// Stored journal dates were computed with the recorded cutoff and are never
    /// rewritten, so changing it would silently split or merge journal days.
    pub async fn ensure_cutoff_hour(&self, cutoff: CutoffHour) -> Result<(), DomainError> {
        let stored: Option<String> =
            sqlx::query_scalar("SELECT value FROM deployment_settings WHERE key = ?1")
                .bind(CUTOFF_HOUR_KEY)
                .fetch_optional(&*self.pool)
                .await
                .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Read cutoff hour"))?;

        match stored {
            None => {
                sqlx::query(
                    "INSERT INTO deployment_settings (key, value, updated_at) VALUES (?1, ?2, ?3)",
                )
                .bind(CUTOFF_HOUR_KEY)
                .bind(cutoff.hour().to_string())
                .bind(chrono::Utc::now())
                .execute(&*self.pool)
                .await
                .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Record cutoff hour"))?;

                log::info!("Recorded journal cutoff hour {}", cutoff.hour());
                Ok(())
            }
            Some(value) if value == cutoff.hour().to_string() => Ok(()),
            Some(value) => Err(DomainError::Validation(format!(
                "Database was initialised with cutoff hour {value}, refusing to start with {}",
                cutoff.hour()
            ))),
        }
    }

    pub fn pool(&self) -> Arc<SqlitePool> {
        self.pool.clone()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
