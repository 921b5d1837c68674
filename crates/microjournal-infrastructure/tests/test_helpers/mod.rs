#![allow(dead_code)]

use microjournal_domain::shared::UserId;
use microjournal_infrastructure::persistence::repositories::SqliteUserDirectory;
use microjournal_infrastructure::persistence::Database;

pub async fn setup_in_memory_db() -> Database {
    let db = Database::in_memory().await.expect("open in-memory db");
    db.run_migrations().await.expect("run migrations");
    db
}

pub async fn create_user(db: &Database, username: &str, timezone: Option<&str>) -> UserId {
    SqliteUserDirectory::new(db.pool())
        .create(username, &format!("{username} display"), timezone)
        .await
        .expect("create user")
}
