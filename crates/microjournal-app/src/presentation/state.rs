use sqlx::SqlitePool;
use std::sync::Arc;

use crate::application::config::EngineConfig;
use crate::application::services::{
    ActivityService, DispatchQueue, NotificationDispatcher, ReminderScanner, ReminderScheduler,
    StreakTracker,
};
use microjournal_domain::activity::ActivityRepository;
use microjournal_domain::clock::Clock;
use microjournal_domain::push::PushEndpointRepository;
use microjournal_domain::relationship::RelationshipDirectory;
use microjournal_domain::reminder::ReminderLedger;
use microjournal_domain::streak::StreakRepository;
use microjournal_domain::user::UserDirectory;
use microjournal_infrastructure::persistence::Database;

pub struct Runtime {
    pub pool: Arc<SqlitePool>,
    pub db: Arc<Database>,
    pub clock: Arc<dyn Clock>,
}

pub struct Repositories {
    pub users: Arc<dyn UserDirectory>,
    pub activities: Arc<dyn ActivityRepository>,
    pub streaks: Arc<dyn StreakRepository>,
    pub endpoints: Arc<dyn PushEndpointRepository>,
    pub relationships: Arc<dyn RelationshipDirectory>,
    pub ledger: Arc<dyn ReminderLedger>,
}

pub struct Services {
    pub tracker: Arc<StreakTracker>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub queue: Arc<DispatchQueue>,
    pub activity: Arc<ActivityService>,
    pub scanner: Arc<ReminderScanner>,
    pub scheduler: Arc<ReminderScheduler>,
}

pub struct AppState {
    pub config: EngineConfig,
    pub runtime: Runtime,
    pub repositories: Repositories,
    pub services: Services,
}

impl AppState {
    /// Stop the scheduler, drain queued notifications and close the pool.
    pub async fn shutdown(&self) {
        if let Err(e) = self.services.scheduler.shutdown().await {
            tracing::warn!("Scheduler shutdown failed: {}", e);
        }
        self.services.queue.shutdown().await;
        self.runtime.db.close().await;
    }
}
