use anyhow::Context;
use std::sync::Arc;
use tracing::info;

use crate::application::config::EngineConfig;
use crate::application::services::{
    ActivityPorts, ActivityService, DispatchQueue, NotificationDispatcher, ReminderScanner,
    ReminderScheduler, ReminderSettings, ScannerPorts, StreakTracker,
};
use crate::presentation::state::{AppState, Repositories, Runtime, Services};
use microjournal_domain::clock::Clock;
use microjournal_domain::push::PushTransport;
use microjournal_infrastructure::notification::{FcmConfig, FcmTransport};
use microjournal_infrastructure::persistence::repositories::{
    SqliteActivityRepository, SqlitePushEndpointRepository, SqliteRelationshipDirectory,
    SqliteReminderLedger, SqliteStreakRepository, SqliteUserDirectory,
};
use microjournal_infrastructure::persistence::Database;

/// Open the configured database, apply migrations and check the cutoff guard.
pub async fn open_database(config: &EngineConfig) -> anyhow::Result<Database> {
    let path = config.database_path.to_string_lossy();
    let db = Database::new(&path)
        .await
        .with_context(|| format!("Failed to open database at {path}"))?;
    db.run_migrations().await.context("Failed to run migrations")?;
    db.ensure_cutoff_hour(config.cutoff_hour)
        .await
        .context("Cutoff hour check failed")?;
    info!("Database ready at {}", path);
    Ok(db)
}

/// FCM transport from config; the access token comes from the environment.
pub fn build_fcm_transport(config: &EngineConfig) -> anyhow::Result<Arc<dyn PushTransport>> {
    let settings = &config.fcm;
    let token = std::env::var(&settings.access_token_env).with_context(|| {
        format!(
            "FCM access token variable {} is not set",
            settings.access_token_env
        )
    })?;

    let fcm = FcmConfig::new(settings.project_id.clone(), token)
        .with_base_url(settings.base_url.clone())
        .with_request_timeout(settings.request_timeout());
    Ok(Arc::new(FcmTransport::new(fcm)?))
}

/// Wire repositories and services around an open database.
///
/// Spawns the dispatch workers, so it must run inside a tokio runtime.
pub fn build_app_state(
    config: EngineConfig,
    db: Database,
    transport: Arc<dyn PushTransport>,
    clock: Arc<dyn Clock>,
) -> AppState {
    let pool = db.pool();
    let db = Arc::new(db);

    let repositories = Repositories {
        users: Arc::new(SqliteUserDirectory::new(pool.clone())),
        activities: Arc::new(SqliteActivityRepository::new(pool.clone())),
        streaks: Arc::new(SqliteStreakRepository::new(pool.clone())),
        endpoints: Arc::new(SqlitePushEndpointRepository::new(pool.clone())),
        relationships: Arc::new(SqliteRelationshipDirectory::new(pool.clone())),
        ledger: Arc::new(SqliteReminderLedger::new(pool.clone())),
    };

    let tracker = Arc::new(StreakTracker::new(
        repositories.streaks.clone(),
        clock.clone(),
    ));
    let dispatcher = Arc::new(NotificationDispatcher::new(
        transport,
        repositories.endpoints.clone(),
    ));
    let queue = Arc::new(DispatchQueue::start(dispatcher.clone(), &config.dispatch));

    let activity = Arc::new(ActivityService::new(
        ActivityPorts {
            users: repositories.users.clone(),
            activities: repositories.activities.clone(),
            relationships: repositories.relationships.clone(),
            endpoints: repositories.endpoints.clone(),
        },
        tracker.clone(),
        queue.clone(),
        clock.clone(),
        config.cutoff_hour,
    ));

    let scanner = Arc::new(ReminderScanner::new(
        ScannerPorts {
            users: repositories.users.clone(),
            streaks: repositories.streaks.clone(),
            activities: repositories.activities.clone(),
            endpoints: repositories.endpoints.clone(),
            ledger: repositories.ledger.clone(),
        },
        dispatcher.clone(),
        clock.clone(),
        ReminderSettings {
            cutoff: config.cutoff_hour,
            daily_window: config.daily_window,
            expiry_window: config.expiry_window,
            concurrency: config.scan_concurrency,
        },
    ));
    let scheduler = Arc::new(ReminderScheduler::new(
        scanner.clone(),
        config.schedule.clone(),
    ));

    AppState {
        config,
        runtime: Runtime { pool, db, clock },
        repositories,
        services: Services {
            tracker,
            dispatcher,
            queue,
            activity,
            scanner,
            scheduler,
        },
    }
}
