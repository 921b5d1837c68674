mod test_helpers;

use microjournal_domain::shared::DomainError;
use microjournal_lib::application::config::ScheduleConfig;
use microjournal_lib::application::services::ReminderScheduler;
use test_helpers::{utc, Harness};

#[tokio::test]
async fn test_start_is_idempotent_and_shutdown_stops() {
    let h = Harness::start(utc(2024, 1, 15, 12, 0)).await;
    let scheduler = &h.state.services.scheduler;

    assert!(!scheduler.is_running().await);
    scheduler.start().await.unwrap();
    scheduler.start().await.unwrap();
    assert!(scheduler.is_running().await);

    scheduler.shutdown().await.unwrap();
    assert!(!scheduler.is_running().await);
    // Nothing left to stop.
    scheduler.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_invalid_cron_fails_to_start() {
    let h = Harness::start(utc(2024, 1, 15, 12, 0)).await;
    let scheduler = ReminderScheduler::new(
        h.state.services.scanner.clone(),
        ScheduleConfig {
            daily_reminder_cron: "every evening".to_string(),
            ..ScheduleConfig::default()
        },
    );

    let err = scheduler.start().await.unwrap_err();
    assert!(matches!(err, DomainError::Infrastructure(_)));
    assert!(!scheduler.is_running().await);
}
