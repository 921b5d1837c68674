use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use microjournal_domain::shared::DomainError;

use super::ReminderScanner;
use crate::application::config::ScheduleConfig;
use crate::application::ResultExt;

/// Runs both reminder scans on their cron schedules.
pub struct ReminderScheduler {
    scanner: Arc<ReminderScanner>,
    config: ScheduleConfig,
    scheduler: Mutex<Option<JobScheduler>>,
}

impl ReminderScheduler {
    pub fn new(scanner: Arc<ReminderScanner>, config: ScheduleConfig) -> Self {
        Self {
            scanner,
            config,
            scheduler: Mutex::new(None),
        }
    }

    pub async fn start(&self) -> Result<(), DomainError> {
        let mut slot = self.scheduler.lock().await;
        if slot.is_some() {
            return Ok(());
        }

        let scheduler = JobScheduler::new().await.to_infra_err()?;

        let scanner = Arc::clone(&self.scanner);
        let daily = Job::new_async(self.config.daily_reminder_cron.as_str(), move |_id, _lock| {
            let scanner = Arc::clone(&scanner);
            Box::pin(async move {
                if let Err(e) = scanner.run_daily_reminder_scan().await {
                    error!("❌ Daily reminder scan aborted: {}", e);
                }
            })
        })
        .to_infra_err()?;

        let scanner = Arc::clone(&self.scanner);
        let expiry = Job::new_async(self.config.streak_reminder_cron.as_str(), move |_id, _lock| {
            let scanner = Arc::clone(&scanner);
            Box::pin(async move {
                if let Err(e) = scanner.run_streak_expiry_scan().await {
                    error!("❌ Streak expiry scan aborted: {}", e);
                }
            })
        })
        .to_infra_err()?;

        scheduler.add(daily).await.to_infra_err()?;
        scheduler.add(expiry).await.to_infra_err()?;
        scheduler.start().await.to_infra_err()?;

        info!(
            "✅ Reminder scheduler started (daily: '{}', streak: '{}')",
            self.config.daily_reminder_cron, self.config.streak_reminder_cron
        );

        *slot = Some(scheduler);
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.scheduler.lock().await.is_some()
    }

    pub async fn shutdown(&self) -> Result<(), DomainError> {
        let Some(mut scheduler) = self.scheduler.lock().await.take() else {
            return Ok(());
        };
        scheduler.shutdown().await.to_infra_err()?;
        info!("🛑 Reminder scheduler stopped");
        Ok(())
    }
}
