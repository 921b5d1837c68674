use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use microjournal_domain::activity::ActivityRepository;
use microjournal_domain::clock::{journal_date_for_local, local_time, Clock, CutoffHour, JournalDate};
use microjournal_domain::push::{self, PushEndpointRepository, PushMessage};
use microjournal_domain::reminder::{ReminderKind, ReminderLedger, ReminderWindow};
use microjournal_domain::shared::{DomainError, UserId};
use microjournal_domain::streak::{ExpiryCandidate, StreakRepository};
use microjournal_domain::user::{UserDirectory, UserTimezone};

use super::NotificationDispatcher;

/// Per-run counters. Every scanned subject lands in exactly one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub scanned: usize,
    pub outside_window: usize,
    pub invalid_timezone: usize,
    pub already_posted: usize,
    pub not_at_risk: usize,
    pub no_endpoints: usize,
    pub already_notified: usize,
    pub notified: usize,
    pub failed: usize,
}

impl ScanReport {
    fn record(&mut self, outcome: SubjectOutcome) {
        self.scanned += 1;
        match outcome {
            SubjectOutcome::OutsideWindow => self.outside_window += 1,
            SubjectOutcome::InvalidTimezone => self.invalid_timezone += 1,
            SubjectOutcome::AlreadyPosted => self.already_posted += 1,
            SubjectOutcome::NotAtRisk => self.not_at_risk += 1,
            SubjectOutcome::NoEndpoints => self.no_endpoints += 1,
            SubjectOutcome::AlreadyNotified => self.already_notified += 1,
            SubjectOutcome::Notified => self.notified += 1,
            SubjectOutcome::Failed => self.failed += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubjectOutcome {
    OutsideWindow,
    InvalidTimezone,
    AlreadyPosted,
    NotAtRisk,
    NoEndpoints,
    AlreadyNotified,
    Notified,
    Failed,
}

#[derive(Debug, Clone, Copy)]
pub struct ReminderSettings {
    pub cutoff: CutoffHour,
    pub daily_window: ReminderWindow,
    pub expiry_window: ReminderWindow,
    pub concurrency: usize,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            cutoff: CutoffHour::default(),
            daily_window: ReminderWindow::daily_default(),
            expiry_window: ReminderWindow::expiry_default(),
            concurrency: 8,
        }
    }
}

#[derive(Clone)]
pub struct ScannerPorts {
    pub users: Arc<dyn UserDirectory>,
    pub streaks: Arc<dyn StreakRepository>,
    pub activities: Arc<dyn ActivityRepository>,
    pub endpoints: Arc<dyn PushEndpointRepository>,
    pub ledger: Arc<dyn ReminderLedger>,
}

/// Where a subject stands in its own timezone at scan time.
struct LocalPosition {
    today: JournalDate,
}

pub struct ReminderScanner {
    ports: ScannerPorts,
    dispatcher: Arc<NotificationDispatcher>,
    clock: Arc<dyn Clock>,
    settings: ReminderSettings,
}

impl ReminderScanner {
    pub fn new(
        ports: ScannerPorts,
        dispatcher: Arc<NotificationDispatcher>,
        clock: Arc<dyn Clock>,
        settings: ReminderSettings,
    ) -> Self {
        Self {
            ports,
            dispatcher,
            clock,
            settings,
        }
    }

    /// Evening nudge for users who have not posted for today's journal date.
    pub async fn run_daily_reminder_scan(&self) -> Result<ScanReport, DomainError> {
        let now = self.clock.now();
        let users = self.ports.users.list_with_timezone().await?;

        let report = self
            .scan(users, |user| self.evaluate_daily(user, now))
            .await;

        info!(
            scan = "daily_reminder",
            scanned = report.scanned,
            notified = report.notified,
            already_notified = report.already_notified,
            failed = report.failed,
            "📬 Daily reminder scan finished"
        );
        Ok(report)
    }

    /// Midday warning for solo streaks that end if the user skips today.
    pub async fn run_streak_expiry_scan(&self) -> Result<ScanReport, DomainError> {
        let now = self.clock.now();
        let candidates = self.ports.streaks.find_expiry_candidates().await?;

        let report = self
            .scan(candidates, |candidate| self.evaluate_expiry(candidate, now))
            .await;

        info!(
            scan = "streak_expiry",
            scanned = report.scanned,
            notified = report.notified,
            already_notified = report.already_notified,
            failed = report.failed,
            "🔥 Streak expiry scan finished"
        );
        Ok(report)
    }

    async fn scan<T, F, Fut>(&self, subjects: Vec<T>, evaluate: F) -> ScanReport
    where
        F: Fn(T) -> Fut,
        Fut: std::future::Future<Output = SubjectOutcome>,
    {
        let outcomes: Vec<SubjectOutcome> = stream::iter(subjects)
            .map(evaluate)
            .buffer_unordered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let mut report = ScanReport::default();
        for outcome in outcomes {
            report.record(outcome);
        }
        report
    }

    fn locate(
        &self,
        user: UserId,
        timezone: &str,
        window: &ReminderWindow,
        now: DateTime<Utc>,
    ) -> Result<LocalPosition, SubjectOutcome> {
        let local = local_time(now, timezone).map_err(|_| {
            warn!("Skipping user {user}: invalid timezone '{timezone}'");
            SubjectOutcome::InvalidTimezone
        })?;

        if !window.contains(local.time()) {
            return Err(SubjectOutcome::OutsideWindow);
        }

        Ok(LocalPosition {
            today: journal_date_for_local(local, self.settings.cutoff),
        })
    }

    async fn evaluate_daily(&self, user: UserTimezone, now: DateTime<Utc>) -> SubjectOutcome {
        let position =
            match self.locate(user.user_id, &user.timezone, &self.settings.daily_window, now) {
                Ok(position) => position,
                Err(outcome) => return outcome,
            };

        self.remind(
            user.user_id,
            ReminderKind::DailyReminder,
            position.today,
            push::daily_reminder(),
            now,
        )
        .await
        .unwrap_or_else(|e| {
            warn!("Daily reminder for user {} failed: {}", user.user_id, e);
            SubjectOutcome::Failed
        })
    }

    async fn evaluate_expiry(&self, candidate: ExpiryCandidate, now: DateTime<Utc>) -> SubjectOutcome {
        let user = candidate.user_id;
        let position =
            match self.locate(user, &candidate.timezone, &self.settings.expiry_window, now) {
                Ok(position) => position,
                Err(outcome) => return outcome,
            };

        if candidate.last_activity_date == position.today {
            return SubjectOutcome::AlreadyPosted;
        }
        if candidate.last_activity_date != position.today.previous() {
            return SubjectOutcome::NotAtRisk;
        }

        self.remind(
            user,
            ReminderKind::StreakExpiry,
            position.today,
            push::streak_expiry(),
            now,
        )
        .await
        .unwrap_or_else(|e| {
            warn!("Streak expiry reminder for user {} failed: {}", user, e);
            SubjectOutcome::Failed
        })
    }

    /// Shared tail of both scans: posted check, endpoints, claim, send.
    async fn remind(
        &self,
        user: UserId,
        kind: ReminderKind,
        today: JournalDate,
        message: PushMessage,
        now: DateTime<Utc>,
    ) -> Result<SubjectOutcome, DomainError> {
        if self.ports.activities.exists_for(user, today).await? {
            return Ok(SubjectOutcome::AlreadyPosted);
        }

        let endpoints = self.ports.endpoints.find_by_owner(user).await?;
        if endpoints.is_empty() {
            return Ok(SubjectOutcome::NoEndpoints);
        }

        if !self.ports.ledger.try_claim(user, kind, today, now).await? {
            return Ok(SubjectOutcome::AlreadyNotified);
        }

        match self.dispatcher.send_bulk(&endpoints, &message).await {
            Ok(outcome) if outcome.success_count > 0 => Ok(SubjectOutcome::Notified),
            Ok(_) => {
                self.release(user, kind, today).await;
                warn!("{kind} for user {user}: no endpoint accepted the message");
                Ok(SubjectOutcome::Failed)
            }
            Err(e) => {
                self.release(user, kind, today).await;
                Err(e)
            }
        }
    }

    async fn release(&self, user: UserId, kind: ReminderKind, today: JournalDate) {
        if let Err(e) = self.ports.ledger.release(user, kind, today).await {
            warn!("Could not release {kind} claim for user {user} on {today}: {e}");
        }
    }
}
