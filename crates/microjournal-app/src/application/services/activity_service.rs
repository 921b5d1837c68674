use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::Arc;

use microjournal_domain::activity::{ActivityRecord, ActivityRepository, NewActivity};
use microjournal_domain::clock::{compute_journal_date, Clock, CutoffHour, JournalDate};
use microjournal_domain::push::{self, PushEndpoint, PushEndpointRepository};
use microjournal_domain::relationship::RelationshipDirectory;
use microjournal_domain::shared::{DomainError, UserId};
use microjournal_domain::streak::StreakState;
use microjournal_domain::subject::Subject;
use microjournal_domain::user::{UserDirectory, UserProfile};

use super::{DispatchJob, DispatchQueue, DispatchTicket, PairStreakView, StreakTracker};

/// Storage ports the activity flow reads and writes.
#[derive(Clone)]
pub struct ActivityPorts {
    pub users: Arc<dyn UserDirectory>,
    pub activities: Arc<dyn ActivityRepository>,
    pub relationships: Arc<dyn RelationshipDirectory>,
    pub endpoints: Arc<dyn PushEndpointRepository>,
}

#[derive(Debug)]
pub struct CreatedActivity {
    pub activity: ActivityRecord,
    /// Solo streak after this post; `None` if the date was rejected as out of order.
    pub streak: Option<StreakState>,
    /// Follower notification, if one was queued.
    pub notification: Option<DispatchTicket>,
}

/// Entry point for posting: journal-day resolution, the one-post-per-day
/// rule, streak bookkeeping and the follower notification.
pub struct ActivityService {
    ports: ActivityPorts,
    tracker: Arc<StreakTracker>,
    queue: Arc<DispatchQueue>,
    clock: Arc<dyn Clock>,
    cutoff: CutoffHour,
}

impl ActivityService {
    pub fn new(
        ports: ActivityPorts,
        tracker: Arc<StreakTracker>,
        queue: Arc<DispatchQueue>,
        clock: Arc<dyn Clock>,
        cutoff: CutoffHour,
    ) -> Self {
        Self {
            ports,
            tracker,
            queue,
            clock,
            cutoff,
        }
    }

    pub async fn create_activity(
        &self,
        user_id: UserId,
        payload: NewActivity,
    ) -> Result<CreatedActivity, DomainError> {
        payload.validate()?;

        let profile = self.profile(user_id).await?;
        let now = self.clock.now();
        let journal_date = self.today_for(&profile)?;

        let (activity, streak) = self
            .insert_with_solo_streak(user_id, journal_date, now, &payload)
            .await?;
        info!("User {user_id} posted for {journal_date} (post {})", activity.id());

        self.record_pair_streaks(user_id, journal_date).await;
        let notification = self.notify_followers(&profile, &activity).await;

        Ok(CreatedActivity {
            activity,
            streak,
            notification,
        })
    }

    /// The user's post for their current journal date, if any.
    pub async fn todays_activity(
        &self,
        user_id: UserId,
    ) -> Result<Option<ActivityRecord>, DomainError> {
        let profile = self.profile(user_id).await?;
        let today = self.today_for(&profile)?;
        self.ports.activities.find_for(user_id, today).await
    }

    pub async fn pair_streaks(&self, user_id: UserId) -> Result<Vec<PairStreakView>, DomainError> {
        let profile = self.profile(user_id).await?;
        let today = self.today_for(&profile)?;
        self.tracker.pair_streaks_for(user_id, today).await
    }

    pub async fn register_endpoint(
        &self,
        user_id: UserId,
        token: &str,
    ) -> Result<PushEndpoint, DomainError> {
        self.profile(user_id).await?;
        self.ports
            .endpoints
            .register(user_id, token, self.clock.now())
            .await
    }

    async fn profile(&self, user_id: UserId) -> Result<UserProfile, DomainError> {
        self.ports
            .users
            .find_profile(user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("User {user_id}")))
    }

    fn today_for(&self, profile: &UserProfile) -> Result<JournalDate, DomainError> {
        let timezone = profile.timezone().ok_or_else(|| {
            DomainError::InvalidTimezone(format!("User {} has no timezone set", profile.id))
        })?;
        compute_journal_date(self.clock.now(), timezone, self.cutoff)
    }

    /// Store the post and the author's solo streak together. A lost streak
    /// race rolls both back and re-plans against the fresh state.
    async fn insert_with_solo_streak(
        &self,
        user_id: UserId,
        journal_date: JournalDate,
        now: DateTime<Utc>,
        payload: &NewActivity,
    ) -> Result<(ActivityRecord, Option<StreakState>), DomainError> {
        let subject = Subject::solo(user_id);
        let max_attempts = self.tracker.max_attempts();

        for attempt in 1..=max_attempts {
            let (current, next) = match self.tracker.plan(subject, user_id, journal_date).await {
                Ok(planned) => planned,
                Err(DomainError::OutOfOrderActivity(msg)) => {
                    warn!("Streak for user {user_id} not updated: {msg}");
                    let activity = self
                        .ports
                        .activities
                        .insert_with_streak(user_id, journal_date, now, payload, None)
                        .await?
                        .ok_or_else(|| {
                            DomainError::Repository("Post without streak was not stored".into())
                        })?;
                    return Ok((activity, None));
                }
                Err(e) => return Err(e),
            };

            if let Some(activity) = self
                .ports
                .activities
                .insert_with_streak(user_id, journal_date, now, payload, next.as_ref())
                .await?
            {
                return Ok((activity, Some(next.unwrap_or(current))));
            }

            debug!(
                "{subject}: streak moved while posting, retrying (attempt {attempt}/{max_attempts})"
            );
            tokio::task::yield_now().await;
        }

        warn!(
            "{subject}: gave up posting {journal_date} after {max_attempts} conflicting writes"
        );
        Err(DomainError::Conflict(format!(
            "{subject} kept changing while recording {journal_date}"
        )))
    }

    async fn record_pair_streaks(&self, user_id: UserId, journal_date: JournalDate) {
        let partners = match self.ports.relationships.mutual_partners(user_id).await {
            Ok(partners) => partners,
            Err(e) => {
                warn!("Could not load streak partners for user {user_id}: {e}");
                return;
            }
        };

        for partner in partners {
            let result = match Subject::pair(user_id, partner) {
                Ok(subject) => {
                    self.tracker
                        .record_activity(subject, user_id, journal_date)
                        .await
                }
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                warn!("Pair streak {user_id}/{partner} not updated: {e}");
            }
        }
    }

    async fn notify_followers(
        &self,
        profile: &UserProfile,
        activity: &ActivityRecord,
    ) -> Option<DispatchTicket> {
        let followers = match self.ports.relationships.accepted_followers(profile.id).await {
            Ok(followers) if !followers.is_empty() => followers,
            Ok(_) => return None,
            Err(e) => {
                warn!("Could not load followers of user {}: {}", profile.id, e);
                return None;
            }
        };

        let endpoints = match self.ports.endpoints.find_by_owners(&followers).await {
            Ok(endpoints) if !endpoints.is_empty() => endpoints,
            Ok(_) => return None,
            Err(e) => {
                warn!("Could not load follower endpoints for user {}: {}", profile.id, e);
                return None;
            }
        };

        let message = push::new_post(&profile.display_name, profile.id, activity.text());
        match self.queue.submit(DispatchJob::new(endpoints, message)).await {
            Ok(ticket) => Some(ticket),
            Err(e) => {
                warn!("New-post notification for user {} dropped: {}", profile.id, e);
                None
            }
        }
    }
}
