#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, Semaphore};

use microjournal_domain::clock::Clock;
use microjournal_domain::push::{
    DeliveryOutcome, MulticastReport, PushEndpointRepository, PushMessage, PushTransport,
};
use microjournal_domain::relationship::FollowStatus;
use microjournal_domain::shared::{DomainError, UserId};
use microjournal_infrastructure::persistence::repositories::{
    SqliteRelationshipDirectory, SqliteUserDirectory,
};
use microjournal_infrastructure::persistence::Database;
use microjournal_lib::application::config::EngineConfig;
use microjournal_lib::presentation::bootstrap::build_app_state;
use microjournal_lib::presentation::state::AppState;

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

/// Clock the test moves by hand.
pub struct TestClock {
    now: Mutex<DateTime<Utc>>,
}

impl TestClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Transport that records every call. Tokens listed in `outcomes` get that
/// outcome; everything else is delivered. A batch holding a token from
/// `failing` errors out as a whole.
pub struct RecordingTransport {
    outcomes: Mutex<HashMap<String, DeliveryOutcome>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<(Vec<String>, PushMessage)>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_outcome(&self, token: &str, outcome: DeliveryOutcome) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(token.to_string(), outcome);
    }

    pub fn fail_batch_for(&self, token: &str) {
        self.failing.lock().unwrap().insert(token.to_string());
    }

    pub fn recover(&self, token: &str) {
        self.failing.lock().unwrap().remove(token);
    }

    pub fn calls(&self) -> Vec<(Vec<String>, PushMessage)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PushTransport for RecordingTransport {
    async fn send_multicast(
        &self,
        tokens: &[String],
        message: &PushMessage,
    ) -> Result<MulticastReport, DomainError> {
        self.calls
            .lock()
            .unwrap()
            .push((tokens.to_vec(), message.clone()));

        let failing = self.failing.lock().unwrap();
        if let Some(token) = tokens.iter().find(|t| failing.contains(*t)) {
            return Err(DomainError::Transport(format!("connection refused for {token}")));
        }
        drop(failing);

        let outcomes = self.outcomes.lock().unwrap();
        Ok(MulticastReport::new(
            tokens
                .iter()
                .map(|t| {
                    outcomes
                        .get(t)
                        .cloned()
                        .unwrap_or(DeliveryOutcome::Delivered)
                })
                .collect(),
        ))
    }
}

/// Transport that blocks inside `send_multicast` until the test opens the gate.
pub struct GatedTransport {
    pub entered: Notify,
    gate: Semaphore,
}

impl GatedTransport {
    pub fn new() -> Self {
        Self {
            entered: Notify::new(),
            gate: Semaphore::new(0),
        }
    }

    pub fn open(&self, permits: usize) {
        self.gate.add_permits(permits);
    }
}

#[async_trait]
impl PushTransport for GatedTransport {
    async fn send_multicast(
        &self,
        tokens: &[String],
        _message: &PushMessage,
    ) -> Result<MulticastReport, DomainError> {
        self.entered.notify_one();
        self.gate
            .acquire()
            .await
            .map_err(|e| DomainError::Transport(e.to_string()))?
            .forget();
        Ok(MulticastReport::new(vec![
            DeliveryOutcome::Delivered;
            tokens.len()
        ]))
    }
}

pub struct Harness {
    pub state: AppState,
    pub clock: Arc<TestClock>,
    pub transport: Arc<RecordingTransport>,
}

impl Harness {
    pub async fn start(now: DateTime<Utc>) -> Self {
        let db = Database::in_memory().await.expect("open in-memory db");
        db.run_migrations().await.expect("run migrations");

        let clock = Arc::new(TestClock::new(now));
        let transport = Arc::new(RecordingTransport::new());
        let state = build_app_state(
            EngineConfig::default(),
            db,
            transport.clone(),
            clock.clone(),
        );

        Self {
            state,
            clock,
            transport,
        }
    }

    pub async fn create_user(&self, username: &str, timezone: Option<&str>) -> UserId {
        SqliteUserDirectory::new(self.state.runtime.pool.clone())
            .create(username, &format!("{username} display"), timezone)
            .await
            .expect("create user")
    }

    pub async fn register_token(&self, user: UserId, token: &str) {
        self.state
            .repositories
            .endpoints
            .register(user, token, self.clock.now())
            .await
            .expect("register token");
    }

    pub async fn follow(&self, follower: UserId, following: UserId) {
        SqliteRelationshipDirectory::new(self.state.runtime.pool.clone())
            .upsert_follow(follower, following, FollowStatus::Accepted)
            .await
            .expect("follow");
    }

    pub async fn befriend(&self, a: UserId, b: UserId) {
        self.follow(a, b).await;
        self.follow(b, a).await;
    }
}
