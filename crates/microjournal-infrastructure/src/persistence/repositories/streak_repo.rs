use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use std::sync::Arc;

use microjournal_domain::clock::JournalDate;
use microjournal_domain::shared::{DomainError, UserId};
use microjournal_domain::streak::{
    ExpiryCandidate, PairStreak, SoloStreak, StreakProgress, StreakRepository, StreakState,
};
use microjournal_domain::subject::{PairSide, Subject, SubjectKind};

use super::parse_journal_date;
use crate::persistence::{ResultExt, SqliteRepositoryBase};

const STREAK_COLUMNS: &str = "subject_key, subject_kind, user_a, user_b, streak_count, longest_streak, \
     last_activity_date, last_first, last_second, chain_start, updated_at, version";

#[derive(FromRow)]
struct StreakRow {
    subject_key: String,
    subject_kind: String,
    user_a: i64,
    user_b: Option<i64>,
    streak_count: i64,
    longest_streak: i64,
    last_activity_date: Option<String>,
    last_first: Option<String>,
    last_second: Option<String>,
    chain_start: Option<String>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl StreakRow {
    #[allow(clippy::wrong_self_convention)]
    fn to_domain(self) -> Result<StreakState, DomainError> {
        let kind: SubjectKind = self.subject_kind.parse()?;
        let (subject, progress) = match kind {
            SubjectKind::Solo => {
                let solo = SoloStreak::restore(
                    to_count(self.streak_count, &self.subject_key)?,
                    to_count(self.longest_streak, &self.subject_key)?,
                    parse_journal_date(self.last_activity_date)?,
                )?;
                (
                    Subject::solo(UserId::new(self.user_a)),
                    StreakProgress::Solo(solo),
                )
            }
            SubjectKind::Pair => {
                let user_b = self.user_b.ok_or_else(|| {
                    DomainError::DataIntegrity(format!(
                        "Pair streak {} has no second user",
                        self.subject_key
                    ))
                })?;
                let pair = PairStreak::restore(
                    parse_journal_date(self.last_first)?,
                    parse_journal_date(self.last_second)?,
                    parse_journal_date(self.chain_start)?,
                )?;
                (
                    Subject::pair(UserId::new(self.user_a), UserId::new(user_b))?,
                    StreakProgress::Pair(pair),
                )
            }
        };

        StreakState::from_persistence(subject, progress, self.updated_at, self.version)
    }
}

fn to_count(value: i64, key: &str) -> Result<u32, DomainError> {
    u32::try_from(value)
        .map_err(|_| DomainError::DataIntegrity(format!("Streak {key} has invalid count {value}")))
}

/// Column values for one write.
struct StreakColumns {
    user_a: i64,
    user_b: Option<i64>,
    streak_count: i64,
    longest_streak: i64,
    last_activity_date: Option<String>,
    last_first: Option<String>,
    last_second: Option<String>,
    chain_start: Option<String>,
}

impl StreakColumns {
    fn from_state(state: &StreakState) -> Self {
        let date = |d: Option<JournalDate>| d.map(|d| d.to_string());
        let (user_a, user_b) = match state.subject() {
            Subject::Solo { user } => (user.value(), None),
            Subject::Pair { pair } => (pair.first().value(), Some(pair.second().value())),
        };

        match state.progress() {
            StreakProgress::Solo(solo) => Self {
                user_a,
                user_b,
                streak_count: i64::from(solo.streak_count()),
                longest_streak: i64::from(solo.longest_streak()),
                last_activity_date: date(solo.last_activity_date()),
                last_first: None,
                last_second: None,
                chain_start: None,
            },
            // Pair counts are derived from the contribution dates.
            StreakProgress::Pair(pair) => Self {
                user_a,
                user_b,
                streak_count: 0,
                longest_streak: 0,
                last_activity_date: None,
                last_first: date(pair.last_contribution(PairSide::First)),
                last_second: date(pair.last_contribution(PairSide::Second)),
                chain_start: date(pair.chain_start()),
            },
        }
    }
}

#[derive(FromRow)]
struct ExpiryRow {
    user_a: i64,
    timezone: String,
    streak_count: i64,
    last_activity_date: String,
}

pub struct SqliteStreakRepository {
    base: SqliteRepositoryBase,
}

impl SqliteStreakRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self {
            base: SqliteRepositoryBase::new(pool),
        }
    }
}

/// Compare-and-swap on `executor`, which may be an open transaction.
pub(crate) async fn write_state<'e, E>(executor: E, state: &StreakState) -> Result<bool, DomainError>
where
    E: Executor<'e, Database = Sqlite>,
{
    if state.version() < 1 {
        return Err(DomainError::Validation(format!(
            "Streak state for {} was never advanced",
            state.subject()
        )));
    }

    let columns = StreakColumns::from_state(state);
    if state.version() == 1 {
        insert_first(executor, state, &columns).await
    } else {
        update_if_version(executor, state, &columns).await
    }
}

async fn insert_first<'e, E>(
    executor: E,
    state: &StreakState,
    columns: &StreakColumns,
) -> Result<bool, DomainError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let query = r#"
        INSERT INTO streak_states (
            subject_key, subject_kind, user_a, user_b, streak_count, longest_streak,
            last_activity_date, last_first, last_second, chain_start, updated_at, version
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        ON CONFLICT(subject_key) DO NOTHING
    "#;

    let result = sqlx::query(query)
        .bind(state.subject().key())
        .bind(state.subject().kind().as_str())
        .bind(columns.user_a)
        .bind(columns.user_b)
        .bind(columns.streak_count)
        .bind(columns.longest_streak)
        .bind(columns.last_activity_date.as_deref())
        .bind(columns.last_first.as_deref())
        .bind(columns.last_second.as_deref())
        .bind(columns.chain_start.as_deref())
        .bind(state.updated_at().unwrap_or_else(Utc::now))
        .bind(state.version())
        .execute(executor)
        .await
        .map_repo_error("Insert streak state")?;

    Ok(result.rows_affected() == 1)
}

async fn update_if_version<'e, E>(
    executor: E,
    state: &StreakState,
    columns: &StreakColumns,
) -> Result<bool, DomainError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let query = r#"
        UPDATE streak_states SET
            streak_count = ?1,
            longest_streak = MAX(longest_streak, ?2),
            last_activity_date = ?3,
            last_first = ?4,
            last_second = ?5,
            chain_start = ?6,
            updated_at = ?7,
            version = ?8
        WHERE subject_key = ?9 AND version = ?10
    "#;

    let result = sqlx::query(query)
        .bind(columns.streak_count)
        .bind(columns.longest_streak)
        .bind(columns.last_activity_date.as_deref())
        .bind(columns.last_first.as_deref())
        .bind(columns.last_second.as_deref())
        .bind(columns.chain_start.as_deref())
        .bind(state.updated_at().unwrap_or_else(Utc::now))
        .bind(state.version())
        .bind(state.subject().key())
        .bind(state.version() - 1)
        .execute(executor)
        .await
        .map_repo_error("Update streak state")?;

    Ok(result.rows_affected() == 1)
}

#[async_trait]
impl StreakRepository for SqliteStreakRepository {
    async fn find(&self, subject: &Subject) -> Result<Option<StreakState>, DomainError> {
        let query = format!("SELECT {STREAK_COLUMNS} FROM streak_states WHERE subject_key = ?1");

        let row: Option<StreakRow> = self
            .base
            .fetch_optional(
                sqlx::query_as(&query).bind(subject.key()),
                "Find streak state",
            )
            .await?;

        row.map(StreakRow::to_domain).transpose()
    }

    async fn compare_and_swap(&self, state: &StreakState) -> Result<bool, DomainError> {
        write_state(self.base.pool(), state).await
    }

    async fn find_pairs_for(&self, user: UserId) -> Result<Vec<StreakState>, DomainError> {
        let query = format!(
            "SELECT {STREAK_COLUMNS} FROM streak_states \
             WHERE subject_kind = 'pair' AND (user_a = ?1 OR user_b = ?1) \
             ORDER BY user_a, user_b"
        );

        let rows: Vec<StreakRow> = self
            .base
            .fetch_all(
                sqlx::query_as(&query).bind(user.value()),
                "Find pair streaks for user",
            )
            .await?;

        rows.into_iter().map(StreakRow::to_domain).collect()
    }

    async fn find_expiry_candidates(&self) -> Result<Vec<ExpiryCandidate>, DomainError> {
        let query = r#"
            SELECT s.user_a, u.timezone, s.streak_count, s.last_activity_date
            FROM streak_states s
            JOIN users u ON u.id = s.user_a
            WHERE s.subject_kind = 'solo'
              AND s.streak_count > 0
              AND s.last_activity_date IS NOT NULL
              AND u.timezone IS NOT NULL
              AND TRIM(u.timezone) <> ''
            ORDER BY s.user_a
        "#;

        let rows: Vec<ExpiryRow> = self
            .base
            .fetch_all(sqlx::query_as(query), "Find streak expiry candidates")
            .await?;

        rows.into_iter()
            .map(|r| {
                let key = format!("solo:{}", r.user_a);
                Ok(ExpiryCandidate {
                    user_id: UserId::new(r.user_a),
                    timezone: r.timezone,
                    streak_count: to_count(r.streak_count, &key)?,
                    last_activity_date: r.last_activity_date.parse().map_err(|e| {
                        DomainError::DataIntegrity(format!("Streak {key}: {e}"))
                    })?,
                })
            })
            .collect()
    }
}
