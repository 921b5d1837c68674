use chrono::{TimeZone, Utc};

use microjournal_domain::activity::{ActivityRepository, NewActivity};
use microjournal_domain::clock::JournalDate;
use microjournal_domain::shared::{DomainError, UserId};
use microjournal_domain::streak::{StreakRepository, StreakState, Transition};
use microjournal_domain::subject::Subject;
use microjournal_infrastructure::persistence::repositories::{
    SqliteActivityRepository, SqliteStreakRepository,
};

mod test_helpers;

fn day(s: &str) -> JournalDate {
    s.parse().expect("date")
}

fn advance(state: &StreakState, user: UserId, date: &str) -> StreakState {
    let now = Utc.with_ymd_and_hms(2024, 1, 20, 8, 0, 0).unwrap();
    match state.apply(user, day(date), now).expect("apply") {
        Transition::Advanced(next) => next,
        Transition::Unchanged => panic!("expected advance"),
    }
}

#[tokio::test]
async fn activity_insert_find_and_duplicate() {
    let db = test_helpers::setup_in_memory_db().await;
    let user = test_helpers::create_user(&db, "ana", Some("UTC")).await;
    let repo = SqliteActivityRepository::new(db.pool());
    let date = day("2024-01-10");

    assert!(!repo.exists_for(user, date).await.expect("exists"));

    let payload = NewActivity::new("first entry").with_template(2);
    let record = repo
        .insert_with_streak(user, date, Utc::now(), &payload, None)
        .await
        .expect("insert")
        .expect("stored");
    assert_eq!(record.text(), "first entry");
    assert_eq!(record.template_id(), Some(2));

    assert!(repo.exists_for(user, date).await.expect("exists"));
    let found = repo.find_for(user, date).await.expect("find").expect("some");
    assert_eq!(found.id(), record.id());
    assert_eq!(found.journal_date(), date);

    let duplicate = repo
        .insert_with_streak(user, date, Utc::now(), &NewActivity::new("second"), None)
        .await;
    assert!(matches!(duplicate, Err(DomainError::DuplicateActivity(_))));

    // Next journal day is fine.
    repo.insert_with_streak(user, date.next(), Utc::now(), &NewActivity::new("next day"), None)
        .await
        .expect("insert next day")
        .expect("stored");
}

#[tokio::test]
async fn post_and_streak_commit_together() {
    let db = test_helpers::setup_in_memory_db().await;
    let user = test_helpers::create_user(&db, "ana", Some("UTC")).await;
    let posts = SqliteActivityRepository::new(db.pool());
    let streaks = SqliteStreakRepository::new(db.pool());
    let subject = Subject::solo(user);

    let first = advance(&StreakState::empty(subject), user, "2024-01-10");
    posts
        .insert_with_streak(user, day("2024-01-10"), Utc::now(), &NewActivity::new("a"), Some(&first))
        .await
        .expect("insert")
        .expect("stored");

    let stored = streaks.find(&subject).await.expect("find").expect("exists");
    assert_eq!(stored.version(), 1);
    assert_eq!(stored.streak_count(), 1);
}

#[tokio::test]
async fn stale_streak_rolls_back_the_post() {
    let db = test_helpers::setup_in_memory_db().await;
    let user = test_helpers::create_user(&db, "ana", Some("UTC")).await;
    let posts = SqliteActivityRepository::new(db.pool());
    let streaks = SqliteStreakRepository::new(db.pool());
    let subject = Subject::solo(user);

    let first = advance(&StreakState::empty(subject), user, "2024-01-10");
    assert!(streaks.compare_and_swap(&first).await.expect("insert"));

    // Planned from the empty state, so version 1 is already taken.
    let stale = advance(&StreakState::empty(subject), user, "2024-01-11");
    let result = posts
        .insert_with_streak(user, day("2024-01-11"), Utc::now(), &NewActivity::new("b"), Some(&stale))
        .await
        .expect("insert");
    assert!(result.is_none());
    assert!(!posts.exists_for(user, day("2024-01-11")).await.expect("exists"));

    let stored = streaks.find(&subject).await.expect("find").expect("exists");
    assert_eq!(stored, first);
}
