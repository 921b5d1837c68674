use chrono::{TimeZone, Utc};

use microjournal_domain::clock::JournalDate;
use microjournal_domain::shared::UserId;
use microjournal_domain::streak::{StreakRepository, StreakState, Transition};
use microjournal_domain::subject::Subject;
use microjournal_infrastructure::persistence::repositories::SqliteStreakRepository;

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
async fn solo_streak_insert_update_and_stale_write() {
    let db = test_helpers::setup_in_memory_db().await;
    let user = test_helpers::create_user(&db, "ana", Some("UTC")).await;
    let repo = SqliteStreakRepository::new(db.pool());
    let subject = Subject::solo(user);

    assert!(repo.find(&subject).await.expect("find").is_none());

    let first = advance(&StreakState::empty(subject), user, "2024-01-10");
    assert!(repo.compare_and_swap(&first).await.expect("insert"));

    // A second writer that also started from "empty" loses.
    assert!(!repo.compare_and_swap(&first).await.expect("duplicate insert"));

    let stored = repo.find(&subject).await.expect("find").expect("exists");
    assert_eq!(stored.version(), 1);
    assert_eq!(stored.streak_count(), 1);

    let second = advance(&stored, user, "2024-01-11");
    assert!(repo.compare_and_swap(&second).await.expect("update"));
    // Same expected version again is stale now.
    assert!(!repo.compare_and_swap(&second).await.expect("stale update"));

    let stored = repo.find(&subject).await.expect("find").expect("exists");
    let solo = stored.as_solo().expect("solo");
    assert_eq!(stored.version(), 2);
    assert_eq!(solo.streak_count(), 2);
    assert_eq!(solo.longest_streak(), 2);
    assert_eq!(solo.last_activity_date(), Some(day("2024-01-11")));
}

#[tokio::test]
async fn pair_streak_round_trip_and_lookup() {
    let db = test_helpers::setup_in_memory_db().await;
    let a = test_helpers::create_user(&db, "a", Some("UTC")).await;
    let b = test_helpers::create_user(&db, "b", Some("UTC")).await;
    let c = test_helpers::create_user(&db, "c", Some("UTC")).await;
    let repo = SqliteStreakRepository::new(db.pool());

    let subject = Subject::pair(b, a).expect("pair");
    let state = advance(&StreakState::empty(subject), a, "2024-01-10");
    assert!(repo.compare_and_swap(&state).await.expect("insert"));
    let state = advance(&state, b, "2024-01-10");
    assert!(repo.compare_and_swap(&state).await.expect("update"));

    let other = advance(&StreakState::empty(Subject::pair(b, c).expect("pair")), c, "2024-01-10");
    assert!(repo.compare_and_swap(&other).await.expect("insert other"));

    let stored = repo.find(&subject).await.expect("find").expect("exists");
    assert_eq!(stored, state);
    assert_eq!(stored.streak_count(), 1);

    // Pair rows store no count of their own.
    let (count, longest): (i64, i64) = sqlx::query_as(
        "SELECT streak_count, longest_streak FROM streak_states WHERE subject_key = ?1",
    )
    .bind(subject.key())
    .fetch_one(&*db.pool())
    .await
    .expect("raw row");
    assert_eq!((count, longest), (0, 0));

    let for_b = repo.find_pairs_for(b).await.expect("pairs for b");
    assert_eq!(for_b.len(), 2);
    let for_a = repo.find_pairs_for(a).await.expect("pairs for a");
    assert_eq!(for_a.len(), 1);
    assert_eq!(*for_a[0].subject(), subject);
}

#[tokio::test]
async fn expiry_candidates_need_timezone_and_live_streak() {
    let db = test_helpers::setup_in_memory_db().await;
    let with_tz = test_helpers::create_user(&db, "tz", Some("America/New_York")).await;
    let without_tz = test_helpers::create_user(&db, "notz", None).await;
    let repo = SqliteStreakRepository::new(db.pool());

    for user in [with_tz, without_tz] {
        let state = advance(&StreakState::empty(Subject::solo(user)), user, "2024-01-10");
        assert!(repo.compare_and_swap(&state).await.expect("insert"));
    }

    let candidates = repo.find_expiry_candidates().await.expect("candidates");
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].user_id, with_tz);
    assert_eq!(candidates[0].timezone, "America/New_York");
    assert_eq!(candidates[0].streak_count, 1);
    assert_eq!(candidates[0].last_activity_date, day("2024-01-10"));
}
