use microjournal_domain::relationship::{FollowStatus, RelationshipDirectory};
use microjournal_infrastructure::persistence::repositories::SqliteRelationshipDirectory;

mod test_helpers;

#[tokio::test]
async fn mutual_partners_require_accepted_follows_both_ways() {
    let db = test_helpers::setup_in_memory_db().await;
    let ana = test_helpers::create_user(&db, "ana", Some("UTC")).await;
    let ben = test_helpers::create_user(&db, "ben", Some("UTC")).await;
    let cat = test_helpers::create_user(&db, "cat", Some("UTC")).await;
    let dan = test_helpers::create_user(&db, "dan", Some("UTC")).await;
    let graph = SqliteRelationshipDirectory::new(db.pool());

    // ana <-> ben mutual
    graph.upsert_follow(ana, ben, FollowStatus::Accepted).await.unwrap();
    graph.upsert_follow(ben, ana, FollowStatus::Accepted).await.unwrap();
    // ana <-> cat, one side pending
    graph.upsert_follow(ana, cat, FollowStatus::Accepted).await.unwrap();
    graph.upsert_follow(cat, ana, FollowStatus::Pending).await.unwrap();
    // dan follows ana one way
    graph.upsert_follow(dan, ana, FollowStatus::Accepted).await.unwrap();

    assert_eq!(graph.mutual_partners(ana).await.unwrap(), vec![ben]);
    assert_eq!(graph.mutual_partners(ben).await.unwrap(), vec![ana]);
    assert!(graph.mutual_partners(dan).await.unwrap().is_empty());

    assert_eq!(graph.accepted_followers(ana).await.unwrap(), vec![ben, dan]);

    graph.upsert_follow(cat, ana, FollowStatus::Accepted).await.unwrap();
    assert_eq!(graph.mutual_partners(ana).await.unwrap(), vec![ben, cat]);
}
