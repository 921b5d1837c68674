use chrono::{Duration, Utc};

use microjournal_domain::push::PushEndpointRepository;
use microjournal_infrastructure::persistence::repositories::SqlitePushEndpointRepository;

mod test_helpers;

#[tokio::test]
async fn push_endpoint_register_lookup_and_prune() {
    let db = test_helpers::setup_in_memory_db().await;
    let ana = test_helpers::create_user(&db, "ana", Some("UTC")).await;
    let ben = test_helpers::create_user(&db, "ben", Some("UTC")).await;
    let carl = test_helpers::create_user(&db, "carl", Some("UTC")).await;
    let repo = SqlitePushEndpointRepository::new(db.pool());

    let first_seen = Utc::now() - Duration::days(3);
    repo.register(ana, "token-ana-phone", first_seen).await.expect("register");
    // Re-registering refreshes instead of duplicating.
    let refreshed = repo
        .register(ana, "token-ana-phone", Utc::now())
        .await
        .expect("refresh");
    assert!(refreshed.registered_at > first_seen);
    repo.register(ana, "token-ana-tablet", Utc::now()).await.expect("register");
    repo.register(ben, "token-ben", Utc::now()).await.expect("register");

    assert!(repo.register(carl, "  ", Utc::now()).await.is_err());

    let ana_endpoints = repo.find_by_owner(ana).await.expect("find");
    assert_eq!(ana_endpoints.len(), 2);

    let many = repo.find_by_owners(&[ana, ben, carl]).await.expect("find many");
    assert_eq!(many.len(), 3);
    assert!(repo.find_by_owners(&[]).await.expect("empty").is_empty());

    assert_eq!(repo.delete_token("token-ana-phone").await.expect("delete"), 1);
    assert_eq!(repo.delete_token("token-ana-phone").await.expect("delete again"), 0);
    assert_eq!(repo.find_by_owner(ana).await.expect("find").len(), 1);
}
