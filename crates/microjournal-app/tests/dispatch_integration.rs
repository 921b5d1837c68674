mod test_helpers;

use async_trait::async_trait;
use mockall::mock;
use std::sync::Arc;

use microjournal_domain::push::{
    self, DeliveryOutcome, FailureKind, MulticastReport, PushEndpoint, PushEndpointRepository,
    PushMessage, PushTransport,
};
use microjournal_domain::shared::{DomainError, UserId};
use microjournal_lib::application::config::DispatchConfig;
use microjournal_lib::application::services::{DispatchJob, DispatchQueue, NotificationDispatcher};
use test_helpers::{utc, GatedTransport, Harness};

mock! {
    pub Transport {}

    #[async_trait]
    impl PushTransport for Transport {
        async fn send_multicast(
            &self,
            tokens: &[String],
            message: &PushMessage,
        ) -> Result<MulticastReport, DomainError>;
    }
}

fn endpoint(owner: i64, token: &str) -> PushEndpoint {
    PushEndpoint::new(UserId::new(owner), token, utc(2024, 1, 1, 0, 0))
}

async fn dispatcher_with(h: &Harness, transport: MockTransport) -> NotificationDispatcher {
    NotificationDispatcher::new(Arc::new(transport), h.state.repositories.endpoints.clone())
}

#[tokio::test]
async fn test_shared_token_is_sent_once_and_counted_per_endpoint() {
    let h = Harness::start(utc(2024, 1, 1, 12, 0)).await;
    let mut transport = MockTransport::new();
    transport
        .expect_send_multicast()
        .withf(|tokens: &[String], _message: &PushMessage| {
            tokens.to_vec() == vec!["family-tablet".to_string(), "dad-phone".to_string()]
        })
        .times(1)
        .returning(|_, _| {
            Ok(MulticastReport::new(vec![
                DeliveryOutcome::Delivered,
                DeliveryOutcome::failed(FailureKind::Transient, "INTERNAL"),
            ]))
        });
    let dispatcher = dispatcher_with(&h, transport).await;

    let endpoints = vec![
        endpoint(1, "family-tablet"),
        endpoint(2, "family-tablet"),
        endpoint(2, "dad-phone"),
    ];
    let outcome = dispatcher
        .send_bulk(&endpoints, &push::daily_reminder())
        .await
        .unwrap();

    assert_eq!(outcome.success_count, 2);
    assert_eq!(outcome.failure_count, 1);
    assert_eq!(outcome.pruned, 0);
}

#[tokio::test]
async fn test_unregistered_tokens_are_pruned() {
    let h = Harness::start(utc(2024, 1, 1, 12, 0)).await;
    let owner = h.create_user("owner", Some("UTC")).await;
    h.register_token(owner, "gone").await;
    h.register_token(owner, "kept").await;

    let mut transport = MockTransport::new();
    transport
        .expect_send_multicast()
        .returning(|tokens, _| {
            Ok(MulticastReport::new(
                tokens
                    .iter()
                    .map(|t| {
                        if t == "gone" {
                            DeliveryOutcome::failed(FailureKind::Unregistered, "UNREGISTERED")
                        } else {
                            DeliveryOutcome::failed(FailureKind::Transient, "UNAVAILABLE")
                        }
                    })
                    .collect(),
            ))
        });
    let dispatcher = dispatcher_with(&h, transport).await;

    let endpoints = h
        .state
        .repositories
        .endpoints
        .find_by_owner(owner)
        .await
        .unwrap();
    let outcome = dispatcher
        .send_bulk(&endpoints, &push::streak_expiry())
        .await
        .unwrap();

    assert_eq!(outcome.success_count, 0);
    assert_eq!(outcome.failure_count, 2);
    assert_eq!(outcome.pruned, 1);

    let left = h
        .state
        .repositories
        .endpoints
        .find_by_owner(owner)
        .await
        .unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].token, "kept");
}

#[tokio::test]
async fn test_batch_failure_and_short_report_are_errors() {
    let h = Harness::start(utc(2024, 1, 1, 12, 0)).await;

    let mut rejected = MockTransport::new();
    rejected
        .expect_send_multicast()
        .returning(|_, _| Err(DomainError::Transport("HTTP 401".to_string())));
    let dispatcher = dispatcher_with(&h, rejected).await;
    let err = dispatcher
        .send_bulk(&[endpoint(1, "a")], &push::daily_reminder())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Transport(_)));

    let mut short = MockTransport::new();
    short
        .expect_send_multicast()
        .returning(|_, _| Ok(MulticastReport::new(vec![DeliveryOutcome::Delivered])));
    let dispatcher = dispatcher_with(&h, short).await;
    let err = dispatcher
        .send_bulk(&[endpoint(1, "a"), endpoint(1, "b")], &push::daily_reminder())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Transport(_)));
}

#[tokio::test]
async fn test_empty_endpoint_list_skips_transport() {
    let h = Harness::start(utc(2024, 1, 1, 12, 0)).await;
    let mut transport = MockTransport::new();
    transport.expect_send_multicast().times(0);
    let dispatcher = dispatcher_with(&h, transport).await;

    let outcome = dispatcher
        .send_bulk(&[], &push::daily_reminder())
        .await
        .unwrap();
    assert_eq!(outcome, Default::default());
}

#[tokio::test]
async fn test_queue_rejects_when_full_and_drains_on_shutdown() {
    let h = Harness::start(utc(2024, 1, 1, 12, 0)).await;
    let transport = Arc::new(GatedTransport::new());
    let dispatcher = Arc::new(NotificationDispatcher::new(
        transport.clone(),
        h.state.repositories.endpoints.clone(),
    ));
    let queue = DispatchQueue::start(
        dispatcher,
        &DispatchConfig {
            workers: 1,
            queue_capacity: 1,
        },
    );

    let job = || DispatchJob::new(vec![endpoint(1, "t")], push::daily_reminder());

    let first = queue.submit(job()).await.unwrap();
    // The single worker is now parked inside the transport.
    transport.entered.notified().await;

    let second = queue.submit(job()).await.unwrap();
    let err = queue.submit(job()).await.unwrap_err();
    assert!(matches!(err, DomainError::Infrastructure(_)));

    transport.open(2);
    assert_eq!(first.wait().await.unwrap().success_count, 1);
    assert_eq!(second.wait().await.unwrap().success_count, 1);

    queue.shutdown().await;
    assert!(queue.submit(job()).await.is_err());
}

#[tokio::test]
async fn test_ticket_reports_job_id() {
    let h = Harness::start(utc(2024, 1, 1, 12, 0)).await;
    let mut transport = MockTransport::new();
    transport
        .expect_send_multicast()
        .returning(|tokens, _| {
            Ok(MulticastReport::new(vec![DeliveryOutcome::Delivered; tokens.len()]))
        });
    let dispatcher = Arc::new(dispatcher_with(&h, transport).await);
    let queue = DispatchQueue::start(dispatcher, &DispatchConfig::default());

    let job = DispatchJob::new(vec![endpoint(1, "x"), endpoint(2, "y")], push::daily_reminder());
    let id = job.id.clone();
    let ticket = queue.submit(job).await.unwrap();
    assert_eq!(ticket.job_id(), &id);

    let outcome = ticket.wait().await.unwrap();
    assert_eq!(outcome.success_count, 2);
    queue.shutdown().await;
}
