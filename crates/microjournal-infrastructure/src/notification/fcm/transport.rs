use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use microjournal_domain::push::{
    token_prefix, DeliveryOutcome, FailureKind, MulticastReport, PushMessage, PushTransport,
};
use microjournal_domain::shared::DomainError;

use super::message_builder::{classify_error, SendResult};

impl super::FcmTransport {
    async fn send_one(&self, token: &str, message: &PushMessage) -> SendResult {
        let payload = self.build_message(token, message);

        let response = match self
            .client
            .post(self.send_url.clone())
            .bearer_auth(&self.config.access_token)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                log::warn!("FCM request for token {}... failed: {}", token_prefix(token), e);
                return SendResult::Unreachable(e.to_string());
            }
        };

        let status = response.status();
        if status.is_success() {
            return SendResult::Outcome(DeliveryOutcome::Delivered);
        }

        let body = response.text().await.unwrap_or_default();
        let result = classify_error(status, &body);
        if let SendResult::Outcome(DeliveryOutcome::Failed { kind, reason }) = &result {
            log::debug!(
                "FCM rejected token {}... ({:?}): {}",
                token_prefix(token),
                kind,
                reason
            );
        }
        result
    }
}

#[async_trait]
impl PushTransport for super::FcmTransport {
    async fn send_multicast(
        &self,
        tokens: &[String],
        message: &PushMessage,
    ) -> Result<MulticastReport, DomainError> {
        if tokens.is_empty() {
            return Ok(MulticastReport::default());
        }

        // `buffered` keeps results in token order.
        let results: Vec<SendResult> = stream::iter(tokens.iter().cloned())
            .map(|token| async move { self.send_one(&token, message).await })
            .buffered(self.config.max_in_flight)
            .collect()
            .await;

        let mut outcomes = Vec::with_capacity(results.len());
        let mut last_unreachable = None;
        let mut answered = 0usize;
        for result in results {
            match result {
                SendResult::Outcome(outcome) => {
                    answered += 1;
                    outcomes.push(outcome);
                }
                SendResult::AuthRejected(reason) => return Err(DomainError::Transport(reason)),
                SendResult::Unreachable(reason) => {
                    outcomes.push(DeliveryOutcome::failed(FailureKind::Transient, reason.clone()));
                    last_unreachable = Some(reason);
                }
            }
        }

        // Nothing reached FCM: the batch failed as a whole.
        if answered == 0 {
            let reason = last_unreachable.unwrap_or_else(|| "no response".to_string());
            return Err(DomainError::Transport(format!("FCM unreachable: {reason}")));
        }

        Ok(MulticastReport::new(outcomes))
    }
}
