use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;

use microjournal_domain::push::{
    token_prefix, BulkOutcome, PushEndpoint, PushEndpointRepository, PushMessage, PushTransport,
};
use microjournal_domain::shared::DomainError;

/// Sends one message to a set of endpoints and prunes tokens the transport
/// reports as permanently dead.
pub struct NotificationDispatcher {
    transport: Arc<dyn PushTransport>,
    endpoints: Arc<dyn PushEndpointRepository>,
}

impl NotificationDispatcher {
    pub fn new(
        transport: Arc<dyn PushTransport>,
        endpoints: Arc<dyn PushEndpointRepository>,
    ) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    /// `success_count + failure_count` always equals `endpoints.len()`.
    pub async fn send_bulk(
        &self,
        endpoints: &[PushEndpoint],
        message: &PushMessage,
    ) -> Result<BulkOutcome, DomainError> {
        if endpoints.is_empty() {
            return Ok(BulkOutcome::default());
        }

        // Two owners may share a device token; send it once.
        let mut token_index: HashMap<&str, usize> = HashMap::new();
        let mut tokens: Vec<String> = Vec::new();
        for endpoint in endpoints {
            token_index.entry(endpoint.token.as_str()).or_insert_with(|| {
                tokens.push(endpoint.token.clone());
                tokens.len() - 1
            });
        }

        let report = self.transport.send_multicast(&tokens, message).await?;
        if report.outcomes.len() != tokens.len() {
            return Err(DomainError::Transport(format!(
                "Transport returned {} outcomes for {} tokens",
                report.outcomes.len(),
                tokens.len()
            )));
        }

        let mut outcome = BulkOutcome::default();
        for endpoint in endpoints {
            let delivered = token_index
                .get(endpoint.token.as_str())
                .map(|&idx| report.outcomes[idx].is_delivered())
                .unwrap_or(false);
            if delivered {
                outcome.success_count += 1;
            } else {
                outcome.failure_count += 1;
            }
        }

        for (token, result) in tokens.iter().zip(report.outcomes.iter()) {
            if !result.is_permanent_failure() {
                continue;
            }
            match self.endpoints.delete_token(token).await {
                Ok(deleted) => {
                    outcome.pruned += deleted as usize;
                    info!("Pruned dead push token {}...", token_prefix(token));
                }
                Err(e) => warn!(
                    "Failed to prune push token {}...: {}",
                    token_prefix(token),
                    e
                ),
            }
        }

        info!(
            "Push '{}' sent: {} delivered, {} failed, {} pruned",
            message.kind().unwrap_or("message"),
            outcome.success_count,
            outcome.failure_count,
            outcome.pruned
        );

        Ok(outcome)
    }
}
