use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::message::PushMessage;
use crate::shared::DomainError;

/// Why a single token was not delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The token will never work again and should be pruned.
    Unregistered,
    Transient,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    Failed { kind: FailureKind, reason: String },
}

impl DeliveryOutcome {
    pub fn failed(kind: FailureKind, reason: impl Into<String>) -> Self {
        DeliveryOutcome::Failed {
            kind,
            reason: reason.into(),
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }

    pub fn is_permanent_failure(&self) -> bool {
        matches!(
            self,
            DeliveryOutcome::Failed {
                kind: FailureKind::Unregistered,
                ..
            }
        )
    }
}

/// Per-token outcomes, in the same order as the tokens handed to the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MulticastReport {
    pub outcomes: Vec<DeliveryOutcome>,
}

impl MulticastReport {
    pub fn new(outcomes: Vec<DeliveryOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_delivered()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }
}

/// Result of one bulk send as seen by callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub success_count: usize,
    pub failure_count: usize,
    /// Endpoints removed from the registry after a permanent failure.
    pub pruned: usize,
}

/// Push delivery backend (FCM in production, mocked in tests).
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Deliver `message` to every token in one logical call.
    ///
    /// `Err` means nothing was attempted or the whole batch failed; per-token
    /// problems are reported inside the `MulticastReport`.
    async fn send_multicast(
        &self,
        tokens: &[String],
        message: &PushMessage,
    ) -> Result<MulticastReport, DomainError>;
}
