use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::{DomainError, UserId};

/// Device token registered by a user for push delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEndpoint {
    pub owner: UserId,
    pub token: String,
    pub registered_at: DateTime<Utc>,
}

impl PushEndpoint {
    pub fn new(owner: UserId, token: impl Into<String>, registered_at: DateTime<Utc>) -> Self {
        Self {
            owner,
            token: token.into(),
            registered_at,
        }
    }
}

/// Shortened token for log lines.
pub fn token_prefix(token: &str) -> &str {
    match token.char_indices().nth(10) {
        Some((idx, _)) => &token[..idx],
        None => token,
    }
}

#[async_trait]
pub trait PushEndpointRepository: Send + Sync {
    /// Create or refresh `(owner, token)`.
    async fn register(
        &self,
        owner: UserId,
        token: &str,
        registered_at: DateTime<Utc>,
    ) -> Result<PushEndpoint, DomainError>;

    async fn find_by_owner(&self, owner: UserId) -> Result<Vec<PushEndpoint>, DomainError>;

    async fn find_by_owners(&self, owners: &[UserId]) -> Result<Vec<PushEndpoint>, DomainError>;

    /// Remove every registration of `token`; returns rows deleted.
    async fn delete_token(&self, token: &str) -> Result<u64, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_prefix() {
        assert_eq!(token_prefix("abcdefghijklmnop"), "abcdefghij");
        assert_eq!(token_prefix("short"), "short");
        assert_eq!(token_prefix(""), "");
    }
}
