//! Read-only view of user profiles.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::{DomainError, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
    /// IANA identifier as stored; may be empty or invalid.
    pub timezone: Option<String>,
}

impl UserProfile {
    pub fn timezone(&self) -> Option<&str> {
        self.timezone.as_deref().filter(|tz| !tz.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTimezone {
    pub user_id: UserId,
    pub timezone: String,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_profile(&self, user: UserId) -> Result<Option<UserProfile>, DomainError>;

    /// Every user with a non-empty timezone, in id order.
    async fn list_with_timezone(&self) -> Result<Vec<UserTimezone>, DomainError>;
}
