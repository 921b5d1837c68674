//! The slice of the follow graph the streak engine reads.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::shared::{DomainError, UserId};

/// Follow request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowStatus {
    Pending,
    Accepted,
    Rejected,
}

impl FollowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowStatus::Pending => "pending",
            FollowStatus::Accepted => "accepted",
            FollowStatus::Rejected => "rejected",
        }
    }

    /// Only accepted follows count towards notifications and pair streaks.
    pub fn is_active(&self) -> bool {
        matches!(self, FollowStatus::Accepted)
    }
}

impl FromStr for FollowStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FollowStatus::Pending),
            "accepted" => Ok(FollowStatus::Accepted),
            "rejected" => Ok(FollowStatus::Rejected),
            _ => Err(DomainError::DataIntegrity(format!(
                "Unknown follow status: {s}"
            ))),
        }
    }
}

impl fmt::Display for FollowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[async_trait]
pub trait RelationshipDirectory: Send + Sync {
    /// Users who follow `user` and are followed back, both accepted.
    async fn mutual_partners(&self, user: UserId) -> Result<Vec<UserId>, DomainError>;

    /// Users with an accepted follow of `user`.
    async fn accepted_followers(&self, user: UserId) -> Result<Vec<UserId>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_and_activity() {
        for status in [FollowStatus::Pending, FollowStatus::Accepted, FollowStatus::Rejected] {
            assert_eq!(status.as_str().parse::<FollowStatus>().unwrap(), status);
        }
        assert!(FollowStatus::Accepted.is_active());
        assert!(!FollowStatus::Pending.is_active());
        assert!("blocked".parse::<FollowStatus>().is_err());
    }
}
