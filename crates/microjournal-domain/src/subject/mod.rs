use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::shared::{DomainError, UserId};

/// Unordered pair of distinct users, stored smaller id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserPair {
    first: UserId,
    second: UserId,
}

impl UserPair {
    pub fn new(a: UserId, b: UserId) -> Result<Self, DomainError> {
        if a == b {
            return Err(DomainError::Validation(format!(
                "A pair needs two distinct users, got {a} twice"
            )));
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        Ok(Self { first, second })
    }

    pub fn first(&self) -> UserId {
        self.first
    }

    pub fn second(&self) -> UserId {
        self.second
    }

    pub fn side_of(&self, user: UserId) -> Option<PairSide> {
        if user == self.first {
            Some(PairSide::First)
        } else if user == self.second {
            Some(PairSide::Second)
        } else {
            None
        }
    }

    pub fn member(&self, side: PairSide) -> UserId {
        match side {
            PairSide::First => self.first,
            PairSide::Second => self.second,
        }
    }

    pub fn other(&self, user: UserId) -> Option<UserId> {
        self.side_of(user).map(|side| self.member(side.opposite()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairSide {
    First,
    Second,
}

impl PairSide {
    pub fn opposite(&self) -> Self {
        match self {
            PairSide::First => PairSide::Second,
            PairSide::Second => PairSide::First,
        }
    }
}

/// Entity a streak is tracked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Subject {
    Solo { user: UserId },
    Pair { pair: UserPair },
}

impl Subject {
    pub fn solo(user: UserId) -> Self {
        Subject::Solo { user }
    }

    pub fn pair(a: UserId, b: UserId) -> Result<Self, DomainError> {
        Ok(Subject::Pair {
            pair: UserPair::new(a, b)?,
        })
    }

    pub fn kind(&self) -> SubjectKind {
        match self {
            Subject::Solo { .. } => SubjectKind::Solo,
            Subject::Pair { .. } => SubjectKind::Pair,
        }
    }

    pub fn includes(&self, user: UserId) -> bool {
        match self {
            Subject::Solo { user: owner } => *owner == user,
            Subject::Pair { pair } => pair.side_of(user).is_some(),
        }
    }

    /// Stable storage key, e.g. `solo:7` or `pair:3:9`.
    pub fn key(&self) -> String {
        match self {
            Subject::Solo { user } => format!("solo:{user}"),
            Subject::Pair { pair } => format!("pair:{}:{}", pair.first(), pair.second()),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Solo,
    Pair,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::Solo => "solo",
            SubjectKind::Pair => "pair",
        }
    }
}

impl FromStr for SubjectKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solo" => Ok(SubjectKind::Solo),
            "pair" => Ok(SubjectKind::Pair),
            _ => Err(DomainError::DataIntegrity(format!(
                "Unknown subject kind: {s}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_is_canonicalized() {
        let a = UserPair::new(UserId::new(9), UserId::new(3)).unwrap();
        let b = UserPair::new(UserId::new(3), UserId::new(9)).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.first(), UserId::new(3));
        assert_eq!(a.second(), UserId::new(9));
        assert_eq!(Subject::Pair { pair: a }.key(), "pair:3:9");
    }

    #[test]
    fn test_pair_rejects_same_user() {
        assert!(UserPair::new(UserId::new(4), UserId::new(4)).is_err());
    }

    #[test]
    fn test_side_lookup() {
        let pair = UserPair::new(UserId::new(1), UserId::new(2)).unwrap();
        assert_eq!(pair.side_of(UserId::new(1)), Some(PairSide::First));
        assert_eq!(pair.side_of(UserId::new(2)), Some(PairSide::Second));
        assert_eq!(pair.side_of(UserId::new(3)), None);
        assert_eq!(pair.other(UserId::new(2)), Some(UserId::new(1)));
    }

    #[test]
    fn test_subject_includes() {
        let solo = Subject::solo(UserId::new(5));
        assert!(solo.includes(UserId::new(5)));
        assert!(!solo.includes(UserId::new(6)));
        assert_eq!(solo.key(), "solo:5");
        assert_eq!(solo.kind(), SubjectKind::Solo);
    }
}
