use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn from_string(s: &str) -> Self {
                Self(s.to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// Integer ids assigned by the relational store.
macro_rules! define_row_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub fn new(value: i64) -> Self {
                Self(value)
            }

            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(DispatchJobId);
define_row_id!(UserId);
define_row_id!(ActivityId);

/// Error codes for structured error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Resource Not Found (2xxx)
    UserNotFound = 2001,

    // Business Logic (3xxx)
    InvalidTimezone = 3001,
    DuplicateActivity = 3002,
    OutOfOrderActivity = 3003,
    ConcurrentUpdate = 3004,

    // Data & Persistence (4xxx)
    RepositoryError = 4001,
    DataIntegrityError = 4002,
    SerializationError = 4003,

    // Infrastructure (5xxx)
    InfrastructureError = 5001,
    TransportError = 5002,

    // Validation (6xxx)
    ValidationError = 6001,
}

impl ErrorCode {
    /// Get error code as integer
    pub fn code(&self) -> u16 {
        *self as u16
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ErrorCode::UserNotFound
            | ErrorCode::DuplicateActivity
            | ErrorCode::ValidationError => ErrorSeverity::Info,

            ErrorCode::InvalidTimezone
            | ErrorCode::OutOfOrderActivity
            | ErrorCode::ConcurrentUpdate
            | ErrorCode::TransportError => ErrorSeverity::Warning,

            ErrorCode::RepositoryError
            | ErrorCode::DataIntegrityError
            | ErrorCode::SerializationError
            | ErrorCode::InfrastructureError => ErrorSeverity::Error,
        }
    }

    /// Check if retrying the same operation later can succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ErrorCode::ConcurrentUpdate
                | ErrorCode::RepositoryError
                | ErrorCode::InfrastructureError
                | ErrorCode::TransportError
        )
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Already posted for this journal date: {0}")]
    DuplicateActivity(String),

    #[error("Out-of-order activity: {0}")]
    OutOfOrderActivity(String),

    #[error("Concurrent update: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),

    #[error("Push transport error: {0}")]
    Transport(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl DomainError {
    pub fn code(&self) -> ErrorCode {
        match self {
            DomainError::InvalidTimezone(_) => ErrorCode::InvalidTimezone,
            DomainError::DuplicateActivity(_) => ErrorCode::DuplicateActivity,
            DomainError::OutOfOrderActivity(_) => ErrorCode::OutOfOrderActivity,
            DomainError::Conflict(_) => ErrorCode::ConcurrentUpdate,
            DomainError::NotFound(_) => ErrorCode::UserNotFound,
            DomainError::Repository(_) => ErrorCode::RepositoryError,
            DomainError::DataIntegrity(_) => ErrorCode::DataIntegrityError,
            DomainError::Serialization(_) => ErrorCode::SerializationError,
            DomainError::Infrastructure(_) => ErrorCode::InfrastructureError,
            DomainError::Transport(_) => ErrorCode::TransportError,
            DomainError::Validation(_) => ErrorCode::ValidationError,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            DomainError::InvalidTimezone(msg)
            | DomainError::DuplicateActivity(msg)
            | DomainError::OutOfOrderActivity(msg)
            | DomainError::Conflict(msg)
            | DomainError::NotFound(msg)
            | DomainError::Repository(msg)
            | DomainError::DataIntegrity(msg)
            | DomainError::Serialization(msg)
            | DomainError::Infrastructure(msg)
            | DomainError::Transport(msg)
            | DomainError::Validation(msg) => msg,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.code().severity()
    }

    pub fn is_recoverable(&self) -> bool {
        self.code().is_recoverable()
    }

    /// Duplicate submissions are reported to clients as a conflict, not a server fault.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DomainError::DuplicateActivity(_))
    }

    /// Format error with code
    pub fn format_with_code(&self) -> String {
        format!("[{}] {}", self.code().code(), self)
    }
}
