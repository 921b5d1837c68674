use microjournal_domain::shared::{DomainError, ErrorCode, ErrorSeverity};
use serde::{Deserialize, Serialize};

/// Error body handed to the HTTP layer.
///
/// `status` follows HTTP semantics so a duplicate post (409) is
/// distinguishable from a server fault (500).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub status: u16,
    /// Numeric error code (2xxx-6xxx range)
    pub code: u16,
    pub message: String,
    pub severity: ErrorSeverity,
    /// Whether the operation can be retried
    pub recoverable: bool,
}

impl ApiError {
    pub fn from_code(error_code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: status_for(error_code),
            code: error_code.code(),
            message: message.into(),
            severity: error_code.severity(),
            recoverable: error_code.is_recoverable(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        Self::from_code(ErrorCode::InfrastructureError, message)
    }

    pub fn is_conflict(&self) -> bool {
        self.status == 409
    }
}

fn status_for(code: ErrorCode) -> u16 {
    match code {
        ErrorCode::DuplicateActivity | ErrorCode::ConcurrentUpdate => 409,
        ErrorCode::UserNotFound => 404,
        ErrorCode::ValidationError
        | ErrorCode::InvalidTimezone
        | ErrorCode::OutOfOrderActivity => 422,
        ErrorCode::TransportError => 502,
        ErrorCode::RepositoryError
        | ErrorCode::DataIntegrityError
        | ErrorCode::SerializationError
        | ErrorCode::InfrastructureError => 500,
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let message = if err.is_conflict() {
            "already posted for this journal date".to_string()
        } else {
            err.message().to_string()
        };
        Self::from_code(err.code(), message)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::infrastructure(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] {}", self.status, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_is_conflict_not_server_error() {
        let err: ApiError = DomainError::DuplicateActivity("user 1 on 2024-01-10".to_string()).into();
        assert_eq!(err.status, 409);
        assert_eq!(err.code, 3002);
        assert_eq!(err.message, "already posted for this journal date");
        assert!(err.is_conflict());
        assert!(!err.recoverable);
    }

    #[test]
    fn test_repository_failure_is_server_error() {
        let err: ApiError = DomainError::Repository("disk I/O error".to_string()).into();
        assert_eq!(err.status, 500);
        assert!(!err.is_conflict());
        assert!(err.recoverable);
        assert_eq!(err.severity, ErrorSeverity::Error);
    }

    #[test]
    fn test_client_errors() {
        let tz: ApiError = DomainError::InvalidTimezone("Mars/Base".to_string()).into();
        assert_eq!(tz.status, 422);
        let missing: ApiError = DomainError::NotFound("User 9".to_string()).into();
        assert_eq!(missing.status, 404);
        assert_eq!(missing.to_string(), "404 [2001] User 9");
    }
}
