//! Platform Error Types

use thiserror::Error;

use crate::repository::StoreError;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("{message}")]
    Unauthenticated { message: String },

    #[error("{message}")]
    Forbidden { message: String },

    #[error("{entity_type} not found")]
    NotFound { entity_type: String, id: String },

    #[error("{message}")]
    Validation { message: String },

    /// Uniqueness or state conflict, reported with a workflow-specific message
    #[error("{message}")]
    Conflict { message: String },

    /// The backing service refused the request
    #[error("{message}")]
    Upstream { message: String, client_fault: bool },

    #[error("Service unavailable: {message}")]
    Unavailable { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PlatformError {
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    pub fn not_found(entity_type: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict { message: message.into() }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Map a store failure, turning a unique violation into `conflict_message`
    pub fn from_store_with_conflict(err: StoreError, conflict_message: &str) -> Self {
        match err {
            StoreError::UniqueViolation { .. } => Self::conflict(conflict_message),
            other => other.into(),
        }
    }
}

impl From<StoreError> for PlatformError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { constraint } => Self::Conflict {
                message: format!("Duplicate record ({})", constraint),
            },
            StoreError::Rejected { message, .. } => Self::Upstream {
                message,
                client_fault: true,
            },
            StoreError::Unavailable(message) => Self::Unavailable { message },
            StoreError::Backend(message) => Self::Upstream {
                message,
                client_fault: false,
            },
            StoreError::Decode(message) => Self::Internal { message },
        }
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        let err: PlatformError = StoreError::Rejected {
            code: Some("22P02".to_string()),
            message: "invalid input syntax".to_string(),
        }
        .into();
        assert!(matches!(err, PlatformError::Upstream { client_fault: true, .. }));

        let err: PlatformError = StoreError::Unavailable("timed out".to_string()).into();
        assert!(matches!(err, PlatformError::Unavailable { .. }));

        let err: PlatformError = StoreError::Backend("boom".to_string()).into();
        assert!(matches!(err, PlatformError::Upstream { client_fault: false, .. }));
    }

    #[test]
    fn test_unique_violation_uses_workflow_message() {
        let err = PlatformError::from_store_with_conflict(
            StoreError::UniqueViolation {
                constraint: "saved_jobs_job_id_user_id_key".to_string(),
            },
            "Job already saved",
        );
        assert_eq!(err.to_string(), "Job already saved");

        let err = PlatformError::from_store_with_conflict(
            StoreError::Unavailable("down".to_string()),
            "Job already saved",
        );
        assert!(matches!(err, PlatformError::Unavailable { .. }));
    }

    #[test]
    fn test_not_found_display() {
        assert_eq!(PlatformError::not_found("Job", "abc").to_string(), "Job not found");
    }
}
