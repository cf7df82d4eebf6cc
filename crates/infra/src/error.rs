//! Application error taxonomy shared by the ledger and workflows.

use thiserror::Error;

use laundry_core::DomainError;

use crate::store::StoreError;

/// Failure of a ledger or workflow operation.
///
/// Domain and store errors are folded into one set of outcomes that the API
/// maps to HTTP statuses in a single place.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A version check failed; the operation may be retried from a fresh read.
    #[error("concurrent modification: {0}")]
    Concurrency(String),

    /// Storage or serialization failure. Details are for logs, not callers.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WorkflowError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

impl From<DomainError> for WorkflowError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => WorkflowError::Validation(msg),
            DomainError::NotFound(msg) => WorkflowError::NotFound(msg),
            DomainError::Conflict(msg) => WorkflowError::Conflict(msg),
            DomainError::InvalidState(msg) => WorkflowError::InvalidState(msg),
        }
    }
}

impl From<StoreError> for WorkflowError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Concurrency(msg) => WorkflowError::Concurrency(msg),
            StoreError::Duplicate(msg) => WorkflowError::Conflict(msg),
            // The document vanished between read and write.
            StoreError::Missing(msg) => WorkflowError::NotFound(msg),
            StoreError::Serialization(msg) | StoreError::Backend(msg) => WorkflowError::Internal(msg),
        }
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_id_is_a_validation_failure() {
        let err: WorkflowError = DomainError::invalid_id("UserId: bad").into();
        assert_eq!(err, WorkflowError::Validation("UserId: bad".to_string()));
    }

    #[test]
    fn store_errors_map_to_application_outcomes() {
        assert!(matches!(
            WorkflowError::from(StoreError::Duplicate("x".into())),
            WorkflowError::Conflict(_)
        ));
        assert!(matches!(
            WorkflowError::from(StoreError::Concurrency("x".into())),
            WorkflowError::Concurrency(_)
        ));
        assert!(matches!(
            WorkflowError::from(StoreError::Backend("x".into())),
            WorkflowError::Internal(_)
        ));
    }
}
