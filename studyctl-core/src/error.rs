//! Domain error type
//!
//! Library errors are `thiserror` enums; the HTTP layer maps each variant to
//! a status code.

use thiserror::Error;

use crate::models::{AudioId, ProblemId, ValidationError, WorkbookId};
use crate::store::StoreError;
use crate::synthesizer::SynthesizeError;

/// Errors raised by the student and workbook aggregates
#[derive(Error, Debug)]
pub enum DomainError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("workbook '{0}' not found")]
    WorkbookNotFound(WorkbookId),

    #[error("problem '{0}' not found")]
    ProblemNotFound(ProblemId),

    #[error("audio '{0}' not found")]
    AudioNotFound(AudioId),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("quota exceeded: {name} (limit {limit})")]
    QuotaExceeded { name: String, limit: i64 },

    #[error("{resource} version conflict: expected {expected}, current {current}")]
    VersionConflict {
        resource: &'static str,
        expected: i32,
        current: i32,
    },

    #[error("duplicate {resource}: {detail}")]
    Duplicate {
        resource: &'static str,
        detail: String,
    },

    #[error("speech synthesis failed: {0}")]
    Synthesize(#[from] SynthesizeError),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate { resource, detail } => Self::Duplicate { resource, detail },
            other => Self::Store(other),
        }
    }
}

impl DomainError {
    pub fn permission_denied(reason: impl Into<String>) -> Self {
        Self::PermissionDenied(reason.into())
    }
}

/// Result type alias for domain operations
pub type DomainResult<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_store_error_becomes_domain_duplicate() {
        let err: DomainError = StoreError::Duplicate {
            resource: "workbook",
            detail: "name already used".into(),
        }
        .into();
        assert!(matches!(err, DomainError::Duplicate { resource: "workbook", .. }));
    }

    #[test]
    fn backend_store_error_is_wrapped() {
        let err: DomainError = StoreError::backend("connection reset").into();
        assert!(matches!(err, DomainError::Store(_)));
        assert_eq!(err.to_string(), "store error: backend error: connection reset");
    }

    #[test]
    fn validation_display_is_transparent() {
        let err: DomainError = ValidationError::Empty { field: "text" }.into();
        assert_eq!(err.to_string(), "text cannot be empty");
    }
}
