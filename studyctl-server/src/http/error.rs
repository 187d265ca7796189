//! API error type with IntoResponse
//!
//! Every error renders as `{"error": <code>, "message": <text>}`. Internal
//! failures are logged and their details withheld from the client.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use studyctl_core::models::ValidationError;
use studyctl_core::DomainError;

use crate::db::AccountError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Malformed path, query or body (400)
    BadRequest { message: String },

    /// Missing, malformed or unknown bearer token (401)
    Unauthorized { reason: &'static str },

    /// Caller may not act on the resource (403)
    Forbidden { reason: String },

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Duplicate or stale write (409)
    Conflict { code: &'static str, message: String },

    /// Quota would be exceeded (429)
    QuotaExceeded { name: String, limit: i64 },

    /// Speech synthesizer failed (502)
    BadGateway { message: String },

    /// Internal error (500, logged)
    Internal { message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::BadRequest { .. } => "bad_request",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Forbidden { .. } => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { code, .. } => *code,
            Self::QuotaExceeded { .. } => "quota_exceeded",
            Self::BadGateway { .. } => "synthesizer_error",
            Self::Internal { .. } => "internal_error",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::BadRequest { message } | Self::Conflict { message, .. } => message.clone(),
            Self::Unauthorized { reason } => (*reason).to_owned(),
            Self::Forbidden { reason } => reason.clone(),
            Self::NotFound { resource, id } => format!("{} '{}' not found", resource, id),
            Self::QuotaExceeded { name, limit } => {
                format!("quota '{}' exceeded (limit {})", name, limit)
            }
            Self::BadGateway { .. } => "speech synthesis failed".to_owned(),
            Self::Internal { .. } => "an internal error occurred".to_owned(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal { message } => tracing::error!("Internal error: {}", message),
            Self::BadGateway { message } => tracing::warn!("Synthesizer error: {}", message),
            _ => {}
        }

        let body = json!({
            "error": self.code(),
            "message": self.message(),
        });
        (self.status(), Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(e) => Self::Validation(e),
            DomainError::WorkbookNotFound(id) => Self::NotFound {
                resource: "workbook",
                id: id.to_string(),
            },
            DomainError::ProblemNotFound(id) => Self::NotFound {
                resource: "problem",
                id: id.to_string(),
            },
            DomainError::AudioNotFound(id) => Self::NotFound {
                resource: "audio",
                id: id.to_string(),
            },
            DomainError::PermissionDenied(reason) => Self::Forbidden { reason },
            DomainError::QuotaExceeded { name, limit } => Self::QuotaExceeded { name, limit },
            e @ DomainError::VersionConflict { .. } => Self::Conflict {
                code: "version_conflict",
                message: e.to_string(),
            },
            e @ DomainError::Duplicate { .. } => Self::Conflict {
                code: "duplicate",
                message: e.to_string(),
            },
            DomainError::Synthesize(e) => Self::BadGateway {
                message: e.to_string(),
            },
            DomainError::Store(e) => Self::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::Validation(e) => Self::Validation(e),
            AccountError::NotFound { resource, id } => Self::NotFound { resource, id },
            e @ AccountError::Duplicate { .. } => Self::Conflict {
                code: "duplicate",
                message: e.to_string(),
            },
            AccountError::Sqlx(e) => Self::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::BadRequest {
            message: e.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(e: PathRejection) -> Self {
        Self::BadRequest {
            message: e.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        Self::BadRequest {
            message: e.body_text(),
        }
    }
}
