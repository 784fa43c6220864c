//! # API Error Types
//!
//! The HTTP boundary of the error taxonomy.
//!
//! ## Error Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    DbError → ApiError → HTTP                            │
//! │                                                                         │
//! │  NotFound                → 404  {"success": false, "error": "..."}     │
//! │  UniqueViolation         → 409  (conflict)                              │
//! │  InvalidState            → 409  (closed session, voided sale, ...)     │
//! │  InsufficientStock       → 409  (over-deduction rejected)               │
//! │  ForeignKeyViolation     → 409                                          │
//! │  ValidationError         → 400                                          │
//! │  everything else         → 500  (detail gated by dev flag)              │
//! │                                                                         │
//! │  Success responses are the plain resource JSON; only failures get       │
//! │  the envelope.                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::error;

use verdant_core::{CoreError, ValidationError};
use verdant_db::DbError;

/// Whether 5xx responses carry the underlying error detail.
/// Set once at startup from config; default is the safe choice.
static EXPOSE_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(false);

/// Enables internal error detail in 5xx responses (development only).
pub fn set_expose_internal_errors(expose: bool) {
    EXPOSE_INTERNAL_ERRORS.store(expose, Ordering::Relaxed);
}

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Requested resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Request conflicts with current state (duplicate, constraint).
    #[error("{0}")]
    Conflict(String),

    /// Entity exists but its state forbids the operation.
    #[error("{0}")]
    InvalidState(String),

    /// Deduction rejected: it would take stock below zero.
    #[error("{0}")]
    InsufficientStock(String),

    /// Request input failed validation.
    #[error("{0}")]
    Validation(String),

    /// Storage layer failure; detail is logged, response is generic unless
    /// the dev flag says otherwise.
    #[error("{0}")]
    Storage(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_)
            | ApiError::InvalidState(_)
            | ApiError::InsufficientStock(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            ApiError::Storage(detail) => {
                error!(detail = %detail, "Storage failure");
                if EXPOSE_INTERNAL_ERRORS.load(Ordering::Relaxed) {
                    detail.clone()
                } else {
                    "internal storage error".to_string()
                }
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "success": false,
            "error": message,
        }));

        (status, body).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                ApiError::Conflict(err.to_string())
            }
            DbError::InvalidState { .. } => ApiError::InvalidState(err.to_string()),
            DbError::InsufficientStock { .. } => ApiError::InsufficientStock(err.to_string()),
            other => ApiError::Storage(other.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            // A typo'd movement type must surface as a state problem, not
            // fall through to some arbitrary class.
            CoreError::UnknownMovementType(_) => ApiError::InvalidState(err.to_string()),
            CoreError::InsufficientStock { .. } => ApiError::InsufficientStock(err.to_string()),
            CoreError::InvalidSessionState { .. } => ApiError::InvalidState(err.to_string()),
            other => ApiError::Validation(other.to_string()),
        }
    }
}

/// Result type for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::InsufficientStock("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Storage("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_db_error_mapping() {
        let err: ApiError = DbError::not_found("Session", "s1").into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err: ApiError = DbError::invalid_state("Session", "s1", "closed").into();
        assert!(matches!(err, ApiError::InvalidState(_)));

        let err: ApiError = DbError::InsufficientStock {
            inventory_id: "inv-1".into(),
            available: 2,
            requested: 5,
        }
        .into();
        assert!(matches!(err, ApiError::InsufficientStock(_)));

        let err: ApiError = DbError::QueryFailed("boom".into()).into();
        assert!(matches!(err, ApiError::Storage(_)));
    }

    #[test]
    fn test_unknown_movement_type_is_invalid_state() {
        let err: ApiError = CoreError::UnknownMovementType("restock".into()).into();
        assert!(matches!(err, ApiError::InvalidState(_)));
    }
}
