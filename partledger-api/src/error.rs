//! Error handling for the API server
//!
//! One unified error type that maps to HTTP responses. Handlers return
//! `Result<T, ApiError>`, which converts to structured JSON with the right
//! status code.
//!
//! # Taxonomy
//!
//! - Validation errors (bad field name, bad coercion, out-of-range value,
//!   bad date format) → 400/422, no mutation applied
//! - Uniqueness conflicts (duplicate email/code) → 409
//! - Not-found (unknown part/consigner id) → 404
//! - Auth failures → 401/403
//! - Everything else → 500 with details kept out of the response
//!
//! Email delivery failure is deliberately NOT here: it is logged and
//! swallowed at the mailer, never surfaced as a request failure.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use partledger_shared::auth::jwt::JwtError;
use partledger_shared::auth::password::PasswordError;
use partledger_shared::fields::FieldError;
use partledger_shared::import::ImportError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - duplicate email/code
    Conflict(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "conflict")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                // Unique constraint violations surface as conflicts
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") {
                        return ApiError::Conflict("Email already exists".to_string());
                    }
                    if constraint.contains("code") {
                        return ApiError::Conflict("Code already exists".to_string());
                    }
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert field-update errors to API errors
///
/// Everything in the field taxonomy is caller error; nothing was written.
impl From<FieldError> for ApiError {
    fn from(err: FieldError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert import errors to API errors
///
/// A malformed CSV document is the caller's problem; database and hashing
/// failures are ours.
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Csv(e) => ApiError::BadRequest(format!("CSV parse error: {}", e)),
            ImportError::Db(e) => e.into(),
            ImportError::Password(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Part not found".to_string());
        assert_eq!(err.to_string(), "Not found: Part not found");
    }

    #[test]
    fn test_field_errors_are_bad_requests() {
        let err: ApiError = FieldError::UnknownField("color".to_string()).into();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err: ApiError = FieldError::OutOfRange {
            field: "commission_percentage".to_string(),
            min: 0.0,
            max: 100.0,
        }
        .into();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
