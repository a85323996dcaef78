//! API route handlers
//!
//! Organized by resource:
//!
//! - `health`: Health check endpoint
//! - `auth`: Login, token refresh, password reset
//! - `parts`: Part CRUD, field updates, filtered listing, consigner self-view
//! - `consigners`: Consigner CRUD, field updates, detail-with-parts
//! - `invoices`: Billing info and invoice generation
//! - `imports`: CSV bulk import

use crate::error::{ApiError, ValidationErrorDetail};
use serde::Serialize;
use validator::Validate;

pub mod auth;
pub mod consigners;
pub mod health;
pub mod imports;
pub mod invoices;
pub mod parts;

/// Generic acknowledgement body for mutations that return no resource
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Runs `validator` checks on a request payload, mapping failures to the
/// structured validation-error response.
pub(crate) fn validate_payload<T: Validate>(payload: &T) -> Result<(), ApiError> {
    payload.validate().map_err(|e| {
        let errors: Vec<ValidationErrorDetail> = e
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        ApiError::ValidationError(errors)
    })
}
