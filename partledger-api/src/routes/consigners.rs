//! Consigner endpoints
//!
//! # Endpoints
//!
//! - `GET /v1/admin/consigners` - Filtered listing of consigners
//! - `POST /v1/admin/consigners` - Create a consigner (sends welcome email)
//! - `PUT /v1/admin/consigners/:id` - Single-field update
//! - `DELETE /v1/admin/consigners/:id` - Delete consigner and their parts
//! - `GET /v1/admin/consigners/:id/parts` - Consigner detail with parts
//!
//! The detail endpoint is the one place sold parts are visible, via its
//! optional exact `status` query filter.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{validate_payload, MessageResponse},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use partledger_shared::auth::password::hash_password;
use partledger_shared::fields::{self, FieldValue, CONSIGNER_FIELDS};
use partledger_shared::mailer::welcome_message;
use partledger_shared::models::part::Part;
use partledger_shared::models::user::{ConsignerFilter, CreateUser, User};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Query parameters for the consigner listing
#[derive(Debug, Default, Deserialize)]
pub struct ConsignerListQuery {
    /// Case-insensitive substring match on the display name
    pub name: Option<String>,

    /// Case-insensitive substring match on the consigner code
    pub code: Option<String>,

    /// Exact match on the creation date, `YYYY-MM-DD`
    pub date: Option<String>,
}

/// Create-consigner request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateConsignerRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, max = 6, message = "Code must be 1-6 characters"))]
    pub code: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Temporary password; the welcome email tells the consigner to reset it
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// `YYYY-MM-DD`; defaults to now
    pub created_at: Option<String>,

    pub phone_number: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

/// Single-field update request
#[derive(Debug, Deserialize)]
pub struct UpdateConsignerFieldRequest {
    pub field: String,
    pub value: Value,
}

/// Status filter for the consigner-detail endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ConsignerPartsQuery {
    /// Exact status match, e.g. "Sold" or "Unsold"; omitted means all
    pub status: Option<String>,
}

/// Consigner detail plus their parts
#[derive(Debug, Serialize)]
pub struct ConsignerPartsResponse {
    pub consigner: User,
    pub parts: Vec<Part>,
}

/// Filtered listing of consigners, newest first
pub async fn list_consigners(
    State(state): State<AppState>,
    Query(query): Query<ConsignerListQuery>,
) -> ApiResult<Json<Vec<User>>> {
    let date = match query.date.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            ApiError::BadRequest("Invalid date format. Use YYYY-MM-DD.".to_string())
        })?),
        None => None,
    };

    let filter = ConsignerFilter {
        name: query.name.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()),
        code: query.code.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()),
        date,
    };

    let consigners = User::list_consigners(&state.db, &filter).await?;
    Ok(Json(consigners))
}

/// Create a consigner
///
/// Uniqueness of email and code is checked up front; the welcome email is
/// sent best-effort after the account exists and never fails the request.
///
/// # Errors
///
/// - `409 Conflict`: email or code already in use
/// - `422 Unprocessable Entity`: validation failed
pub async fn create_consigner(
    State(state): State<AppState>,
    Json(req): Json<CreateConsignerRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    validate_payload(&req)?;

    if User::email_in_use(&state.db, &req.email, None).await? {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }
    if User::code_in_use(&state.db, &req.code, None).await? {
        return Err(ApiError::Conflict("Code already exists".to_string()));
    }

    let created_at = match &req.created_at {
        Some(raw) => {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                ApiError::BadRequest("Invalid date format. Use YYYY-MM-DD.".to_string())
            })?;
            Some(chrono::DateTime::from_naive_utc_and_offset(
                date.and_time(chrono::NaiveTime::MIN),
                chrono::Utc,
            ))
        }
        None => None,
    };

    let password_hash = hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            code: req.code,
            email: req.email,
            password_hash,
            is_admin: false,
            created_at,
            phone_number: req.phone_number,
            address_line1: req.address_line1,
            address_line2: req.address_line2,
            city: req.city,
            state: req.state,
            zip_code: req.zip_code,
        },
    )
    .await?;

    let (subject, body) = welcome_message(
        &state.config.shop.name,
        &user.name,
        &user.email,
        &state.config.shop.base_url,
    );
    let mailer = state.mailer.clone();
    let to = user.email.clone();
    tokio::spawn(async move {
        mailer.send_best_effort(&to, &subject, body).await;
    });

    Ok((StatusCode::CREATED, Json(user)))
}

/// Consigner detail with all their parts
///
/// Optional exact `status` filter; this is where sold parts show up.
pub async fn consigner_parts(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<ConsignerPartsQuery>,
) -> ApiResult<Json<ConsignerPartsResponse>> {
    let consigner = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Consigner not found".to_string()))?;

    let status = query.status.as_deref().map(str::trim).filter(|v| !v.is_empty());
    let parts = Part::list_by_user(&state.db, id, status).await?;

    Ok(Json(ConsignerPartsResponse { consigner, parts }))
}

/// Single-field update on a consigner
///
/// Email and code changes are uniqueness-checked against all other users
/// before anything is written.
///
/// # Errors
///
/// - `400 Bad Request`: unknown field or bad coercion
/// - `404 Not Found`: unknown consigner
/// - `409 Conflict`: email or code already in use by another user
pub async fn update_consigner_field(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateConsignerFieldRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let value: FieldValue = fields::resolve(CONSIGNER_FIELDS, &req.field, &req.value)?;

    User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Consigner not found".to_string()))?;

    if let FieldValue::Text(ref text) = value {
        if req.field == "email" && User::email_in_use(&state.db, text, Some(id)).await? {
            return Err(ApiError::Conflict(
                "This email is already in use.".to_string(),
            ));
        }
        if req.field == "code" && User::code_in_use(&state.db, text, Some(id)).await? {
            return Err(ApiError::Conflict(
                "This code is already in use.".to_string(),
            ));
        }
    }

    User::set_field(&state.db, id, &req.field, &value).await?;

    Ok(Json(MessageResponse::new(format!(
        "{} updated successfully",
        req.field
    ))))
}

/// Delete a consigner and, via the schema cascade, their parts
pub async fn delete_consigner(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    if !User::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Consigner not found".to_string()));
    }

    Ok(Json(MessageResponse::new(
        "Consigner and associated parts deleted.",
    )))
}
