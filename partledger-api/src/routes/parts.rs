//! Part endpoints
//!
//! # Endpoints
//!
//! - `GET /v1/admin/parts` - Filtered, paginated listing of unsold parts
//! - `POST /v1/admin/parts` - Create a part
//! - `PUT /v1/admin/parts/:id` - Single-field update (including status)
//! - `DELETE /v1/admin/parts/:id` - Delete a part
//! - `GET /v1/my/parts` - The authenticated consigner's own parts
//!
//! # Listing query parameters
//!
//! `part_number`, `serial`, `description`, `code` are case-insensitive
//! substring filters; `condition` and `date` match exactly. Filters AND
//! together. `page` is 1-indexed (default 1), `page_size` defaults to 40.
//! Sold parts never appear here; they are visible through the
//! consigner-detail endpoint with an explicit status filter.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::MessageResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use partledger_shared::auth::middleware::AuthContext;
use partledger_shared::fields::{self, FieldValue, PART_FIELDS};
use partledger_shared::mailer::part_sold_message;
use partledger_shared::models::part::{
    plan_transition, CreatePart, Part, PartFilter, PartPage, StatusAux,
};
use partledger_shared::models::user::User;
use serde::Deserialize;
use serde_json::Value;

/// Query parameters for the unsold-parts listing
#[derive(Debug, Default, Deserialize)]
pub struct PartListQuery {
    pub part_number: Option<String>,
    pub serial: Option<String>,
    pub description: Option<String>,
    pub condition: Option<String>,
    pub date: Option<String>,
    pub code: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Create-part request
///
/// `price` and the fee fields accept numbers or numeric strings, the way
/// form-driven clients submit them. Supplying both fee modes is rejected:
/// a part carries a commission percentage or a fixed fee, never both.
#[derive(Debug, Deserialize)]
pub struct CreatePartRequest {
    pub part_number: Option<String>,
    pub serial_number: Option<String>,
    pub description: Option<String>,
    pub condition: Option<String>,
    pub notes: Option<String>,

    /// `YYYY-MM-DD`; defaults to today
    pub date_added: Option<String>,

    pub price: Value,
    pub commission_percentage: Option<Value>,
    pub fixed_fee: Option<Value>,

    /// Owning consigner
    pub consigner_id: i64,
}

/// Single-field update request
///
/// The auxiliary fields (`date_sold`, `shipping`, `notes`) are only
/// consulted when `field` is `status` and the requested value is "Sold".
#[derive(Debug, Deserialize)]
pub struct UpdatePartFieldRequest {
    pub field: String,
    pub value: Value,

    #[serde(flatten)]
    pub aux: StatusAux,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Filtered, paginated listing of unsold parts
///
/// # Errors
///
/// - `400 Bad Request`: `date` filter not in `YYYY-MM-DD`
pub async fn list_parts(
    State(state): State<AppState>,
    Query(query): Query<PartListQuery>,
) -> ApiResult<Json<PartPage>> {
    let date = match non_empty(query.date) {
        Some(raw) => Some(
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map_err(|_| ApiError::BadRequest("Invalid date format. Use YYYY-MM-DD.".to_string()))?,
        ),
        None => None,
    };

    let filter = PartFilter {
        part_number: non_empty(query.part_number),
        serial: non_empty(query.serial),
        description: non_empty(query.description),
        condition: non_empty(query.condition),
        date,
        code: non_empty(query.code),
    };

    let page = query.page.unwrap_or(1).max(1);
    let page_size = query.page_size.unwrap_or(40).max(1);

    let result = Part::list_unsold(&state.db, &filter, page, page_size).await?;
    Ok(Json(result))
}

/// Create a part
///
/// # Errors
///
/// - `400 Bad Request`: both fee modes supplied, unparseable numerics, or
///   a malformed `date_added`
/// - `404 Not Found`: unknown consigner
pub async fn create_part(
    State(state): State<AppState>,
    Json(req): Json<CreatePartRequest>,
) -> ApiResult<(StatusCode, Json<Part>)> {
    if req.commission_percentage.is_some() && req.fixed_fee.is_some() {
        return Err(ApiError::BadRequest(
            "Provide only one of commission percentage or fixed fee.".to_string(),
        ));
    }

    let price = fields::decimal(&req.price)
        .ok_or_else(|| ApiError::BadRequest("Invalid value for price".to_string()))?;

    // Zero-valued fees mean "no fee mode", matching the import rules.
    let commission_percentage = req
        .commission_percentage
        .as_ref()
        .map(|raw| {
            fields::decimal(raw).ok_or_else(|| {
                ApiError::BadRequest("Invalid value for commission_percentage".to_string())
            })
        })
        .transpose()?
        .filter(|v| *v != 0.0);

    let fixed_fee = req
        .fixed_fee
        .as_ref()
        .map(|raw| {
            fields::decimal(raw)
                .ok_or_else(|| ApiError::BadRequest("Invalid value for fixed_fee".to_string()))
        })
        .transpose()?
        .filter(|v| *v != 0.0);

    let date_added = match &req.date_added {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| ApiError::BadRequest("Invalid date format. Use YYYY-MM-DD.".to_string()))?,
        None => Utc::now().date_naive(),
    };

    User::find_by_id(&state.db, req.consigner_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Consigner not found".to_string()))?;

    let part = Part::create(
        &state.db,
        CreatePart {
            part_number: non_empty(req.part_number),
            serial_number: non_empty(req.serial_number),
            description: non_empty(req.description),
            notes: req.notes,
            condition: non_empty(req.condition),
            price,
            shipping: None,
            date_added: Some(date_added),
            date_sold: None,
            status: None,
            commission_percentage,
            fixed_fee,
            invoice_number: None,
            user_id: req.consigner_id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(part)))
}

/// Single-field update, including the status transition
///
/// Non-status fields go through the declarative field table: unknown
/// fields, bad coercions, out-of-range commissions, and bad dates are all
/// rejected with nothing written. `status` routes to the transition
/// planner; marking "Sold" also triggers the part-sold notification after
/// the write commits.
///
/// # Errors
///
/// - `400 Bad Request`: field-table rejection or bad status aux values
/// - `404 Not Found`: unknown part
pub async fn update_part_field(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePartFieldRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let part = Part::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Part not found".to_string()))?;

    if req.field == "status" {
        let requested = req
            .value
            .as_str()
            .ok_or_else(|| ApiError::BadRequest("Invalid value for status".to_string()))?;

        let plan = plan_transition(requested, &req.aux, Utc::now().date_naive())?;
        Part::apply_transition(&state.db, id, &plan).await?;

        if plan.notify {
            if let Some(owner) = User::find_by_id(&state.db, part.user_id).await? {
                let (subject, body) = part_sold_message(
                    &owner.code,
                    part.part_number.as_deref(),
                    part.serial_number.as_deref(),
                    part.description.as_deref(),
                    part.condition.as_deref(),
                    part.price,
                );
                let mailer = state.mailer.clone();
                let to = state.config.shop.sales_notify_email.clone();
                tokio::spawn(async move {
                    mailer.send_best_effort(&to, &subject, body).await;
                });
            }
        }
    } else {
        // One active fee mode per part; reject switching without clearing.
        if req.field == "fixed_fee" && part.commission_percentage.is_some() {
            return Err(ApiError::BadRequest(
                "Part already has a commission percentage. Provide only one fee mode.".to_string(),
            ));
        }
        if req.field == "commission_percentage" && part.fixed_fee.is_some() {
            return Err(ApiError::BadRequest(
                "Part already has a fixed fee. Provide only one fee mode.".to_string(),
            ));
        }

        let value: FieldValue = fields::resolve(PART_FIELDS, &req.field, &req.value)?;
        Part::set_field(&state.db, id, &req.field, &value).await?;
    }

    Ok(Json(MessageResponse::new("Part updated successfully.")))
}

/// Delete a part
pub async fn delete_part(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    if !Part::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Part not found".to_string()));
    }

    Ok(Json(MessageResponse::new("Part deleted successfully")))
}

/// The authenticated consigner's own parts, newest first
///
/// Admins have no inventory; they are rejected here and use the admin
/// listings instead.
pub async fn my_parts(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<Part>>> {
    if auth.is_admin {
        return Err(ApiError::Forbidden("Unauthorized".to_string()));
    }

    let parts = Part::list_by_user(&state.db, auth.user_id, None).await?;
    Ok(Json(parts))
}
