//! Invoice endpoints
//!
//! # Endpoints
//!
//! - `GET /v1/admin/invoice-info` - Read the billing-entity record
//! - `PUT /v1/admin/invoice-info` - Create/replace the billing-entity record
//! - `POST /v1/admin/invoices` - Generate an invoice PDF
//!
//! # Generation
//!
//! The request names part ids, per-part quantities, an invoice-level
//! invoice number with optional per-part overrides, a payment method, an
//! invoice date, and invoice-level shipping/misc fees. Line totals come
//! from the pure computation in `partledger_shared::invoice`; every
//! included part's `invoice_number` is stamped inside one transaction, so
//! either all stamps persist or none do. The response is the rendered PDF
//! as an attachment named by the invoice number.

use std::collections::HashMap;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    render::{render_invoice, InvoiceDocument},
    routes::validate_payload,
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use partledger_shared::fields;
use partledger_shared::invoice::{compute, grand_total};
use partledger_shared::models::invoice_info::{InvoiceInfo, UpsertInvoiceInfo};
use partledger_shared::models::part::Part;
use partledger_shared::models::user::User;
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

/// Upsert request for the billing-entity record
#[derive(Debug, Deserialize, Validate)]
pub struct InvoiceInfoRequest {
    #[validate(length(min = 1, max = 100, message = "Company is required"))]
    pub company: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub phone_number: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

/// Invoice generation request
///
/// `quantities` and `invoice_numbers` are keyed by part id. Fees accept
/// numbers or numeric strings and default to zero.
#[derive(Debug, Deserialize)]
pub struct GenerateInvoiceRequest {
    pub part_ids: Vec<i64>,

    #[serde(default)]
    pub quantities: HashMap<i64, u32>,

    /// Invoice-level number, used for parts without an override
    pub invoice_number: String,

    /// Per-part invoice-number overrides
    #[serde(default)]
    pub invoice_numbers: HashMap<i64, String>,

    pub payment_method: String,

    /// `YYYY-MM-DD`
    pub invoice_date: String,

    pub shipping_fee: Option<Value>,
    pub misc_fee: Option<Value>,
}

/// Read the billing-entity record
pub async fn get_invoice_info(State(state): State<AppState>) -> ApiResult<Json<InvoiceInfo>> {
    let info = InvoiceInfo::get(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invoice info not configured".to_string()))?;

    Ok(Json(info))
}

/// Create or replace the billing-entity record
pub async fn put_invoice_info(
    State(state): State<AppState>,
    Json(req): Json<InvoiceInfoRequest>,
) -> ApiResult<Json<InvoiceInfo>> {
    validate_payload(&req)?;

    let info = InvoiceInfo::upsert(
        &state.db,
        UpsertInvoiceInfo {
            company: req.company,
            email: req.email,
            phone_number: req.phone_number,
            address_line1: req.address_line1,
            address_line2: req.address_line2,
            city: req.city,
            state: req.state,
            zip_code: req.zip_code,
        },
    )
    .await?;

    Ok(Json(info))
}

fn optional_fee(raw: &Option<Value>, name: &str) -> Result<f64, ApiError> {
    match raw {
        Some(value) => fields::decimal(value)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid value for {name}"))),
        None => Ok(0.0),
    }
}

/// Generate an invoice PDF
///
/// # Errors
///
/// - `400 Bad Request`: malformed invoice date or fee values
/// - `404 Not Found`: no parts resolve from the given ids (nothing is
///   mutated in that case)
pub async fn generate_invoice(
    State(state): State<AppState>,
    Json(req): Json<GenerateInvoiceRequest>,
) -> ApiResult<impl IntoResponse> {
    let invoice_date = NaiveDate::parse_from_str(&req.invoice_date, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest("Invalid invoice date format.".to_string()))?;

    let shipping_fee = optional_fee(&req.shipping_fee, "shipping_fee")?;
    let misc_fee = optional_fee(&req.misc_fee, "misc_fee")?;

    // Guard before any query or mutation.
    if req.part_ids.is_empty() {
        return Err(ApiError::NotFound("No parts found".to_string()));
    }

    let parts = Part::find_by_ids(&state.db, &req.part_ids).await?;
    if parts.is_empty() {
        return Err(ApiError::NotFound("No parts found".to_string()));
    }

    // Invoices go to one consigner; the first part picks the account.
    let consigner = User::find_by_id(&state.db, parts[0].user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Consigner not found".to_string()))?;

    let billing = InvoiceInfo::get(&state.db).await?;

    let computation = compute(
        &parts,
        &req.quantities,
        &req.invoice_numbers,
        &req.invoice_number,
    );
    let total = grand_total(computation.subtotal, shipping_fee, misc_fee);

    // Stamp every included part atomically; regeneration overwrites.
    let mut tx = state.db.begin().await?;
    for item in &computation.items {
        Part::stamp_invoice_number(&mut *tx, item.part_id, &item.invoice_number).await?;
    }
    tx.commit().await?;

    let document = InvoiceDocument {
        invoice_number: &req.invoice_number,
        invoice_date,
        payment_method: &req.payment_method,
        billing: billing.as_ref(),
        consigner: &consigner,
        items: &computation.items,
        subtotal: computation.subtotal,
        shipping_fee,
        misc_fee,
        grand_total: total,
    };

    let pdf = render_invoice(&document)
        .map_err(|e| ApiError::InternalError(format!("Failed to render invoice: {e}")))?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"Invoice_{}.pdf\"",
                req.invoice_number
            ),
        ),
    ];

    Ok((StatusCode::OK, headers, pdf))
}
