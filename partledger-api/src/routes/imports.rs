//! CSV bulk-import endpoints
//!
//! # Endpoints
//!
//! - `POST /v1/admin/import/parts` - Import parts from a CSV document
//! - `POST /v1/admin/import/consigners` - Import consigners from a CSV
//!   document
//!
//! The request body is the raw CSV text (header-driven). Per-cell data
//! problems degrade per the normalization rules; only rows missing
//! identity fields are skipped, and the response reports both counts.
//!
//! # Example
//!
//! ```text
//! POST /v1/admin/import/parts
//! Content-Type: text/csv
//!
//! part_number,serial_number,description,...,user_id,status
//! PN-1,SN-1,Altimeter,...,3,Unsold
//! ```
//!
//! Response:
//!
//! ```json
//! { "imported": 124, "skipped": 2 }
//! ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use partledger_shared::import::{self, ImportSummary};

/// Import parts from a CSV document
pub async fn import_parts(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<Json<ImportSummary>> {
    let summary = import::parts::import_parts(&state.db, &body).await?;
    Ok(Json(summary))
}

/// Import consigners from a CSV document
pub async fn import_consigners(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<Json<ImportSummary>> {
    let summary = import::users::import_users(&state.db, &body).await?;
    Ok(Json(summary))
}
