//! Part model and database operations
//!
//! A part is a single consigned item owned by exactly one consigner. Parts
//! are created by admins or bulk import, mutated through single-field
//! updates and the status transition planner, and stamped with an invoice
//! number when they appear on a generated invoice.
//!
//! # State Machine
//!
//! ```text
//! Unsold → Sold     sets date_sold (supplied or today), optionally
//!                   shipping/notes, and triggers the part-sold notification
//! Sold   → Unsold   clears date_sold, shipping, and invoice_number
//! ```
//!
//! Any other requested status token is stored verbatim with no side
//! effects; the column is plain TEXT because the legacy data layer never
//! enforced the enum.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE parts (
//!     id BIGSERIAL PRIMARY KEY,
//!     part_number VARCHAR(50),
//!     serial_number VARCHAR(50),
//!     description VARCHAR(255),
//!     notes TEXT,
//!     condition VARCHAR(20),
//!     price DOUBLE PRECISION NOT NULL DEFAULT 0,
//!     shipping DOUBLE PRECISION,
//!     date_added DATE,
//!     date_sold DATE,
//!     status TEXT NOT NULL DEFAULT 'Unsold',
//!     commission_percentage DOUBLE PRECISION,
//!     fixed_fee DOUBLE PRECISION,
//!     invoice_number VARCHAR(50),
//!     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE
//! );
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{PgExecutor, PgPool};

use crate::fields::{self, FieldError, FieldValue};

/// All part columns, in the order the struct declares them.
const PART_COLUMNS: &str = "id, part_number, serial_number, description, notes, condition, \
     price, shipping, date_added, date_sold, status, commission_percentage, fixed_fee, \
     invoice_number, user_id";

/// The two business statuses of a part
///
/// The schema does not restrict the column to these values; business logic
/// only ever produces these two, but imports may carry other tokens
/// through, so the model field stays a `String` and this enum classifies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartStatus {
    Sold,
    Unsold,
}

impl PartStatus {
    /// Parses the exact business tokens; anything else is a pass-through
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Sold" => Some(PartStatus::Sold),
            "Unsold" => Some(PartStatus::Unsold),
            _ => None,
        }
    }

    /// String form stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            PartStatus::Sold => "Sold",
            PartStatus::Unsold => "Unsold",
        }
    }
}

/// Part model representing a consigned item
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Part {
    /// Unique part ID
    pub id: i64,

    /// Manufacturer part number
    pub part_number: Option<String>,

    /// Serial number
    pub serial_number: Option<String>,

    /// Short description shown on listings and invoices
    pub description: Option<String>,

    /// Free-form notes
    pub notes: Option<String>,

    /// Condition code (e.g. "AR", "SV"), may be the literal "N/A"
    pub condition: Option<String>,

    /// Asking price; 0 when unknown
    pub price: f64,

    /// Per-part shipping cost deducted from proceeds
    pub shipping: Option<f64>,

    /// When the part entered the shop
    pub date_added: Option<NaiveDate>,

    /// When the part sold (null while unsold)
    pub date_sold: Option<NaiveDate>,

    /// "Sold" or "Unsold" in practice; see [`PartStatus`]
    pub status: String,

    /// Proportional fee (0-100), mutually exclusive with `fixed_fee`
    pub commission_percentage: Option<f64>,

    /// Flat per-unit fee, mutually exclusive with `commission_percentage`
    pub fixed_fee: Option<f64>,

    /// Invoice reference stamped at generation time
    pub invoice_number: Option<String>,

    /// Owning consigner
    pub user_id: i64,
}

/// Input for creating a new part
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePart {
    pub part_number: Option<String>,
    pub serial_number: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub condition: Option<String>,
    pub price: f64,
    pub shipping: Option<f64>,
    pub date_added: Option<NaiveDate>,
    pub date_sold: Option<NaiveDate>,

    /// Initial status; `None` lets the column default to "Unsold"
    pub status: Option<String>,

    pub commission_percentage: Option<f64>,
    pub fixed_fee: Option<f64>,
    pub invoice_number: Option<String>,
    pub user_id: i64,
}

/// Filters for the unsold-parts listing
///
/// All filters are optional and AND together. Substring filters are
/// case-insensitive; `condition` and `date` match exactly.
#[derive(Debug, Clone, Default)]
pub struct PartFilter {
    pub part_number: Option<String>,
    pub serial: Option<String>,
    pub description: Option<String>,
    pub condition: Option<String>,
    pub date: Option<NaiveDate>,
    pub code: Option<String>,
}

impl PartFilter {
    /// Builds the WHERE clause shared by the page and count queries
    ///
    /// Returns the SQL and the number of bind parameters it references;
    /// callers must apply binds in declaration order (part_number, serial,
    /// description, condition, date, code).
    fn where_sql(&self) -> (String, usize) {
        let mut sql = String::from("WHERE p.status = 'Unsold'");
        let mut n = 0;

        if self.part_number.is_some() {
            n += 1;
            sql.push_str(&format!(" AND p.part_number ILIKE ${}", n));
        }
        if self.serial.is_some() {
            n += 1;
            sql.push_str(&format!(" AND p.serial_number ILIKE ${}", n));
        }
        if self.description.is_some() {
            n += 1;
            sql.push_str(&format!(" AND p.description ILIKE ${}", n));
        }
        if self.condition.is_some() {
            n += 1;
            sql.push_str(&format!(" AND p.condition = ${}", n));
        }
        if self.date.is_some() {
            n += 1;
            sql.push_str(&format!(" AND p.date_added = ${}", n));
        }
        if self.code.is_some() {
            n += 1;
            sql.push_str(&format!(" AND u.code ILIKE ${}", n));
        }

        (sql, n)
    }
}

/// One row of the unsold-parts listing, annotated with the consigner code
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PartListRow {
    pub id: i64,
    pub part_number: Option<String>,
    pub serial_number: Option<String>,
    pub description: Option<String>,
    pub condition: Option<String>,
    pub date_added: Option<NaiveDate>,
    pub price: f64,
    pub notes: Option<String>,
    pub consigner_code: String,
}

/// A page of the unsold-parts listing plus the unpaginated total
#[derive(Debug, Clone, Serialize)]
pub struct PartPage {
    pub parts: Vec<PartListRow>,
    pub total: i64,
}

/// Auxiliary inputs accompanying a status update request
///
/// Only consulted when the requested status is "Sold".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusAux {
    /// Sale date as `YYYY-MM-DD`; defaults to today when omitted
    pub date_sold: Option<String>,

    /// Shipping cost; number or numeric string
    pub shipping: Option<Value>,

    /// Replacement notes, taken verbatim
    pub notes: Option<String>,
}

/// Planned effects of a status update
///
/// The outer `Option` on `date_sold`/`shipping` means "touch this column";
/// the inner value is what to write (`None` = SQL NULL). Computed by
/// [`plan_transition`], applied by [`Part::apply_transition`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPlan {
    /// Status token to store
    pub status: String,

    pub date_sold: Option<Option<NaiveDate>>,
    pub shipping: Option<Option<f64>>,
    pub notes: Option<String>,
    pub clear_invoice_number: bool,

    /// Whether the part-sold notification should go out after commit
    pub notify: bool,
}

/// Computes the effects of a requested status change
///
/// This is the explicit transition table: marking "Sold" derives the sale
/// date (supplied or `today`), optionally updates shipping and notes, and
/// flags the notification; marking "Unsold" clears the sale-related
/// columns; any other token is stored as given with no side effects.
///
/// # Errors
///
/// A malformed `date_sold` or unparseable `shipping` fails the whole
/// operation; no partial plan is produced.
pub fn plan_transition(
    requested: &str,
    aux: &StatusAux,
    today: NaiveDate,
) -> Result<TransitionPlan, FieldError> {
    match PartStatus::parse(requested) {
        Some(PartStatus::Sold) => {
            let date_sold = match &aux.date_sold {
                Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| FieldError::InvalidDate("date_sold".to_string()))?,
                None => today,
            };

            let shipping = match &aux.shipping {
                Some(raw) => Some(Some(
                    fields::decimal(raw)
                        .ok_or_else(|| FieldError::InvalidValue("shipping".to_string()))?,
                )),
                None => None,
            };

            Ok(TransitionPlan {
                status: PartStatus::Sold.as_str().to_string(),
                date_sold: Some(Some(date_sold)),
                shipping,
                notes: aux.notes.clone(),
                clear_invoice_number: false,
                notify: true,
            })
        }
        Some(PartStatus::Unsold) => Ok(TransitionPlan {
            status: PartStatus::Unsold.as_str().to_string(),
            date_sold: Some(None),
            shipping: Some(None),
            notes: None,
            clear_invoice_number: true,
            notify: false,
        }),
        None => Ok(TransitionPlan {
            status: requested.to_string(),
            date_sold: None,
            shipping: None,
            notes: None,
            clear_invoice_number: false,
            notify: false,
        }),
    }
}

impl Part {
    /// Creates a new part
    pub async fn create(pool: &PgPool, data: CreatePart) -> Result<Self, sqlx::Error> {
        let part = sqlx::query_as::<_, Part>(&format!(
            r#"
            INSERT INTO parts (part_number, serial_number, description, notes, condition,
                               price, shipping, date_added, date_sold, status,
                               commission_percentage, fixed_fee, invoice_number, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, COALESCE($10, 'Unsold'),
                    $11, $12, $13, $14)
            RETURNING {PART_COLUMNS}
            "#
        ))
        .bind(data.part_number)
        .bind(data.serial_number)
        .bind(data.description)
        .bind(data.notes)
        .bind(data.condition)
        .bind(data.price)
        .bind(data.shipping)
        .bind(data.date_added)
        .bind(data.date_sold)
        .bind(data.status)
        .bind(data.commission_percentage)
        .bind(data.fixed_fee)
        .bind(data.invoice_number)
        .bind(data.user_id)
        .fetch_one(pool)
        .await?;

        Ok(part)
    }

    /// Finds a part by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Part>(&format!(
            "SELECT {PART_COLUMNS} FROM parts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds all parts whose id is in `ids`
    ///
    /// Unknown ids are simply absent from the result; callers that require
    /// all ids to resolve must check the returned length.
    pub async fn find_by_ids(pool: &PgPool, ids: &[i64]) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Part>(&format!(
            "SELECT {PART_COLUMNS} FROM parts WHERE id = ANY($1) ORDER BY id"
        ))
        .bind(ids)
        .fetch_all(pool)
        .await
    }

    /// Lists a consigner's parts, newest first, optionally by exact status
    ///
    /// This is the one listing where sold parts are visible.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: i64,
        status: Option<&str>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        match status {
            Some(status) => {
                sqlx::query_as::<_, Part>(&format!(
                    "SELECT {PART_COLUMNS} FROM parts \
                     WHERE user_id = $1 AND status = $2 ORDER BY date_added DESC NULLS LAST"
                ))
                .bind(user_id)
                .bind(status)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Part>(&format!(
                    "SELECT {PART_COLUMNS} FROM parts \
                     WHERE user_id = $1 ORDER BY date_added DESC NULLS LAST"
                ))
                .bind(user_id)
                .fetch_all(pool)
                .await
            }
        }
    }

    /// Paginated, filtered listing of unsold parts
    ///
    /// Pages are 1-indexed; `offset = (page - 1) * page_size`. The total
    /// counts every row matching the filters, not just the current page.
    /// Sold parts never appear here.
    pub async fn list_unsold(
        pool: &PgPool,
        filter: &PartFilter,
        page: i64,
        page_size: i64,
    ) -> Result<PartPage, sqlx::Error> {
        let (where_sql, bind_count) = filter.where_sql();

        let count_sql = format!(
            "SELECT COUNT(*) FROM parts p JOIN users u ON u.id = p.user_id {where_sql}"
        );
        let page_sql = format!(
            "SELECT p.id, p.part_number, p.serial_number, p.description, p.condition, \
                    p.date_added, p.price, p.notes, u.code AS consigner_code \
             FROM parts p JOIN users u ON u.id = p.user_id {where_sql} \
             ORDER BY p.date_added DESC NULLS LAST, p.id DESC \
             LIMIT ${} OFFSET ${}",
            bind_count + 1,
            bind_count + 2,
        );

        let part_number = filter.part_number.as_ref().map(|v| format!("%{}%", v));
        let serial = filter.serial.as_ref().map(|v| format!("%{}%", v));
        let description = filter.description.as_ref().map(|v| format!("%{}%", v));
        let code = filter.code.as_ref().map(|v| format!("%{}%", v));

        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(ref v) = part_number {
            count_q = count_q.bind(v);
        }
        if let Some(ref v) = serial {
            count_q = count_q.bind(v);
        }
        if let Some(ref v) = description {
            count_q = count_q.bind(v);
        }
        if let Some(ref v) = filter.condition {
            count_q = count_q.bind(v);
        }
        if let Some(v) = filter.date {
            count_q = count_q.bind(v);
        }
        if let Some(ref v) = code {
            count_q = count_q.bind(v);
        }
        let total = count_q.fetch_one(pool).await?;

        let offset = (page - 1).max(0) * page_size;
        let mut page_q = sqlx::query_as::<_, PartListRow>(&page_sql);
        if let Some(ref v) = part_number {
            page_q = page_q.bind(v);
        }
        if let Some(ref v) = serial {
            page_q = page_q.bind(v);
        }
        if let Some(ref v) = description {
            page_q = page_q.bind(v);
        }
        if let Some(ref v) = filter.condition {
            page_q = page_q.bind(v);
        }
        if let Some(v) = filter.date {
            page_q = page_q.bind(v);
        }
        if let Some(ref v) = code {
            page_q = page_q.bind(v);
        }
        let parts = page_q.bind(page_size).bind(offset).fetch_all(pool).await?;

        Ok(PartPage { parts, total })
    }

    /// Applies a single coerced field value
    ///
    /// The field name comes from [`crate::fields::PART_FIELDS`], never from
    /// raw request input, so interpolating it into the statement is safe.
    ///
    /// # Returns
    ///
    /// True if a row was updated, false if the part does not exist.
    pub async fn set_field(
        pool: &PgPool,
        id: i64,
        field: &str,
        value: &FieldValue,
    ) -> Result<bool, sqlx::Error> {
        let query = format!("UPDATE parts SET {} = $2 WHERE id = $1", field);

        let result = match value {
            FieldValue::Text(s) => sqlx::query(&query).bind(id).bind(s).execute(pool).await?,
            FieldValue::Decimal(n) => sqlx::query(&query).bind(id).bind(n).execute(pool).await?,
            FieldValue::Date(d) => sqlx::query(&query).bind(id).bind(d).execute(pool).await?,
        };

        Ok(result.rows_affected() > 0)
    }

    /// Applies a computed [`TransitionPlan`] in one statement
    ///
    /// # Returns
    ///
    /// True if a row was updated, false if the part does not exist.
    pub async fn apply_transition(
        pool: &PgPool,
        id: i64,
        plan: &TransitionPlan,
    ) -> Result<bool, sqlx::Error> {
        let mut query = String::from("UPDATE parts SET status = $2");
        let mut bind_count = 2;

        if plan.date_sold.is_some() {
            bind_count += 1;
            query.push_str(&format!(", date_sold = ${}", bind_count));
        }
        if plan.shipping.is_some() {
            bind_count += 1;
            query.push_str(&format!(", shipping = ${}", bind_count));
        }
        if plan.notes.is_some() {
            bind_count += 1;
            query.push_str(&format!(", notes = ${}", bind_count));
        }
        if plan.clear_invoice_number {
            query.push_str(", invoice_number = NULL");
        }

        query.push_str(" WHERE id = $1");

        let mut q = sqlx::query(&query).bind(id).bind(&plan.status);
        if let Some(date_sold) = plan.date_sold {
            q = q.bind(date_sold);
        }
        if let Some(shipping) = plan.shipping {
            q = q.bind(shipping);
        }
        if let Some(ref notes) = plan.notes {
            q = q.bind(notes);
        }

        let result = q.execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Stamps a part's invoice number
    ///
    /// Invoice generation calls this for every included part inside one
    /// transaction, so accepts any Postgres executor. Regeneration
    /// overwrites any earlier stamp.
    pub async fn stamp_invoice_number(
        executor: impl PgExecutor<'_>,
        id: i64,
        invoice_number: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE parts SET invoice_number = $2 WHERE id = $1")
            .bind(id)
            .bind(invoice_number)
            .execute(executor)
            .await?;

        Ok(())
    }

    /// Deletes a part by ID
    ///
    /// # Returns
    ///
    /// True if a part was deleted, false if the id was unknown.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM parts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_part_status_round_trip() {
        assert_eq!(PartStatus::parse("Sold"), Some(PartStatus::Sold));
        assert_eq!(PartStatus::parse("Unsold"), Some(PartStatus::Unsold));
        assert_eq!(PartStatus::parse("sold"), None);
        assert_eq!(PartStatus::parse("Pending"), None);
        assert_eq!(PartStatus::Sold.as_str(), "Sold");
    }

    #[test]
    fn test_sold_defaults_date_to_today() {
        let plan = plan_transition("Sold", &StatusAux::default(), today()).unwrap();

        assert_eq!(plan.status, "Sold");
        assert_eq!(plan.date_sold, Some(Some(today())));
        assert_eq!(plan.shipping, None);
        assert!(!plan.clear_invoice_number);
        assert!(plan.notify);
    }

    #[test]
    fn test_sold_with_supplied_fields() {
        let aux = StatusAux {
            date_sold: Some("2024-05-20".to_string()),
            shipping: Some(json!("12.50")),
            notes: Some("sold at auction".to_string()),
        };
        let plan = plan_transition("Sold", &aux, today()).unwrap();

        assert_eq!(
            plan.date_sold,
            Some(Some(NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()))
        );
        assert_eq!(plan.shipping, Some(Some(12.5)));
        assert_eq!(plan.notes.as_deref(), Some("sold at auction"));
    }

    #[test]
    fn test_sold_rejects_bad_aux() {
        let bad_date = StatusAux {
            date_sold: Some("05/20/2024".to_string()),
            ..Default::default()
        };
        assert_eq!(
            plan_transition("Sold", &bad_date, today()).unwrap_err(),
            FieldError::InvalidDate("date_sold".to_string())
        );

        let bad_shipping = StatusAux {
            shipping: Some(json!("free")),
            ..Default::default()
        };
        assert_eq!(
            plan_transition("Sold", &bad_shipping, today()).unwrap_err(),
            FieldError::InvalidValue("shipping".to_string())
        );
    }

    #[test]
    fn test_unsold_clears_sale_columns() {
        let plan = plan_transition("Unsold", &StatusAux::default(), today()).unwrap();

        assert_eq!(plan.status, "Unsold");
        assert_eq!(plan.date_sold, Some(None));
        assert_eq!(plan.shipping, Some(None));
        assert!(plan.clear_invoice_number);
        assert!(!plan.notify);
    }

    #[test]
    fn test_unknown_status_stored_verbatim() {
        let plan = plan_transition("Archived", &StatusAux::default(), today()).unwrap();

        assert_eq!(plan.status, "Archived");
        assert_eq!(plan.date_sold, None);
        assert_eq!(plan.shipping, None);
        assert!(!plan.clear_invoice_number);
        assert!(!plan.notify);
    }

    #[test]
    fn test_filter_clauses_are_conjunctive() {
        let filter = PartFilter {
            condition: Some("AR".to_string()),
            code: Some("C01".to_string()),
            ..Default::default()
        };
        let (sql, binds) = filter.where_sql();

        assert!(sql.contains("p.status = 'Unsold'"));
        assert!(sql.contains("AND p.condition = $1"));
        assert!(sql.contains("AND u.code ILIKE $2"));
        assert_eq!(binds, 2);
    }

    #[test]
    fn test_empty_filter_only_restricts_status() {
        let (sql, binds) = PartFilter::default().where_sql();
        assert_eq!(sql, "WHERE p.status = 'Unsold'");
        assert_eq!(binds, 0);
    }
}
