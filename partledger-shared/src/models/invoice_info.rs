//! Billing-entity record printed on generated invoices
//!
//! Effectively a singleton: the shop's company name, contact email, and
//! mailing address. Administratively upserted, read-only at invoice
//! generation time. Readers take the first row.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

const INVOICE_INFO_COLUMNS: &str =
    "id, company, email, phone_number, address_line1, address_line2, city, state, zip_code";

/// The billing entity shown in the invoice header
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InvoiceInfo {
    pub id: i64,
    pub company: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

/// Input for creating or replacing the billing-entity record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertInvoiceInfo {
    pub company: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

impl InvoiceInfo {
    /// Fetches the billing-entity record, if one has been configured
    pub async fn get(pool: &PgPool) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, InvoiceInfo>(&format!(
            "SELECT {INVOICE_INFO_COLUMNS} FROM invoice_info ORDER BY id LIMIT 1"
        ))
        .fetch_optional(pool)
        .await
    }

    /// Creates or replaces the billing-entity record
    ///
    /// Updates the existing row when present, inserts otherwise.
    pub async fn upsert(pool: &PgPool, data: UpsertInvoiceInfo) -> Result<Self, sqlx::Error> {
        let existing = Self::get(pool).await?;

        let info = match existing {
            Some(current) => {
                sqlx::query_as::<_, InvoiceInfo>(&format!(
                    r#"
                    UPDATE invoice_info
                    SET company = $2, email = $3, phone_number = $4, address_line1 = $5,
                        address_line2 = $6, city = $7, state = $8, zip_code = $9
                    WHERE id = $1
                    RETURNING {INVOICE_INFO_COLUMNS}
                    "#
                ))
                .bind(current.id)
                .bind(data.company)
                .bind(data.email)
                .bind(data.phone_number)
                .bind(data.address_line1)
                .bind(data.address_line2)
                .bind(data.city)
                .bind(data.state)
                .bind(data.zip_code)
                .fetch_one(pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, InvoiceInfo>(&format!(
                    r#"
                    INSERT INTO invoice_info (company, email, phone_number, address_line1,
                                              address_line2, city, state, zip_code)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    RETURNING {INVOICE_INFO_COLUMNS}
                    "#
                ))
                .bind(data.company)
                .bind(data.email)
                .bind(data.phone_number)
                .bind(data.address_line1)
                .bind(data.address_line2)
                .bind(data.city)
                .bind(data.state)
                .bind(data.zip_code)
                .fetch_one(pool)
                .await?
            }
        };

        Ok(info)
    }
}
