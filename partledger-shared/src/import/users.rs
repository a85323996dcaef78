//! Consigner bulk import
//!
//! Header-driven CSV with the columns: `name`, `code`, `email`,
//! `password_hash`, `is_admin`, `created_at`, `phone_number`,
//! `address_line1`, `address_line2`, `city`, `state`, `zip_code`.
//!
//! Rows missing any of the identity fields (`name`, `code`, `email`) are
//! skipped silently. Credential cells that already carry an Argon2 PHC
//! string are kept verbatim; anything else is treated as a plaintext
//! temporary password and hashed (falling back to a fixed placeholder when
//! the cell is empty, which forces a reset before first login).

use std::collections::HashMap;

use sqlx::PgPool;
use tracing::info;

use super::{clean, col, parse_timestamp, ImportError, ImportSummary};
use crate::auth::password::{hash_password, is_phc_hash};
use crate::models::user::{CreateUser, User};

/// Placeholder credential for rows that arrive without one.
const FALLBACK_PASSWORD: &str = "changeme";

/// Parses a CSV document into user records
///
/// Pure except for credential hashing. Returns the records plus the number
/// of rows skipped for missing identity fields.
pub fn parse_user_rows(csv_text: &str) -> Result<(Vec<CreateUser>, usize), ImportError> {
    let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
    let mut rows = Vec::new();
    let mut skipped = 0;

    for record in reader.deserialize::<HashMap<String, String>>() {
        let record = record?;

        let (name, code, email) = match (
            clean(col(&record, "name"), false),
            clean(col(&record, "code"), false),
            clean(col(&record, "email"), false),
        ) {
            (Some(name), Some(code), Some(email)) => (name, code, email),
            _ => {
                skipped += 1;
                continue;
            }
        };

        let raw_credential = col(&record, "password_hash").trim();
        let password_hash = if is_phc_hash(raw_credential) {
            raw_credential.to_string()
        } else if raw_credential.is_empty() {
            hash_password(FALLBACK_PASSWORD)?
        } else {
            hash_password(raw_credential)?
        };

        rows.push(CreateUser {
            name,
            code,
            email,
            password_hash,
            is_admin: col(&record, "is_admin").trim() == "1",
            created_at: parse_timestamp(col(&record, "created_at")),
            phone_number: clean(col(&record, "phone_number"), false),
            address_line1: clean(col(&record, "address_line1"), false),
            address_line2: clean(col(&record, "address_line2"), false),
            city: clean(col(&record, "city"), false),
            state: clean(col(&record, "state"), false),
            zip_code: clean(col(&record, "zip_code"), false),
        });
    }

    Ok((rows, skipped))
}

/// Parses and inserts a consigner CSV document
pub async fn import_users(pool: &PgPool, csv_text: &str) -> Result<ImportSummary, ImportError> {
    let (rows, skipped) = parse_user_rows(csv_text)?;

    let mut imported = 0;
    for row in rows {
        User::create(pool, row).await?;
        imported += 1;
    }

    info!(imported, skipped, "Consigner import complete");
    Ok(ImportSummary { imported, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;

    const HEADER: &str = "name,code,email,password_hash,is_admin,created_at,phone_number,\
address_line1,address_line2,city,state,zip_code";

    #[test]
    fn test_rows_missing_identity_fields_are_skipped() {
        let csv = format!(
            "{HEADER}\n\
             ,C01,c01@example.com,,0,,,,,,,\n\
             Consigner 2,,c02@example.com,,0,,,,,,,\n\
             Consigner 3,C03,,,0,,,,,,,\n\
             Consigner 4,C04,c04@example.com,,0,,,,,,,\n"
        );
        let (rows, skipped) = parse_user_rows(&csv).unwrap();

        assert_eq!(skipped, 3);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].code, "C04");
    }

    #[test]
    fn test_existing_argon2_hash_is_kept() {
        // PHC strings contain commas, so the cell must be quoted.
        let hash = hash_password("already-hashed").unwrap();
        let csv = format!("{HEADER}\nConsigner 1,C01,c01@example.com,\"{hash}\",0,,,,,,,\n");
        let (rows, _) = parse_user_rows(&csv).unwrap();

        assert_eq!(rows[0].password_hash, hash);
    }

    #[test]
    fn test_plaintext_credential_is_hashed() {
        let csv = format!("{HEADER}\nConsigner 1,C01,c01@example.com,temp-pass-1,1,2023-05-01,,,,,,\n");
        let (rows, _) = parse_user_rows(&csv).unwrap();

        let row = &rows[0];
        assert!(row.is_admin);
        assert!(row.created_at.is_some());
        assert!(row.password_hash.starts_with("$argon2id$"));
        assert!(verify_password("temp-pass-1", &row.password_hash).unwrap());
    }
}
