//! Parts bulk import
//!
//! Header-driven CSV with the columns: `part_number`, `serial_number`,
//! `description`, `notes`, `condition`, `price`, `shipping`, `date_added`,
//! `date_sold`, `invoice_number`, `commission_percentage`, `fixed_fee`,
//! `user_id`, `status`.
//!
//! Every row becomes one part attached to its `user_id`; rows without a
//! parseable `user_id` are skipped with a warning. Bad cells degrade per
//! the normalization rules in the parent module; a malformed date never
//! rejects the row, it just imports with that field null.

use std::collections::HashMap;

use sqlx::PgPool;
use tracing::{info, warn};

use super::{clean, col, derive_status, parse_amount, parse_date, parse_fee, ImportError, ImportSummary};
use crate::models::part::{CreatePart, Part};

/// Parses a CSV document into part records
///
/// Pure parsing stage: no database access. Returns the records plus the
/// number of rows skipped for a missing/unparseable `user_id`.
pub fn parse_part_rows(csv_text: &str) -> Result<(Vec<CreatePart>, usize), ImportError> {
    let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
    let mut rows = Vec::new();
    let mut skipped = 0;

    for record in reader.deserialize::<HashMap<String, String>>() {
        let record = record?;

        let user_id = match col(&record, "user_id").trim().parse::<i64>() {
            Ok(id) => id,
            Err(_) => {
                warn!(
                    part_number = col(&record, "part_number"),
                    "Skipping part row without a usable user_id"
                );
                skipped += 1;
                continue;
            }
        };

        let invoice_number = clean(col(&record, "invoice_number"), false);
        let raw_status = clean(col(&record, "status"), true);
        let status = derive_status(raw_status.as_deref(), invoice_number.is_some());

        rows.push(CreatePart {
            part_number: clean(col(&record, "part_number"), false),
            serial_number: clean(col(&record, "serial_number"), false),
            description: clean(col(&record, "description"), false),
            notes: clean(col(&record, "notes"), false),
            condition: clean(col(&record, "condition"), true),
            price: parse_amount(col(&record, "price")),
            shipping: Some(parse_amount(col(&record, "shipping"))),
            date_added: parse_date(col(&record, "date_added")),
            date_sold: parse_date(col(&record, "date_sold")),
            status: Some(status.as_str().to_string()),
            commission_percentage: parse_fee(col(&record, "commission_percentage")),
            fixed_fee: parse_fee(col(&record, "fixed_fee")),
            invoice_number,
            user_id,
        });
    }

    Ok((rows, skipped))
}

/// Parses and inserts a parts CSV document
pub async fn import_parts(pool: &PgPool, csv_text: &str) -> Result<ImportSummary, ImportError> {
    let (rows, skipped) = parse_part_rows(csv_text)?;

    let mut imported = 0;
    for row in rows {
        Part::create(pool, row).await?;
        imported += 1;
    }

    info!(imported, skipped, "Parts import complete");
    Ok(ImportSummary { imported, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const HEADER: &str = "part_number,serial_number,description,notes,condition,price,shipping,\
date_added,date_sold,invoice_number,commission_percentage,fixed_fee,user_id,status";

    #[test]
    fn test_clean_row_imports_fully() {
        let csv = format!(
            "{HEADER}\nPN-1,SN-1,Altimeter,bench checked,AR,125.50,10,2023-05-01,,,15,0,3,Unsold\n"
        );
        let (rows, skipped) = parse_part_rows(&csv).unwrap();

        assert_eq!(skipped, 0);
        assert_eq!(rows.len(), 1);
        let part = &rows[0];
        assert_eq!(part.part_number.as_deref(), Some("PN-1"));
        assert_eq!(part.condition.as_deref(), Some("AR"));
        assert_eq!(part.price, 125.5);
        assert_eq!(part.shipping, Some(10.0));
        assert_eq!(
            part.date_added,
            Some(NaiveDate::from_ymd_opt(2023, 5, 1).unwrap())
        );
        assert_eq!(part.date_sold, None);
        assert_eq!(part.commission_percentage, Some(15.0));
        // A "0" fixed fee means the fee mode is unset.
        assert_eq!(part.fixed_fee, None);
        assert_eq!(part.user_id, 3);
        assert_eq!(part.status.as_deref(), Some("Unsold"));
    }

    #[test]
    fn test_bad_cells_degrade_without_losing_the_row() {
        let csv = format!(
            "{HEADER}\nPN-2,-,N/A,,N/A,garbage,,not-a-date,,INV-9,abc,25,4,\n"
        );
        let (rows, skipped) = parse_part_rows(&csv).unwrap();

        assert_eq!(skipped, 0);
        let part = &rows[0];
        assert_eq!(part.serial_number, None);
        // allow_na keeps the literal condition token, but not description
        assert_eq!(part.description, None);
        assert_eq!(part.condition.as_deref(), Some("N/A"));
        assert_eq!(part.price, 0.0);
        assert_eq!(part.date_added, None);
        assert_eq!(part.commission_percentage, None);
        assert_eq!(part.fixed_fee, Some(25.0));
        // No status token + invoice number present: inferred Sold.
        assert_eq!(part.status.as_deref(), Some("Sold"));
    }

    #[test]
    fn test_row_without_user_id_is_skipped() {
        let csv = format!(
            "{HEADER}\nPN-3,,,,,10,,,,,,,,Unsold\nPN-4,,,,,10,,,,,,,5,Unsold\n"
        );
        let (rows, skipped) = parse_part_rows(&csv).unwrap();

        assert_eq!(skipped, 1);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].part_number.as_deref(), Some("PN-4"));
    }

    #[test]
    fn test_legacy_export_without_status_column() {
        let header = "part_number,price,invoice_number,user_id";
        let csv = format!("{header}\nPN-5,50,INV-1,2\nPN-6,60,,2\n");
        let (rows, _) = parse_part_rows(&csv).unwrap();

        assert_eq!(rows[0].status.as_deref(), Some("Sold"));
        assert_eq!(rows[1].status.as_deref(), Some("Unsold"));
    }
}
