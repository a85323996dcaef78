//! CSV normalization and bulk import
//!
//! Legacy spreadsheets are messy: placeholder dashes, "N/A" markers, mixed
//! date formats, blank numerics. The primitives here turn a raw cell into
//! a typed value or an absent one; they never fail a whole row for a bad
//! cell. Rows are only skipped when their identity fields are missing
//! (`user_id` for parts; `name`/`code`/`email` for users).
//!
//! - [`clean`]: whitespace/placeholder collapsing
//! - [`parse_date`]: ISO-8601 first, `MM/DD/YYYY` fallback, warn-and-absent
//!   on garbage
//! - [`parse_amount`]: price/shipping cells, defaulting to 0
//! - [`parse_fee`]: commission/fixed-fee cells, where zero and garbage both
//!   mean "unset"
//! - [`derive_status`]: explicit token or inference from invoice presence
//!
//! Submodules wire the primitives to whole documents:
//!
//! - `parts`: the parts upload (one part per row, attached by `user_id`)
//! - `users`: the consigner upload (re-hashing legacy credentials)

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::auth::password::PasswordError;
use crate::models::part::PartStatus;

pub mod parts;
pub mod users;

/// Error type for bulk imports
///
/// Per-cell data problems never surface here; they degrade to defaults.
/// These are structural failures: unreadable CSV, database errors, or a
/// credential that could not be hashed.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The document itself could not be parsed as CSV
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// A database operation failed
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    /// Re-hashing a legacy credential failed
    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Outcome of a bulk import
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ImportSummary {
    /// Rows inserted
    pub imported: usize,

    /// Rows skipped for missing identity fields
    pub skipped: usize,
}

/// Trims a raw cell and collapses placeholder tokens to absent
///
/// Empty string, `-`, `NA`, and `N/A` all mean "no value", unless
/// `allow_na` is set, in which case the literal token is preserved (a
/// condition of "N/A" is a real condition code, distinct from unknown).
pub fn clean(value: &str, allow_na: bool) -> Option<String> {
    let trimmed = value.trim();

    if trimmed.is_empty() || matches!(trimmed, "-" | "NA" | "N/A") {
        if allow_na {
            Some(trimmed.to_string())
        } else {
            None
        }
    } else {
        Some(trimmed.to_string())
    }
}

/// Parses a date cell, degrading to absent on garbage
///
/// Tries ISO-8601 (`YYYY-MM-DD`, with or without a time component), then
/// `MM/DD/YYYY`. Total failure logs a warning and returns `None`; the row
/// itself continues, only the date field goes null.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let cleaned = clean(value, false)?;

    if let Ok(date) = NaiveDate::parse_from_str(&cleaned, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(&cleaned, "%Y-%m-%dT%H:%M:%S") {
        return Some(datetime.date());
    }
    if let Ok(date) = NaiveDate::parse_from_str(&cleaned, "%m/%d/%Y") {
        return Some(date);
    }

    warn!(value = %cleaned, "Invalid date in import, treating as absent");
    None
}

/// Parses a price/shipping cell, defaulting to 0
pub fn parse_amount(value: &str) -> f64 {
    clean(value, false)
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Parses a commission/fixed-fee cell, where zero means unset
///
/// Absence signals "use the other fee mode or none", so garbage and `0`
/// both come back as `None` rather than a zero fee.
pub fn parse_fee(value: &str) -> Option<f64> {
    let fee = clean(value, false)?.parse::<f64>().ok()?;

    if fee == 0.0 {
        None
    } else {
        Some(fee)
    }
}

/// Derives a part's status from the raw token and invoice presence
///
/// Exact `Sold`/`Unsold` tokens pass through. Anything else (including
/// legacy exports with no status column at all) infers `Sold` when an
/// invoice number is present, else `Unsold`.
pub fn derive_status(raw: Option<&str>, has_invoice_number: bool) -> PartStatus {
    match raw.and_then(PartStatus::parse) {
        Some(status) => status,
        None if has_invoice_number => PartStatus::Sold,
        None => PartStatus::Unsold,
    }
}

/// Parses a created-at cell into a UTC timestamp
///
/// Accepts RFC 3339, a bare `YYYY-MM-DDTHH:MM:SS`, or a bare date (taken
/// at midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let cleaned = clean(value, false)?;

    if let Ok(ts) = DateTime::parse_from_rfc3339(&cleaned) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(&cleaned, "%Y-%m-%dT%H:%M:%S") {
        return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(&cleaned, "%Y-%m-%d %H:%M:%S") {
        return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(&cleaned, "%Y-%m-%d") {
        return Some(DateTime::from_naive_utc_and_offset(
            date.and_time(NaiveTime::MIN),
            Utc,
        ));
    }

    warn!(value = %cleaned, "Invalid timestamp in import, treating as absent");
    None
}

/// Fetches a column by header name, empty when the column is missing
pub(crate) fn col<'a>(row: &'a std::collections::HashMap<String, String>, name: &str) -> &'a str {
    row.get(name).map(String::as_str).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_placeholders() {
        assert_eq!(clean("", false), None);
        assert_eq!(clean("  ", false), None);
        assert_eq!(clean("-", false), None);
        assert_eq!(clean("NA", false), None);
        assert_eq!(clean("N/A", false), None);
        assert_eq!(clean("N/A", true), Some("N/A".to_string()));
        assert_eq!(clean("  AR  ", false), Some("AR".to_string()));
    }

    #[test]
    fn test_parse_date_round_trips_both_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        assert_eq!(parse_date("2023-05-01"), Some(expected));
        assert_eq!(parse_date("05/01/2023"), Some(expected));
        assert_eq!(parse_date("2023-05-01T14:30:00"), Some(expected));
    }

    #[test]
    fn test_parse_date_garbage_is_absent() {
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("13/45/2023"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("N/A"), None);
    }

    #[test]
    fn test_parse_amount_defaults_to_zero() {
        assert_eq!(parse_amount("125.50"), 125.5);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("call for price"), 0.0);
    }

    #[test]
    fn test_parse_fee_zero_and_garbage_are_unset() {
        assert_eq!(parse_fee("12.5"), Some(12.5));
        assert_eq!(parse_fee("0"), None);
        assert_eq!(parse_fee(""), None);
        assert_eq!(parse_fee("none"), None);
    }

    #[test]
    fn test_status_inference() {
        assert_eq!(derive_status(Some("Sold"), false), PartStatus::Sold);
        assert_eq!(derive_status(Some("Unsold"), true), PartStatus::Unsold);

        // No usable token: infer from invoice presence.
        assert_eq!(derive_status(None, true), PartStatus::Sold);
        assert_eq!(derive_status(None, false), PartStatus::Unsold);
        assert_eq!(derive_status(Some(""), true), PartStatus::Sold);
        assert_eq!(derive_status(Some("pending"), false), PartStatus::Unsold);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2023-05-01T10:00:00").is_some());
        assert!(parse_timestamp("2023-05-01 10:00:00").is_some());
        assert!(parse_timestamp("2023-05-01").is_some());
        assert_eq!(parse_timestamp("last tuesday"), None);
    }
}
