//! Declarative single-field update tables
//!
//! Admin screens edit parts and consigners one field at a time. Instead of
//! branching per field name, each entity declares a static table mapping the
//! updatable field names to a [`FieldKind`]; coercion and validation are
//! looked up once and applied uniformly. Anything not in the table is
//! rejected before touching the database.
//!
//! The `status` field of a part is deliberately absent from
//! [`PART_FIELDS`]: status changes carry side effects and go through the
//! transition planner in [`crate::models::part`] instead.
//!
//! # Example
//!
//! ```
//! use partledger_shared::fields::{resolve, FieldValue, PART_FIELDS};
//! use serde_json::json;
//!
//! let value = resolve(PART_FIELDS, "price", &json!("42.50")).unwrap();
//! assert_eq!(value, FieldValue::Decimal(42.5));
//!
//! assert!(resolve(PART_FIELDS, "status", &json!("Sold")).is_err());
//! ```

use chrono::NaiveDate;
use serde_json::Value;

/// Target type of an updatable field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free-form text
    Text,

    /// Floating-point number (prices, fees, percentages)
    Decimal,

    /// Calendar date, accepted only as `YYYY-MM-DD`
    Date,
}

/// A coerced, validated field value ready to be written
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Decimal(f64),
    Date(NaiveDate),
}

/// Error type for single-field updates
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    /// Field name is not updatable for this entity
    #[error("Invalid field: {0}")]
    UnknownField(String),

    /// Raw value could not be coerced to the field's type
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    /// Date fields require the literal `YYYY-MM-DD` pattern
    #[error("Invalid date format for {0}. Use YYYY-MM-DD")]
    InvalidDate(String),

    /// Value is outside the field's allowed range
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
    },
}

/// Updatable fields of a part
///
/// `status` is handled by the transition planner, never through this table.
pub const PART_FIELDS: &[(&str, FieldKind)] = &[
    ("part_number", FieldKind::Text),
    ("serial_number", FieldKind::Text),
    ("description", FieldKind::Text),
    ("condition", FieldKind::Text),
    ("notes", FieldKind::Text),
    ("price", FieldKind::Decimal),
    ("shipping", FieldKind::Decimal),
    ("commission_percentage", FieldKind::Decimal),
    ("fixed_fee", FieldKind::Decimal),
    ("date_added", FieldKind::Date),
    ("date_sold", FieldKind::Date),
];

/// Updatable fields of a consigner
///
/// `email` and `code` pass through here for coercion but are additionally
/// uniqueness-checked by the route handler before the write.
pub const CONSIGNER_FIELDS: &[(&str, FieldKind)] = &[
    ("name", FieldKind::Text),
    ("email", FieldKind::Text),
    ("code", FieldKind::Text),
    ("phone_number", FieldKind::Text),
    ("address_line1", FieldKind::Text),
    ("address_line2", FieldKind::Text),
    ("city", FieldKind::Text),
    ("state", FieldKind::Text),
    ("zip_code", FieldKind::Text),
    ("created_at", FieldKind::Date),
];

/// Looks up a field's kind in an entity table
pub fn lookup(table: &[(&str, FieldKind)], field: &str) -> Option<FieldKind> {
    table
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, kind)| *kind)
}

/// Coerces a raw JSON value to the field's declared kind
///
/// Text accepts strings and numbers (numbers are stringified, the way a
/// form-driven UI submits them). Decimal accepts numbers and numeric
/// strings. Date accepts `YYYY-MM-DD` strings only.
pub fn coerce(field: &str, kind: FieldKind, raw: &Value) -> Result<FieldValue, FieldError> {
    match kind {
        FieldKind::Text => match raw {
            Value::String(s) => Ok(FieldValue::Text(s.clone())),
            Value::Number(n) => Ok(FieldValue::Text(n.to_string())),
            _ => Err(FieldError::InvalidValue(field.to_string())),
        },
        FieldKind::Decimal => decimal(raw)
            .map(FieldValue::Decimal)
            .ok_or_else(|| FieldError::InvalidValue(field.to_string())),
        FieldKind::Date => {
            let s = raw
                .as_str()
                .ok_or_else(|| FieldError::InvalidDate(field.to_string()))?;
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(FieldValue::Date)
                .map_err(|_| FieldError::InvalidDate(field.to_string()))
        }
    }
}

/// Extracts an f64 from a JSON number or numeric string
pub fn decimal(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Field-specific domain validation applied after coercion
///
/// Currently only `commission_percentage` carries a range constraint.
pub fn validate(field: &str, value: &FieldValue) -> Result<(), FieldError> {
    if field == "commission_percentage" {
        if let FieldValue::Decimal(pct) = value {
            if !(0.0..=100.0).contains(pct) {
                return Err(FieldError::OutOfRange {
                    field: field.to_string(),
                    min: 0.0,
                    max: 100.0,
                });
            }
        }
    }
    Ok(())
}

/// Resolves a single-field update: lookup, coerce, validate
///
/// This is the entry point route handlers use. Any error means nothing may
/// be written.
pub fn resolve(
    table: &[(&str, FieldKind)],
    field: &str,
    raw: &Value,
) -> Result<FieldValue, FieldError> {
    let kind = lookup(table, field).ok_or_else(|| FieldError::UnknownField(field.to_string()))?;
    let value = coerce(field, kind, raw)?;
    validate(field, &value)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_field_rejected() {
        let err = resolve(PART_FIELDS, "id", &json!(7)).unwrap_err();
        assert_eq!(err, FieldError::UnknownField("id".to_string()));

        // status must never route through the generic table
        assert!(lookup(PART_FIELDS, "status").is_none());
    }

    #[test]
    fn test_decimal_from_string_and_number() {
        assert_eq!(
            resolve(PART_FIELDS, "price", &json!("19.99")).unwrap(),
            FieldValue::Decimal(19.99)
        );
        assert_eq!(
            resolve(PART_FIELDS, "shipping", &json!(4)).unwrap(),
            FieldValue::Decimal(4.0)
        );
        assert_eq!(
            resolve(PART_FIELDS, "price", &json!("not a number")).unwrap_err(),
            FieldError::InvalidValue("price".to_string())
        );
    }

    #[test]
    fn test_commission_range() {
        assert!(resolve(PART_FIELDS, "commission_percentage", &json!(100)).is_ok());
        assert!(resolve(PART_FIELDS, "commission_percentage", &json!(0)).is_ok());

        let err = resolve(PART_FIELDS, "commission_percentage", &json!(150)).unwrap_err();
        assert!(matches!(err, FieldError::OutOfRange { .. }));
    }

    #[test]
    fn test_date_format() {
        assert_eq!(
            resolve(PART_FIELDS, "date_sold", &json!("2024-03-09")).unwrap(),
            FieldValue::Date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap())
        );
        assert_eq!(
            resolve(PART_FIELDS, "date_sold", &json!("03/09/2024")).unwrap_err(),
            FieldError::InvalidDate("date_sold".to_string())
        );
    }

    #[test]
    fn test_text_accepts_numbers() {
        assert_eq!(
            resolve(CONSIGNER_FIELDS, "zip_code", &json!(97756)).unwrap(),
            FieldValue::Text("97756".to_string())
        );
    }
}
