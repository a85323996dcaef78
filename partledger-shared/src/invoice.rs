//! Invoice fee and total computation
//!
//! Pure arithmetic over already-fetched parts: per-line fee deduction,
//! subtotal, and grand total. Stamping invoice numbers onto parts and
//! rendering the document are the caller's concern; nothing here touches
//! the database or the PDF layer.
//!
//! # Fee precedence
//!
//! Per part, exactly one deduction applies:
//!
//! ```text
//! fixed_fee set        →  qty * (price - fixed_fee - shipping)
//! commission set       →  qty * (price - shipping) * (1 - pct / 100)
//! neither              →  qty * (price - shipping)
//! ```
//!
//! `fixed_fee` wins when both are somehow set. New writes reject that
//! combination, but rows predating the guard keep producing the same
//! invoices they always did.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::part::Part;

/// One line of a computed invoice
#[derive(Debug, Clone, Serialize)]
pub struct LineItem {
    /// Part the line was computed from
    pub part_id: i64,

    pub description: Option<String>,
    pub qty: u32,
    pub price: f64,

    /// Commission percentage in effect, for display
    pub commission: Option<f64>,

    /// The part's own shipping deduction, for display
    pub shipping: Option<f64>,

    /// Fixed fee in effect, for display
    pub fixed_fee: Option<f64>,

    /// Net proceeds for this line
    pub total: f64,

    /// Invoice number stamped onto the part (per-part override or the
    /// invoice-level number)
    pub invoice_number: String,
}

/// Computed line items plus totals
#[derive(Debug, Clone, Serialize)]
pub struct Computation {
    pub items: Vec<LineItem>,
    pub subtotal: f64,
}

/// Net proceeds for one line
///
/// A part's own null `shipping` counts as zero here; the nullable column
/// means "no shipping deduction".
pub fn line_total(
    price: f64,
    shipping: Option<f64>,
    commission: Option<f64>,
    fixed_fee: Option<f64>,
    qty: u32,
) -> f64 {
    let shipping = shipping.unwrap_or(0.0);
    let qty = f64::from(qty);

    if let Some(fee) = fixed_fee {
        qty * (price - fee - shipping)
    } else if let Some(pct) = commission {
        qty * (price - shipping) * (1.0 - pct / 100.0)
    } else {
        qty * (price - shipping)
    }
}

/// Computes line items and subtotal for a set of parts
///
/// `quantities` maps part id to quantity; a missing entry counts as 1.
/// `overrides` maps part id to a per-part invoice number; parts without an
/// override get the invoice-level `invoice_number`.
pub fn compute(
    parts: &[Part],
    quantities: &HashMap<i64, u32>,
    overrides: &HashMap<i64, String>,
    invoice_number: &str,
) -> Computation {
    let mut items = Vec::with_capacity(parts.len());
    let mut subtotal = 0.0;

    for part in parts {
        let qty = quantities.get(&part.id).copied().unwrap_or(1);
        let total = line_total(
            part.price,
            part.shipping,
            part.commission_percentage,
            part.fixed_fee,
            qty,
        );
        subtotal += total;

        let number = overrides
            .get(&part.id)
            .cloned()
            .unwrap_or_else(|| invoice_number.to_string());

        items.push(LineItem {
            part_id: part.id,
            description: part.description.clone(),
            qty,
            price: part.price,
            commission: part.commission_percentage,
            shipping: part.shipping,
            fixed_fee: part.fixed_fee,
            total,
            invoice_number: number,
        });
    }

    Computation { items, subtotal }
}

/// Grand total after invoice-level fees
///
/// `shipping_fee` and `misc_fee` apply to the whole invoice and are
/// distinct from each part's own shipping deduction.
pub fn grand_total(subtotal: f64, shipping_fee: f64, misc_fee: f64) -> f64 {
    subtotal - shipping_fee - misc_fee
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(id: i64, price: f64, shipping: Option<f64>) -> Part {
        Part {
            id,
            part_number: Some(format!("PN-{id}")),
            serial_number: None,
            description: Some("Altimeter".to_string()),
            notes: None,
            condition: Some("AR".to_string()),
            price,
            shipping,
            date_added: None,
            date_sold: None,
            status: "Unsold".to_string(),
            commission_percentage: None,
            fixed_fee: None,
            invoice_number: None,
            user_id: 1,
        }
    }

    #[test]
    fn test_fixed_fee_line_total() {
        // 2 * (100 - 20 - 10) = 140
        assert_eq!(line_total(100.0, Some(10.0), None, Some(20.0), 2), 140.0);
    }

    #[test]
    fn test_commission_line_total() {
        // 1 * (100 - 0) * 0.75 = 75
        assert_eq!(line_total(100.0, Some(0.0), Some(25.0), None, 1), 75.0);
    }

    #[test]
    fn test_no_fee_line_total() {
        assert_eq!(line_total(100.0, Some(10.0), None, None, 3), 270.0);
    }

    #[test]
    fn test_null_shipping_counts_as_zero() {
        assert_eq!(line_total(50.0, None, None, None, 1), 50.0);
    }

    #[test]
    fn test_fixed_fee_wins_when_both_set() {
        // Legacy precedence: fixed fee applies, commission ignored.
        assert_eq!(
            line_total(100.0, None, Some(50.0), Some(20.0), 1),
            80.0
        );
    }

    #[test]
    fn test_compute_subtotal_and_overrides() {
        let mut a = part(1, 100.0, Some(10.0));
        a.fixed_fee = Some(20.0);
        let mut b = part(2, 100.0, Some(0.0));
        b.commission_percentage = Some(25.0);

        let quantities = HashMap::from([(1, 2u32), (2, 1u32)]);
        let overrides = HashMap::from([(2, "INV-OVR".to_string())]);

        let computed = compute(&[a, b], &quantities, &overrides, "INV-100");

        assert_eq!(computed.items.len(), 2);
        assert_eq!(computed.items[0].total, 140.0);
        assert_eq!(computed.items[0].invoice_number, "INV-100");
        assert_eq!(computed.items[1].total, 75.0);
        assert_eq!(computed.items[1].invoice_number, "INV-OVR");
        assert_eq!(computed.subtotal, 215.0);
    }

    #[test]
    fn test_missing_quantity_defaults_to_one() {
        let computed = compute(&[part(7, 30.0, None)], &HashMap::new(), &HashMap::new(), "I-1");
        assert_eq!(computed.items[0].qty, 1);
        assert_eq!(computed.subtotal, 30.0);
    }

    #[test]
    fn test_grand_total_subtracts_invoice_fees() {
        assert_eq!(grand_total(215.0, 15.0, 5.0), 195.0);
    }
}
