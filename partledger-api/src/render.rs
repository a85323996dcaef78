//! Invoice PDF rendering
//!
//! Lays the computed line items, billing block, and consigner block out on
//! US-Letter pages. This is deliberately a thin wrapper over the PDF
//! library: all amounts arrive pre-computed from
//! `partledger_shared::invoice`, and nothing here decides fees or totals.

use chrono::NaiveDate;
use printpdf::{BuiltinFont, Mm, PdfDocument};

use partledger_shared::invoice::LineItem;
use partledger_shared::models::invoice_info::InvoiceInfo;
use partledger_shared::models::user::User;

/// Error type for document rendering
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The PDF library rejected the document
    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

/// Everything the invoice layout needs, pre-computed
#[derive(Debug)]
pub struct InvoiceDocument<'a> {
    pub invoice_number: &'a str,
    pub invoice_date: NaiveDate,
    pub payment_method: &'a str,

    /// Billing-entity header block; omitted when not configured
    pub billing: Option<&'a InvoiceInfo>,

    /// Consigner the invoice settles with
    pub consigner: &'a User,

    pub items: &'a [LineItem],
    pub subtotal: f64,
    pub shipping_fee: f64,
    pub misc_fee: f64,
    pub grand_total: f64,
}

fn money(value: f64) -> String {
    format!("${:.2}", value)
}

/// Fee column text for one line item
fn fee_text(item: &LineItem) -> String {
    if let Some(fee) = item.fixed_fee {
        money(fee)
    } else if let Some(pct) = item.commission {
        format!("{}%", pct)
    } else {
        "-".to_string()
    }
}

/// Renders the invoice to PDF bytes
///
/// # Errors
///
/// Returns [`RenderError::Pdf`] if font loading or serialization fails.
pub fn render_invoice(invoice: &InvoiceDocument<'_>) -> Result<Vec<u8>, RenderError> {
    let (pdf, first_page, first_layer) = PdfDocument::new(
        format!("Invoice {}", invoice.invoice_number),
        Mm(215.9),
        Mm(279.4),
        "Layer 1",
    );

    let regular = pdf
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| RenderError::Pdf(e.to_string()))?;
    let bold = pdf
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| RenderError::Pdf(e.to_string()))?;

    let mut layer = pdf.get_page(first_page).get_layer(first_layer);
    let mut y = 262.0;

    // Billing-entity header
    if let Some(billing) = invoice.billing {
        layer.use_text(billing.company.clone(), 16.0, Mm(15.0), Mm(y), &bold);
        y -= 6.0;

        for line in [
            billing.address_line1.as_deref(),
            billing.address_line2.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            layer.use_text(line, 9.0, Mm(15.0), Mm(y), &regular);
            y -= 4.5;
        }

        let mut city_line = String::new();
        if let Some(city) = &billing.city {
            city_line.push_str(city);
        }
        if let Some(state) = &billing.state {
            if !city_line.is_empty() {
                city_line.push_str(", ");
            }
            city_line.push_str(state);
        }
        if let Some(zip) = &billing.zip_code {
            if !city_line.is_empty() {
                city_line.push(' ');
            }
            city_line.push_str(zip);
        }
        if !city_line.is_empty() {
            layer.use_text(city_line, 9.0, Mm(15.0), Mm(y), &regular);
            y -= 4.5;
        }

        layer.use_text(billing.email.clone(), 9.0, Mm(15.0), Mm(y), &regular);
        y -= 4.5;
        if let Some(phone) = &billing.phone_number {
            layer.use_text(phone.clone(), 9.0, Mm(15.0), Mm(y), &regular);
            y -= 4.5;
        }
    } else {
        layer.use_text("Invoice", 16.0, Mm(15.0), Mm(y), &bold);
        y -= 6.0;
    }

    // Invoice metadata, right-hand column
    layer.use_text(
        format!("Invoice #: {}", invoice.invoice_number),
        10.0,
        Mm(140.0),
        Mm(262.0),
        &bold,
    );
    layer.use_text(
        format!("Date: {}", invoice.invoice_date.format("%Y-%m-%d")),
        9.0,
        Mm(140.0),
        Mm(256.5),
        &regular,
    );
    layer.use_text(
        format!("Payment: {}", invoice.payment_method),
        9.0,
        Mm(140.0),
        Mm(252.0),
        &regular,
    );

    // Consigner block
    y -= 8.0;
    layer.use_text("Consigner:", 10.0, Mm(15.0), Mm(y), &bold);
    y -= 5.0;
    layer.use_text(
        format!("{} ({})", invoice.consigner.name, invoice.consigner.code),
        9.0,
        Mm(15.0),
        Mm(y),
        &regular,
    );
    y -= 4.5;
    layer.use_text(invoice.consigner.email.clone(), 9.0, Mm(15.0), Mm(y), &regular);
    y -= 4.5;
    for line in [
        invoice.consigner.address_line1.as_deref(),
        invoice.consigner.address_line2.as_deref(),
    ]
    .into_iter()
    .flatten()
    {
        layer.use_text(line, 9.0, Mm(15.0), Mm(y), &regular);
        y -= 4.5;
    }

    // Line-item table
    y -= 8.0;
    layer.use_text("Description", 9.0, Mm(15.0), Mm(y), &bold);
    layer.use_text("Invoice #", 9.0, Mm(80.0), Mm(y), &bold);
    layer.use_text("Qty", 9.0, Mm(112.0), Mm(y), &bold);
    layer.use_text("Price", 9.0, Mm(126.0), Mm(y), &bold);
    layer.use_text("Fee", 9.0, Mm(148.0), Mm(y), &bold);
    layer.use_text("Total", 9.0, Mm(175.0), Mm(y), &bold);
    y -= 6.0;

    for item in invoice.items {
        if y < 30.0 {
            let (page, layer_index) = pdf.add_page(Mm(215.9), Mm(279.4), "Layer 1");
            layer = pdf.get_page(page).get_layer(layer_index);
            y = 262.0;
        }

        layer.use_text(
            item.description.as_deref().unwrap_or("-"),
            9.0,
            Mm(15.0),
            Mm(y),
            &regular,
        );
        layer.use_text(item.invoice_number.clone(), 9.0, Mm(80.0), Mm(y), &regular);
        layer.use_text(item.qty.to_string(), 9.0, Mm(112.0), Mm(y), &regular);
        layer.use_text(money(item.price), 9.0, Mm(126.0), Mm(y), &regular);
        layer.use_text(fee_text(item), 9.0, Mm(148.0), Mm(y), &regular);
        layer.use_text(money(item.total), 9.0, Mm(175.0), Mm(y), &regular);
        y -= 5.0;
    }

    // Totals block
    if y < 45.0 {
        let (page, layer_index) = pdf.add_page(Mm(215.9), Mm(279.4), "Layer 1");
        layer = pdf.get_page(page).get_layer(layer_index);
        y = 262.0;
    }

    y -= 4.0;
    layer.use_text("Subtotal:", 10.0, Mm(140.0), Mm(y), &regular);
    layer.use_text(money(invoice.subtotal), 10.0, Mm(175.0), Mm(y), &regular);
    y -= 5.0;
    layer.use_text("Shipping:", 10.0, Mm(140.0), Mm(y), &regular);
    layer.use_text(money(invoice.shipping_fee), 10.0, Mm(175.0), Mm(y), &regular);
    y -= 5.0;
    layer.use_text("Misc:", 10.0, Mm(140.0), Mm(y), &regular);
    layer.use_text(money(invoice.misc_fee), 10.0, Mm(175.0), Mm(y), &regular);
    y -= 6.0;
    layer.use_text("Grand Total:", 11.0, Mm(140.0), Mm(y), &bold);
    layer.use_text(money(invoice.grand_total), 11.0, Mm(175.0), Mm(y), &bold);

    let mut bytes: Vec<u8> = Vec::new();
    {
        let mut writer = std::io::BufWriter::new(&mut bytes);
        pdf.save(&mut writer)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn consigner() -> User {
        User {
            id: 1,
            name: "Consigner 1".to_string(),
            code: "C01".to_string(),
            email: "c01@example.com".to_string(),
            password_hash: "$argon2id$test".to_string(),
            is_admin: false,
            created_at: Utc::now(),
            phone_number: None,
            address_line1: Some("100 Sample St".to_string()),
            address_line2: None,
            city: Some("Dallas".to_string()),
            state: Some("TX".to_string()),
            zip_code: Some("75001".to_string()),
        }
    }

    fn item(total: f64) -> LineItem {
        LineItem {
            part_id: 1,
            description: Some("Altimeter".to_string()),
            qty: 1,
            price: 100.0,
            commission: Some(25.0),
            shipping: None,
            fixed_fee: None,
            total,
            invoice_number: "INV-100".to_string(),
        }
    }

    #[test]
    fn test_render_produces_pdf_bytes() {
        let user = consigner();
        let items = vec![item(75.0)];
        let document = InvoiceDocument {
            invoice_number: "INV-100",
            invoice_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            payment_method: "Check",
            billing: None,
            consigner: &user,
            items: &items,
            subtotal: 75.0,
            shipping_fee: 0.0,
            misc_fee: 0.0,
            grand_total: 75.0,
        };

        let bytes = render_invoice(&document).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_many_items_spill_onto_more_pages() {
        let user = consigner();
        let items: Vec<LineItem> = (0..120).map(|_| item(10.0)).collect();
        let document = InvoiceDocument {
            invoice_number: "INV-101",
            invoice_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            payment_method: "Check",
            billing: None,
            consigner: &user,
            items: &items,
            subtotal: 1200.0,
            shipping_fee: 15.0,
            misc_fee: 5.0,
            grand_total: 1180.0,
        };

        let bytes = render_invoice(&document).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_fee_text_precedence() {
        let mut line = item(75.0);
        assert_eq!(fee_text(&line), "25%");

        line.fixed_fee = Some(20.0);
        assert_eq!(fee_text(&line), "$20.00");

        line.fixed_fee = None;
        line.commission = None;
        assert_eq!(fee_text(&line), "-");
    }
}
