//! Page layout for an invoice, independent of the PDF backend.

use chrono::{DateTime, Utc};

use crate::db::orders::{Order, OrderItem};
use crate::domain::value_objects::format_cents;

const LEFT: f32 = 20.0;
const TOP: f32 = 277.0;
const LINE: f32 = 6.0;
/// Lowest row baseline; the footer sits below it.
const BOTTOM: f32 = 30.0;
const FOOTER: f32 = 20.0;
const ADDRESS_KEYS: [&str; 6] = ["line1", "line2", "city", "province", "postal_code", "country"];

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceLine {
    pub description: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDocument {
    pub gallery_name: String,
    pub invoice_number: String,
    pub issued_at: DateTime<Utc>,
    pub order_number: String,
    pub bill_to: Vec<String>,
    pub lines: Vec<InvoiceLine>,
    pub currency: String,
    pub subtotal: i64,
    pub shipping: i64,
    pub vat: i64,
    pub total: i64,
    pub amount_paid: i64,
}

/// A positioned piece of text, in millimetres from the bottom-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub bold: bool,
}

impl InvoiceDocument {
    pub fn from_order(
        gallery_name: &str,
        invoice_number: &str,
        issued_at: DateTime<Utc>,
        order: &Order,
        items: &[OrderItem],
    ) -> Self {
        let mut bill_to = vec![order.customer_name.clone(), order.customer_email.clone()];
        bill_to.extend(order.customer_phone.iter().cloned());
        bill_to.extend(
            ADDRESS_KEYS
                .iter()
                .filter_map(|key| order.shipping_address.get(*key).and_then(|v| v.as_str()))
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string),
        );

        let lines = items
            .iter()
            .map(|item| InvoiceLine {
                description: match &item.variant_name {
                    Some(variant) => format!("{} ({variant})", item.title),
                    None => item.title.clone(),
                },
                quantity: item.quantity,
                unit_price: item.unit_price,
                total: item.total,
            })
            .collect();

        Self {
            gallery_name: gallery_name.to_string(),
            invoice_number: invoice_number.to_string(),
            issued_at,
            order_number: order.order_number.clone(),
            bill_to,
            lines,
            currency: order.currency.clone(),
            subtotal: order.subtotal,
            shipping: order.shipping,
            vat: order.vat,
            total: order.total,
            amount_paid: order.amount_paid,
        }
    }

    pub fn balance_due(&self) -> i64 {
        (self.total - self.amount_paid).max(0)
    }

    /// Summary rows printed under the item table.
    pub fn totals(&self) -> Vec<(&'static str, i64)> {
        vec![
            ("Subtotal", self.subtotal),
            ("Shipping", self.shipping),
            ("VAT", self.vat),
            ("Total", self.total),
            ("Amount paid", self.amount_paid),
            ("Balance due", self.balance_due()),
        ]
    }

    /// Text runs per page. Rows that would run into the footer margin move to
    /// a new page headed with the invoice number.
    pub fn layout(&self) -> Vec<Vec<TextRun>> {
        let mut pages = Pages::new(format!("{} (continued)", self.invoice_number));
        let money = |cents: i64| format_cents(cents, &self.currency);

        pages.push(run(&self.gallery_name, LEFT, 18.0, true));
        pages.push(run("TAX INVOICE", 150.0, 14.0, true));
        pages.advance(LINE * 2.0);
        pages.push(run(&format!("Invoice: {}", self.invoice_number), LEFT, 10.0, false));
        pages.push(run(&format!("Date: {}", self.issued_at.format("%Y-%m-%d")), 150.0, 10.0, false));
        pages.advance(LINE);
        pages.push(run(&format!("Order: {}", self.order_number), LEFT, 10.0, false));
        pages.advance(LINE * 2.0);

        pages.push(run("Bill to", LEFT, 11.0, true));
        for line in &self.bill_to {
            pages.advance(LINE);
            pages.push(run(line, LEFT, 10.0, false));
        }
        pages.advance(LINE * 2.0);

        pages.push(run("Item", LEFT, 10.0, true));
        pages.push(run("Qty", 120.0, 10.0, true));
        pages.push(run("Unit", 135.0, 10.0, true));
        pages.push(run("Amount", 165.0, 10.0, true));
        for line in &self.lines {
            pages.advance(LINE);
            pages.push(run(&line.description, LEFT, 10.0, false));
            pages.push(run(&line.quantity.to_string(), 120.0, 10.0, false));
            pages.push(run(&money(line.unit_price), 135.0, 10.0, false));
            pages.push(run(&money(line.total), 165.0, 10.0, false));
        }
        pages.advance(LINE * 2.0);

        for (i, (label, amount)) in self.totals().into_iter().enumerate() {
            if i > 0 {
                pages.advance(LINE);
            }
            let bold = matches!(label, "Total" | "Balance due");
            pages.push(run(label, 120.0, 10.0, bold));
            pages.push(run(&money(amount), 165.0, 10.0, bold));
        }

        let mut pages = pages.finish();
        if let Some(last) = pages.last_mut() {
            last.push(TextRun {
                text: format!("Thank you for supporting {}.", self.gallery_name),
                x: LEFT,
                y: FOOTER,
                size: 9.0,
                bold: false,
            });
        }
        pages
    }
}

/// Cursor over A4 pages; `y` is the baseline of the current row.
struct Pages {
    continued: String,
    done: Vec<Vec<TextRun>>,
    current: Vec<TextRun>,
    y: f32,
}

impl Pages {
    fn new(continued: String) -> Self {
        Self { continued, done: Vec::new(), current: Vec::new(), y: TOP }
    }

    fn advance(&mut self, by: f32) {
        self.y -= by;
        if self.y < BOTTOM {
            self.done.push(std::mem::take(&mut self.current));
            self.y = TOP;
            let header = TextRun { text: self.continued.clone(), x: LEFT, y: TOP, size: 10.0, bold: true };
            self.current.push(header);
            self.y -= LINE * 2.0;
        }
    }

    fn push(&mut self, mut text: TextRun) {
        text.y = self.y;
        self.current.push(text);
    }

    fn finish(mut self) -> Vec<Vec<TextRun>> {
        self.done.push(self.current);
        self.done
    }
}

/// A run at the cursor's row; `Pages::push` sets `y`.
fn run(text: &str, x: f32, size: f32, bold: bool) -> TextRun {
    TextRun { text: text.to_string(), x, y: 0.0, size, bold }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use uuid::Uuid;

    fn order() -> Order {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        Order {
            id: Uuid::now_v7(),
            order_number: "ORD-20260301-AB12CD".into(),
            customer_name: "Thandi Nkosi".into(),
            customer_email: "thandi@example.com".into(),
            customer_phone: None,
            shipping_address: json!({"line1": "12 Long St", "city": "Cape Town", "postal_code": "8001", "country": "ZA"}),
            country: "ZA".into(),
            status: "confirmed".into(),
            payment_status: "deposit_paid".into(),
            payment_provider: "yoco".into(),
            payment_mode: "deposit".into(),
            payment_reference: Some("ch_1".into()),
            currency: "ZAR".into(),
            subtotal: 200_000,
            shipping: 15_000,
            vat: 32_250,
            total: 247_250,
            deposit_percentage: Some(30),
            deposit_amount: Some(74_175),
            balance_amount: Some(173_075),
            balance_due_at: None,
            amount_paid: 74_175,
            notes: None,
            tracking_number: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn item(order_id: Uuid) -> OrderItem {
        OrderItem {
            id: Uuid::now_v7(),
            order_id,
            artwork_id: Uuid::now_v7(),
            variant_id: None,
            title: "Still Water".into(),
            variant_name: Some("Oak frame".into()),
            quantity: 1,
            unit_price: 200_000,
            total: 200_000,
            processing_days: 14,
        }
    }

    #[test]
    fn totals_include_balance_due() {
        let order = order();
        let doc = InvoiceDocument::from_order("Gallery", "INV-2026-00001", order.created_at, &order, &[item(order.id)]);
        assert_eq!(doc.balance_due(), 173_075);
        assert_eq!(doc.totals()[3], ("Total", 247_250));
        assert_eq!(doc.lines[0].description, "Still Water (Oak frame)");
        assert_eq!(doc.bill_to, vec!["Thandi Nkosi", "thandi@example.com", "12 Long St", "Cape Town", "8001", "ZA"]);
    }

    #[test]
    fn layout_prints_every_item_and_total() {
        let order = order();
        let doc = InvoiceDocument::from_order("Gallery", "INV-2026-00001", order.created_at, &order, &[item(order.id)]);
        let pages = doc.layout();
        assert_eq!(pages.len(), 1);
        let runs = &pages[0];
        let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
        assert!(texts.contains(&"Invoice: INV-2026-00001"));
        assert!(texts.contains(&"Still Water (Oak frame)"));
        assert!(texts.contains(&"ZAR 2 472.50"));
        assert!(texts.contains(&"ZAR 1 730.75"));
        assert!(runs.iter().all(|r| r.y > 0.0));
    }

    #[test]
    fn long_orders_continue_on_new_pages() {
        let order = order();
        let items: Vec<OrderItem> = (0..60).map(|_| item(order.id)).collect();
        let doc = InvoiceDocument::from_order("Gallery", "INV-2026-00002", order.created_at, &order, &items);
        let pages = doc.layout();

        assert!(pages.len() > 1);
        assert!(pages.iter().flatten().all(|r| r.y >= FOOTER));
        assert_eq!(pages[1][0].text, "INV-2026-00002 (continued)");
        let rows = pages.iter().flatten().filter(|r| r.text == "Still Water (Oak frame)").count();
        assert_eq!(rows, 60);
        let footer = pages.last().and_then(|p| p.last()).map(|r| r.text.as_str());
        assert_eq!(footer, Some("Thank you for supporting Gallery."));
    }
}
