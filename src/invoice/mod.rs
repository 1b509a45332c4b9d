//! Invoice PDFs: numbering, layout, rendering and storage.
//!
//! An invoice is a single A4 page laid out from the order row and its items,
//! uploaded to the invoices bucket at `{order_number}/{invoice_number}.pdf`
//! and recorded in `order_invoices`.

mod layout;
mod render;

pub use layout::{InvoiceDocument, InvoiceLine, TextRun};
pub use render::{render_pdf, RenderError};

use chrono::{DateTime, Datelike, Utc};

use crate::db::invoices::{InvoiceRepo, OrderInvoice};
use crate::db::orders::{Order, OrderRepo};
use crate::error::{Result, StoreError};
use crate::state::AppState;

/// `INV-2026-00042`
pub fn invoice_number(year: i32, sequence: i64) -> String {
    format!("INV-{year}-{sequence:05}")
}

pub fn storage_path(order_number: &str, invoice_number: &str) -> String {
    format!("{order_number}/{invoice_number}.pdf")
}

/// Numbers, renders, uploads and records a fresh invoice for `order`.
pub async fn issue(state: &AppState, order: &Order, now: DateTime<Utc>) -> Result<OrderInvoice> {
    let items = OrderRepo::items(&state.db, order.id).await?;
    let sequence = InvoiceRepo::next_sequence(&state.db).await?;
    let number = invoice_number(now.year(), sequence);

    let document = InvoiceDocument::from_order(&state.config.gallery_name, &number, now, order, &items);
    let bytes = render_pdf(&document).map_err(|e| StoreError::Internal(format!("invoice {number}: {e}")))?;

    let path = storage_path(&order.order_number, &number);
    let stored = state
        .storage
        .upload(&state.config.supabase.invoice_bucket, &path, bytes, "application/pdf")
        .await?;

    let invoice =
        InvoiceRepo::insert(&state.db, order.id, &number, &stored.path, &stored.public_url, order.total).await?;
    tracing::info!(order_id = %order.id, invoice_number = %number, "Invoice issued");
    Ok(invoice)
}

/// Post-payment invoicing; failures are logged and never fail the caller.
pub async fn issue_or_log(state: &AppState, order: &Order) {
    if let Err(e) = issue(state, order, Utc::now()).await {
        tracing::warn!(order_id = %order.id, error = %e, "Invoice generation failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_zero_padded() {
        assert_eq!(invoice_number(2026, 42), "INV-2026-00042");
        assert_eq!(invoice_number(2026, 123_456), "INV-2026-123456");
    }

    #[test]
    fn path_groups_by_order() {
        assert_eq!(storage_path("ORD-20260301-AB12CD", "INV-2026-00001"), "ORD-20260301-AB12CD/INV-2026-00001.pdf");
    }
}
