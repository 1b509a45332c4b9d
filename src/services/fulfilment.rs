//! What happens to an order, its stock and its customer once a provider
//! reports a payment outcome or an admin cancels it.
//!
//! Every row change for one outcome happens in a single transaction holding
//! the order lock. Emails, events and invoices follow the commit and only log
//! their failures.

use std::collections::HashMap;

use reqwest::Url;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::db::orders::{Order as OrderRow, OrderItem};
use crate::db::{ArtworkRepo, OrderRepo};
use crate::domain::aggregates::{PaymentKind, PaymentProvider, PaymentStatus};
use crate::error::Result;
use crate::payments::WebhookOutcome;
use crate::services::email;
use crate::state::AppState;

/// Pieces per artwork across an order's lines.
pub fn quantities_by_artwork(items: &[OrderItem]) -> HashMap<Uuid, u32> {
    let mut quantities = HashMap::new();
    for item in items {
        *quantities.entry(item.artwork_id).or_insert(0) += u32::try_from(item.quantity).unwrap_or(0);
    }
    quantities
}

/// Amount a confirmed charge of `kind` adds to `amount_paid`.
pub fn charge_amount(order: &OrderRow, kind: PaymentKind) -> i64 {
    match kind {
        PaymentKind::Full => order.total,
        PaymentKind::Deposit => order.deposit_amount.unwrap_or(order.total),
        PaymentKind::Balance => order.balance_amount.unwrap_or_else(|| order.amount_outstanding()),
    }
}

/// An artwork a charge took more pieces of than were left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Oversold {
    pub artwork_id: Uuid,
    pub title: String,
    pub missing: u32,
}

/// Order update note listing oversold artworks, if any.
pub fn oversold_note(oversold: &[Oversold]) -> Option<String> {
    if oversold.is_empty() {
        return None;
    }
    let pieces: Vec<String> = oversold.iter().map(|o| format!("{} (short by {})", o.title, o.missing)).collect();
    Some(format!("Oversold, refund required: {}", pieces.join(", ")))
}

/// Applies the stock effect of a charge to every artwork on the order and
/// reports the artworks it could not fully cover.
async fn take_stock(
    conn: &mut PgConnection,
    order_id: Uuid,
    items: &[OrderItem],
    kind: PaymentKind,
) -> Result<Vec<Oversold>> {
    let quantities = quantities_by_artwork(items);
    let ids: Vec<Uuid> = quantities.keys().copied().collect();
    let mut oversold = Vec::new();
    for artwork in ArtworkRepo::lock_many(&mut *conn, &ids).await? {
        let quantity = quantities.get(&artwork.id).copied().unwrap_or(0);
        let current = artwork.stock_level();
        let missing = current.shortfall(quantity, kind);
        if missing > 0 {
            tracing::warn!(order_id = %order_id, artwork_id = %artwork.id, missing, "Oversold");
            oversold.push(Oversold { artwork_id: artwork.id, title: artwork.title.clone(), missing });
        }
        let level = current.after_payment(quantity, kind);
        ArtworkRepo::set_stock(&mut *conn, artwork.id, level).await?;
        tracing::debug!(artwork_id = %artwork.id, stock = level.stock, status = %level.status, "Stock updated");
    }
    Ok(oversold)
}

/// Storefront link that opens tracking for one order.
pub fn tracking_url(site_url: &str, order_number: &str, email: &str) -> String {
    let base = format!("{site_url}/orders/track");
    match Url::parse_with_params(&base, [("order_number", order_number), ("email", email)]) {
        Ok(url) => url.into(),
        Err(e) => {
            tracing::warn!(error = %e, site_url, "Invalid storefront URL for tracking link");
            base
        }
    }
}

/// Returns stock held by a paid or deposit-paid order being cancelled.
pub async fn restock(conn: &mut PgConnection, order_id: Uuid) -> Result<()> {
    let items = OrderRepo::items(&mut *conn, order_id).await?;
    let quantities = quantities_by_artwork(&items);
    let ids: Vec<Uuid> = quantities.keys().copied().collect();
    for artwork in ArtworkRepo::lock_many(&mut *conn, &ids).await? {
        let quantity = quantities.get(&artwork.id).copied().unwrap_or(0);
        ArtworkRepo::set_stock(&mut *conn, artwork.id, artwork.stock_level().after_restock(quantity)).await?;
    }
    tracing::info!(order_id = %order_id, artworks = ids.len(), "Stock restored");
    Ok(())
}

/// Routes a verified webhook outcome.
pub async fn apply_outcome(state: &AppState, provider: PaymentProvider, outcome: WebhookOutcome) -> Result<()> {
    match outcome {
        WebhookOutcome::Succeeded { order_id, kind, reference } => {
            record_payment(state, provider, order_id, kind, &reference).await
        }
        WebhookOutcome::Failed { order_id, reference } => record_failure(state, provider, order_id, &reference).await,
        WebhookOutcome::Ignored(reason) => {
            tracing::debug!(provider = %provider, reason = %reason, "Webhook event ignored");
            Ok(())
        }
    }
}

pub async fn record_payment(
    state: &AppState,
    provider: PaymentProvider,
    order_id: Uuid,
    kind: PaymentKind,
    reference: &str,
) -> Result<()> {
    let mut tx = state.db.begin().await?;
    let Some(row) = OrderRepo::lock(&mut *tx, order_id).await? else {
        tracing::warn!(order_id = %order_id, provider = %provider, "Payment for unknown order");
        return Ok(());
    };

    let mut order = row.lifecycle()?;
    match order.record_payment(kind) {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!(order_id = %order_id, kind = %kind, "Payment already recorded");
            return Ok(());
        }
        Err(e) => {
            tracing::warn!(order_id = %order_id, kind = %kind, error = %e, "Payment not applied");
            return Ok(());
        }
    }

    let items = OrderRepo::items(&mut *tx, order_id).await?;
    let oversold = take_stock(&mut tx, order_id, &items, kind).await?;
    let saved = OrderRepo::save_payment(&mut *tx, &order, charge_amount(&row, kind), reference).await?;
    let message = match kind {
        PaymentKind::Full => "Payment received",
        PaymentKind::Deposit => "Deposit received",
        PaymentKind::Balance => "Balance received",
    };
    OrderRepo::add_update(&mut *tx, order_id, &saved.status, Some(message)).await?;
    if let Some(note) = oversold_note(&oversold) {
        OrderRepo::add_update(&mut *tx, order_id, &saved.status, Some(&note)).await?;
    }
    tx.commit().await?;

    tracing::info!(
        order_id = %order_id,
        provider = %provider,
        kind = %kind,
        payment_status = %saved.payment_status,
        amount_paid = saved.amount_paid,
        "Payment recorded",
    );
    state.events.publish_all(order.take_events()).await;

    let config = &state.config;
    let track_url = tracking_url(&config.public_site_url, &saved.order_number, &saved.customer_email);
    state
        .mailer
        .send_or_log(email::order_received(
            &config.gallery_name,
            &saved.customer_email,
            &saved.order_number,
            saved.total,
            &saved.currency,
            &track_url,
        ))
        .await;

    if order.payment_status() == PaymentStatus::Paid {
        crate::invoice::issue_or_log(state, &saved).await;
    }
    Ok(())
}

pub async fn record_failure(state: &AppState, provider: PaymentProvider, order_id: Uuid, reference: &str) -> Result<()> {
    let mut tx = state.db.begin().await?;
    let Some(row) = OrderRepo::lock(&mut *tx, order_id).await? else {
        tracing::warn!(order_id = %order_id, provider = %provider, "Payment failure for unknown order");
        return Ok(());
    };

    let mut order = row.lifecycle()?;
    if !order.record_payment_failure() {
        tracing::info!(order_id = %order_id, payment_status = %row.payment_status, "Payment failure ignored");
        return Ok(());
    }
    OrderRepo::save_status(&mut *tx, &order, None).await?;
    OrderRepo::add_update(&mut *tx, order_id, &row.status, Some("Payment failed")).await?;
    tx.commit().await?;

    tracing::warn!(order_id = %order_id, provider = %provider, reference, "Payment failed");
    state.events.publish_all(order.take_events()).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(artwork_id: Uuid, quantity: i32) -> OrderItem {
        OrderItem {
            id: Uuid::now_v7(),
            order_id: Uuid::nil(),
            artwork_id,
            variant_id: None,
            title: "Untitled".into(),
            variant_name: None,
            quantity,
            unit_price: 1_000,
            total: 1_000 * i64::from(quantity),
            processing_days: 0,
        }
    }

    fn order(total: i64, deposit: Option<(i64, i64)>, amount_paid: i64) -> OrderRow {
        let now = Utc::now();
        OrderRow {
            id: Uuid::now_v7(),
            order_number: "ORD-20260301-AAAAAA".into(),
            customer_name: "Buyer".into(),
            customer_email: "buyer@example.com".into(),
            customer_phone: None,
            shipping_address: serde_json::json!({}),
            country: "ZA".into(),
            status: "pending".into(),
            payment_status: "pending".into(),
            payment_provider: "stripe".into(),
            payment_mode: if deposit.is_some() { "deposit" } else { "full" }.into(),
            payment_reference: None,
            currency: "ZAR".into(),
            subtotal: total,
            shipping: 0,
            vat: 0,
            total,
            deposit_percentage: deposit.map(|_| 30),
            deposit_amount: deposit.map(|d| d.0),
            balance_amount: deposit.map(|d| d.1),
            balance_due_at: None,
            amount_paid,
            notes: None,
            tracking_number: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn quantities_sum_across_variants() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let quantities = quantities_by_artwork(&[item(a, 1), item(b, 2), item(a, 3)]);
        assert_eq!(quantities[&a], 4);
        assert_eq!(quantities[&b], 2);
    }

    #[test]
    fn charge_amount_per_kind() {
        let full = order(247_250, None, 0);
        assert_eq!(charge_amount(&full, PaymentKind::Full), 247_250);

        let deposit = order(247_250, Some((74_175, 173_075)), 74_175);
        assert_eq!(charge_amount(&deposit, PaymentKind::Deposit), 74_175);
        assert_eq!(charge_amount(&deposit, PaymentKind::Balance), 173_075);
    }

    #[test]
    fn oversold_artworks_become_an_order_note() {
        assert_eq!(oversold_note(&[]), None);
        let note = oversold_note(&[Oversold { artwork_id: Uuid::now_v7(), title: "Tidal Study".into(), missing: 1 }]);
        assert_eq!(note.as_deref(), Some("Oversold, refund required: Tidal Study (short by 1)"));
    }

    #[test]
    fn tracking_url_keeps_plus_addressed_email() {
        let link = tracking_url("https://gallery.test", "ORD-20260301-AB12CD", "ana+art@example.com");
        assert!(link.starts_with("https://gallery.test/orders/track?"));
        assert!(link.contains("email=ana%2Bart%40example.com"));

        let url = Url::parse(&link).unwrap();
        let email = url.query_pairs().find(|(k, _)| k == "email").map(|(_, v)| v.into_owned());
        assert_eq!(email.as_deref(), Some("ana+art@example.com"));
    }

    #[test]
    fn tracking_url_falls_back_on_bad_site_url() {
        assert_eq!(tracking_url("not a url", "ORD-1", "a@b.test"), "not a url/orders/track");
    }
}
