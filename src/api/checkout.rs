//! Quote, order placement and balance payments.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;
use validator::Validate;

use crate::checkout::{quote as price_quote, PaymentPlan, PricingError, Quote};
use crate::db::artworks::Artwork;
use crate::db::orders::{NewOrder, NewOrderItem, Order as OrderRow};
use crate::db::{ArtworkRepo, CartRepo, OrderRepo, VariantRepo};
use crate::domain::aggregates::{
    order_number, unit_price, Cart, CartLine, Order, PaymentKind, PaymentMode, PaymentProvider, PaymentStatus,
};
use crate::domain::value_objects::Money;
use crate::error::{Result, StoreError};
use crate::payments::{CheckoutRequest, PaymentSession};
use crate::state::AppState;

pub(crate) const MAX_LINE_QUANTITY: u32 = 100;

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ItemRequest {
    pub artwork_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub items: Vec<ItemRequest>,
    pub country: String,
    pub payment_mode: Option<PaymentMode>,
    pub deposit_percentage: Option<u8>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PlaceOrderRequest {
    #[validate(length(min = 1, max = 120))]
    pub customer_name: String,
    #[validate(email)]
    pub customer_email: String,
    #[validate(length(max = 40))]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub shipping_address: serde_json::Value,
    pub country: String,
    /// Explicit items; when empty the session cart is used.
    #[serde(default)]
    pub items: Vec<ItemRequest>,
    #[validate(length(min = 8, max = 128))]
    pub session_id: Option<String>,
    pub payment_provider: PaymentProvider,
    pub payment_mode: Option<PaymentMode>,
    pub deposit_percentage: Option<u8>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub cart: Cart,
    pub quote: Quote,
}

#[derive(Debug, Serialize)]
pub struct PlaceOrderResponse {
    pub order_id: Uuid,
    pub order_number: String,
    pub provider: PaymentProvider,
    pub redirect_url: String,
    pub amount_due: i64,
    pub quote: Quote,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BalanceRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub order_id: Uuid,
    pub order_number: String,
    pub amount_due: i64,
    pub redirect_url: String,
}

fn plan(mode: Option<PaymentMode>, deposit_percentage: Option<u8>) -> PaymentPlan {
    PaymentPlan { mode: mode.unwrap_or(PaymentMode::Full), deposit_percentage }
}

/// Resolves requested items against current catalogue prices.
///
/// With `lock` the artwork rows stay locked until the surrounding transaction ends.
pub(crate) async fn price_items(
    conn: &mut PgConnection,
    items: &[ItemRequest],
    currency: &str,
    lock: bool,
) -> Result<(Cart, HashMap<Uuid, Artwork>)> {
    if items.is_empty() {
        return Err(PricingError::EmptyCart.into());
    }
    if let Some(bad) = items.iter().find(|i| i.quantity == 0 || i.quantity > MAX_LINE_QUANTITY) {
        return Err(StoreError::Validation(format!(
            "Quantity for artwork {} must be between 1 and {MAX_LINE_QUANTITY}",
            bad.artwork_id
        )));
    }

    let mut artwork_ids: Vec<Uuid> = items.iter().map(|i| i.artwork_id).collect();
    artwork_ids.sort();
    artwork_ids.dedup();
    let artworks = if lock {
        ArtworkRepo::lock_many(&mut *conn, &artwork_ids).await?
    } else {
        ArtworkRepo::find_many(&mut *conn, &artwork_ids).await?
    };
    let artworks: HashMap<Uuid, Artwork> = artworks.into_iter().map(|a| (a.id, a)).collect();

    let variant_ids: Vec<Uuid> = items.iter().filter_map(|i| i.variant_id).collect();
    let variants: HashMap<Uuid, _> = if variant_ids.is_empty() {
        HashMap::new()
    } else {
        VariantRepo::find_many(&mut *conn, &variant_ids).await?.into_iter().map(|v| (v.id, v)).collect()
    };

    let mut cart = Cart::new(currency);
    for item in items {
        let artwork = artworks.get(&item.artwork_id).ok_or(StoreError::not_found("Artwork"))?;
        let variant = match item.variant_id {
            None => None,
            Some(variant_id) => match variants.get(&variant_id) {
                Some(v) if v.artwork_id == artwork.id && v.active => Some(v),
                _ => {
                    return Err(StoreError::Validation(format!(
                        "Variant {variant_id} is not available for '{}'",
                        artwork.title
                    )))
                }
            },
        };

        cart.add_line(CartLine {
            artwork_id: artwork.id,
            variant_id: item.variant_id,
            title: artwork.title.clone(),
            variant_name: variant.map(|v| v.name.clone()),
            quantity: item.quantity,
            unit_price: Money::new(unit_price(artwork.price, variant.map(|v| v.price_adjustment)), currency),
            processing_days: variant.map(|v| v.processing_days).unwrap_or(0),
        });
    }

    Ok((cart, artworks))
}

/// 409 when any artwork is sold, reserved or short on stock for the cart.
pub(crate) fn ensure_in_stock(cart: &Cart, artworks: &HashMap<Uuid, Artwork>) -> Result<()> {
    for artwork in artworks.values() {
        artwork
            .stock_level()
            .ensure_available(cart.quantity_for(artwork.id))
            .map_err(|source| StoreError::Artwork { title: artwork.title.clone(), source })?;
    }
    Ok(())
}

/// POST /api/checkout/quote
pub async fn quote(State(state): State<AppState>, Json(input): Json<QuoteRequest>) -> Result<Json<QuoteResponse>> {
    let pricing = &state.config.pricing;
    let mut conn = state.db.acquire().await?;
    let (cart, _) = price_items(&mut conn, &input.items, &pricing.currency, false).await?;

    let quote = price_quote(
        pricing,
        cart.subtotal().cents(),
        cart.processing_days(),
        &input.country,
        plan(input.payment_mode, input.deposit_percentage),
        Utc::now(),
    )?;
    Ok(Json(QuoteResponse { cart, quote }))
}

fn checkout_request(state: &AppState, order: &OrderRow, kind: PaymentKind, amount: i64) -> CheckoutRequest {
    let site = &state.config.public_site_url;
    let description = match kind {
        PaymentKind::Full => format!("Order {}", order.order_number),
        PaymentKind::Deposit => format!("Deposit for order {}", order.order_number),
        PaymentKind::Balance => format!("Balance for order {}", order.order_number),
    };
    CheckoutRequest {
        order_id: order.id,
        order_number: order.order_number.clone(),
        kind,
        amount,
        currency: order.currency.clone(),
        customer_email: order.customer_email.clone(),
        description,
        success_url: format!("{site}/checkout/success?order={}", order.order_number),
        cancel_url: format!("{site}/checkout/cancelled?order={}", order.order_number),
    }
}

async fn start_payment(
    state: &AppState,
    provider: PaymentProvider,
    order: &OrderRow,
    kind: PaymentKind,
    amount: i64,
) -> Result<PaymentSession> {
    let request = checkout_request(state, order, kind, amount);
    let session = state.payments.create_checkout(provider, &request).await.map_err(|e| {
        tracing::error!(order_id = %order.id, provider = %provider, error = %e, "Payment session failed");
        e
    })?;
    OrderRepo::set_payment_reference(&state.db, order.id, &session.reference).await?;
    Ok(session)
}

/// POST /api/checkout
///
/// Prices and stock-checks the items, records the order and its lines in one
/// transaction, then opens a provider payment session for the amount due now.
/// Stock is only taken once the provider confirms payment.
pub async fn place_order(
    State(state): State<AppState>,
    Json(input): Json<PlaceOrderRequest>,
) -> Result<impl IntoResponse> {
    input.validate()?;
    if !state.payments.is_enabled(input.payment_provider) {
        return Err(crate::payments::PaymentError::Disabled(input.payment_provider.as_str()).into());
    }

    let items = if input.items.is_empty() {
        match input.session_id.as_deref() {
            Some(session) => CartRepo::list(&state.db, session)
                .await?
                .into_iter()
                .map(|i| ItemRequest {
                    artwork_id: i.artwork_id,
                    variant_id: i.variant_id,
                    quantity: u32::try_from(i.quantity).unwrap_or(0),
                })
                .collect(),
            None => Vec::new(),
        }
    } else {
        input.items.clone()
    };

    let pricing = &state.config.pricing;
    let now = Utc::now();
    let mut tx = state.db.begin().await?;

    let (cart, artworks) = price_items(&mut tx, &items, &pricing.currency, true).await?;
    ensure_in_stock(&cart, &artworks)?;
    let quote = price_quote(
        pricing,
        cart.subtotal().cents(),
        cart.processing_days(),
        &input.country,
        plan(input.payment_mode, input.deposit_percentage),
        now,
    )?;

    let order_id = Uuid::now_v7();
    let number = order_number(now.date_naive(), &mut rand::thread_rng());
    let mode = if quote.deposit.is_some() { PaymentMode::Deposit } else { PaymentMode::Full };
    let new_order = NewOrder {
        id: order_id,
        order_number: number.clone(),
        customer_name: input.customer_name.trim().to_string(),
        customer_email: input.customer_email.trim().to_lowercase(),
        customer_phone: input.customer_phone.clone(),
        shipping_address: input.shipping_address.clone(),
        country: input.country.trim().to_uppercase(),
        payment_provider: input.payment_provider.as_str().to_string(),
        payment_mode: mode.as_str().to_string(),
        currency: quote.currency.clone(),
        subtotal: quote.subtotal,
        shipping: quote.shipping,
        vat: quote.vat,
        total: quote.total,
        deposit_percentage: quote.deposit.as_ref().map(|d| i16::from(d.percentage)),
        deposit_amount: quote.deposit.as_ref().map(|d| d.deposit_amount),
        balance_amount: quote.deposit.as_ref().map(|d| d.balance_amount),
        balance_due_at: quote.deposit.as_ref().map(|d| d.balance_due_at),
        notes: input.notes.clone(),
    };
    let order = OrderRepo::insert(&mut *tx, &new_order).await?;
    for line in cart.lines() {
        let item = NewOrderItem {
            artwork_id: line.artwork_id,
            variant_id: line.variant_id,
            title: line.title.clone(),
            variant_name: line.variant_name.clone(),
            quantity: i32::try_from(line.quantity).unwrap_or(i32::MAX),
            unit_price: line.unit_price.cents(),
            processing_days: line.processing_days,
        };
        OrderRepo::insert_item(&mut *tx, order.id, &item).await?;
    }
    OrderRepo::add_update(&mut *tx, order.id, "pending", Some("Order placed")).await?;
    tx.commit().await?;

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        total = order.total,
        provider = %input.payment_provider,
        mode = %mode,
        "Order placed",
    );
    let mut lifecycle = Order::place(order.id, &order.order_number, order.total);
    state.events.publish_all(lifecycle.take_events()).await;

    let kind = if mode == PaymentMode::Deposit { PaymentKind::Deposit } else { PaymentKind::Full };
    let amount_due = quote.amount_due_now();
    let session = start_payment(&state, input.payment_provider, &order, kind, amount_due).await?;

    if let Some(session_id) = input.session_id.as_deref() {
        CartRepo::clear(&state.db, session_id).await?;
    }

    Ok((
        StatusCode::CREATED,
        Json(PlaceOrderResponse {
            order_id: order.id,
            order_number: order.order_number,
            provider: input.payment_provider,
            redirect_url: session.redirect_url,
            amount_due,
            quote,
        }),
    ))
}

/// POST /api/orders/:id/balance
///
/// Opens a payment session for the outstanding balance of a deposit-paid order.
/// The customer's email must match the order.
pub async fn pay_balance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<BalanceRequest>,
) -> Result<Json<BalanceResponse>> {
    input.validate()?;
    let order = OrderRepo::find_by_id(&state.db, id)
        .await?
        .filter(|o| o.customer_email.eq_ignore_ascii_case(input.email.trim()))
        .ok_or(StoreError::not_found("Order"))?;

    let lifecycle = order.lifecycle()?;
    if lifecycle.payment_status() != PaymentStatus::DepositPaid {
        return Err(StoreError::Conflict(format!(
            "Order {} has payment status {}, no balance is due",
            order.order_number,
            lifecycle.payment_status()
        )));
    }
    if lifecycle.status().is_terminal() {
        return Err(StoreError::Conflict(format!("Order {} is {}", order.order_number, lifecycle.status())));
    }

    let provider: PaymentProvider = order.payment_provider.parse()?;
    let amount_due = order.balance_amount.unwrap_or_else(|| order.amount_outstanding());
    let session = start_payment(&state, provider, &order, PaymentKind::Balance, amount_due).await?;

    tracing::info!(order_id = %order.id, amount_due, provider = %provider, "Balance payment started");
    Ok(Json(BalanceResponse {
        order_id: order.id,
        order_number: order.order_number,
        amount_due,
        redirect_url: session.redirect_url,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::ArtworkError;
    use chrono::Utc;

    fn artwork(stock: i32, status: &str) -> Artwork {
        Artwork {
            id: Uuid::now_v7(),
            title: "Still Water".into(),
            slug: "still-water".into(),
            description: None,
            medium: None,
            dimensions: None,
            year: None,
            scale: "medium".into(),
            price: 100_000,
            stock,
            images: vec![],
            status: status.into(),
            featured: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn cart_for(artwork: &Artwork, quantity: u32) -> Cart {
        let mut cart = Cart::new("ZAR");
        cart.add_line(CartLine {
            artwork_id: artwork.id,
            variant_id: None,
            title: artwork.title.clone(),
            variant_name: None,
            quantity,
            unit_price: Money::new(artwork.price, "ZAR"),
            processing_days: 0,
        });
        cart
    }

    #[test]
    fn stock_check_reports_the_artwork() {
        let piece = artwork(1, "available");
        let cart = cart_for(&piece, 2);
        let artworks = HashMap::from([(piece.id, piece)]);
        match ensure_in_stock(&cart, &artworks) {
            Err(StoreError::Artwork { title, source }) => {
                assert_eq!(title, "Still Water");
                assert_eq!(source, ArtworkError::InsufficientStock { requested: 2, in_stock: 1 });
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn sold_artwork_is_unavailable() {
        let piece = artwork(0, "sold");
        let cart = cart_for(&piece, 1);
        let artworks = HashMap::from([(piece.id, piece)]);
        assert!(matches!(ensure_in_stock(&cart, &artworks), Err(StoreError::Artwork { source: ArtworkError::Sold, .. })));
    }

    #[test]
    fn plan_defaults_to_full() {
        assert_eq!(plan(None, None).mode, PaymentMode::Full);
        assert_eq!(plan(Some(PaymentMode::Deposit), Some(40)).deposit_percentage, Some(40));
    }
}
