//! Order tracking (public) and order management (admin).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::RequireAdmin;
use crate::db::invoices::OrderInvoice;
use crate::db::orders::{Order, OrderFilter, OrderItem, OrderUpdate};
use crate::db::{InvoiceRepo, OrderRepo, PageParams, PaginatedResponse};
use crate::domain::aggregates::{OrderStatus, PaymentStatus};
use crate::error::{Result, StoreError};
use crate::services::{email, fulfilment};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub updates: Vec<OrderUpdate>,
    pub invoices: Vec<OrderInvoice>,
}

async fn load_detail(state: &AppState, order: Order) -> Result<OrderDetail> {
    let items = OrderRepo::items(&state.db, order.id).await?;
    let updates = OrderRepo::updates(&state.db, order.id).await?;
    let invoices = InvoiceRepo::list_for_order(&state.db, order.id).await?;
    Ok(OrderDetail { order, items, updates, invoices })
}

#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub order_number: String,
    pub email: String,
}

/// GET /api/orders/track?order_number=&email=
///
/// Both must match; a mismatch is indistinguishable from an unknown order.
pub async fn track_order(State(state): State<AppState>, Query(query): Query<TrackQuery>) -> Result<Json<OrderDetail>> {
    if query.order_number.trim().is_empty() || query.email.trim().is_empty() {
        return Err(StoreError::Validation("order_number and email are required".into()));
    }
    let order = OrderRepo::find_for_tracking(&state.db, &query.order_number, &query.email)
        .await?
        .ok_or(StoreError::not_found("Order"))?;
    Ok(Json(load_detail(&state, order).await?))
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// GET /api/admin/orders
pub async fn list_orders(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<PaginatedResponse<Order>>> {
    let page = PageParams { page: query.page, per_page: query.per_page };
    let filter = OrderFilter {
        status: query.status,
        payment_status: query.payment_status,
        search: query.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
    };
    let orders = OrderRepo::list(&state.db, &filter, page.limit(), page.offset()).await?;
    let total = OrderRepo::count(&state.db, &filter).await?;
    Ok(Json(PaginatedResponse::new(orders, total, page)))
}

/// GET /api/admin/orders/:id
pub async fn get_order(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderDetail>> {
    let order = OrderRepo::find_by_id(&state.db, id).await?.ok_or(StoreError::not_found("Order"))?;
    Ok(Json(load_detail(&state, order).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct StatusChange {
    pub status: OrderStatus,
    #[validate(length(max = 2000))]
    pub message: Option<String>,
    #[validate(length(min = 1, max = 120))]
    pub tracking_number: Option<String>,
}

/// PATCH /api/admin/orders/:id/status
///
/// 409 when the status is unchanged or the order is already delivered or
/// cancelled. Cancelling an order that holds stock puts the stock back.
pub async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<StatusChange>,
) -> Result<Json<Order>> {
    input.validate()?;

    let mut tx = state.db.begin().await?;
    let row = OrderRepo::lock(&mut *tx, id).await?.ok_or(StoreError::not_found("Order"))?;
    let mut order = row.lifecycle()?;
    let previous = order.set_status(input.status)?;

    if input.status == OrderStatus::Cancelled && order.payment_status().holds_stock() {
        fulfilment::restock(&mut tx, id).await?;
    }
    let saved = OrderRepo::save_status(&mut *tx, &order, input.tracking_number.as_deref()).await?;
    OrderRepo::add_update(&mut *tx, id, input.status.as_str(), input.message.as_deref()).await?;
    tx.commit().await?;

    tracing::info!(
        order_id = %id,
        from = %previous,
        to = %input.status,
        admin = %admin.email,
        "Order status changed",
    );
    state.events.publish_all(order.take_events()).await;
    state
        .mailer
        .send_or_log(email::order_status_changed(
            &state.config.gallery_name,
            &saved.customer_email,
            &saved.order_number,
            input.status.as_str(),
            input.message.as_deref(),
            saved.tracking_number.as_deref(),
        ))
        .await;

    Ok(Json(saved))
}

/// POST /api/admin/orders/:id/invoice
///
/// Issues a new invoice with the next number; earlier invoices are kept.
pub async fn generate_invoice(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let order = OrderRepo::find_by_id(&state.db, id).await?.ok_or(StoreError::not_found("Order"))?;
    let invoice = crate::invoice::issue(&state, &order, Utc::now()).await?;
    tracing::info!(order_id = %id, invoice_number = %invoice.invoice_number, admin = %admin.email, "Invoice regenerated");
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// GET /api/admin/orders/:id/invoices
pub async fn list_invoices(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<OrderInvoice>>> {
    OrderRepo::find_by_id(&state.db, id).await?.ok_or(StoreError::not_found("Order"))?;
    Ok(Json(InvoiceRepo::list_for_order(&state.db, id).await?))
}
