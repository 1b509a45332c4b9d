//! Session cart handlers. The session id is an opaque client-generated token.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::checkout::{price_items, ItemRequest, MAX_LINE_QUANTITY};
use crate::db::cart::CartItem;
use crate::db::{ArtworkRepo, CartRepo};
use crate::domain::aggregates::Cart;
use crate::error::{Result, StoreError};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    pub artwork_id: Uuid,
    pub variant_id: Option<Uuid>,
    #[validate(range(min = 1, max = 100))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct QuantityRequest {
    #[validate(range(min = 1, max = 100))]
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    /// `None` for an empty cart.
    pub cart: Option<Cart>,
}

fn check_session(session: &str) -> Result<()> {
    let ok = (8..=128).contains(&session.len())
        && session.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StoreError::Validation("Invalid cart session id".into()))
    }
}

/// Quantity of a line after adding `adding` to what it already holds.
fn merged_quantity(existing: Option<i32>, adding: i32) -> Result<u32> {
    let total = i64::from(existing.unwrap_or(0)) + i64::from(adding);
    if total > i64::from(MAX_LINE_QUANTITY) {
        return Err(StoreError::Validation(format!(
            "A cart line holds at most {MAX_LINE_QUANTITY} pieces, this would make {total}"
        )));
    }
    u32::try_from(total).map_err(|_| StoreError::Validation("Quantity must be positive".into()))
}

/// GET /api/cart/:session
pub async fn get_cart(State(state): State<AppState>, Path(session): Path<String>) -> Result<Json<CartView>> {
    check_session(&session)?;
    let items = CartRepo::list(&state.db, &session).await?;
    if items.is_empty() {
        return Ok(Json(CartView { items, cart: None }));
    }

    let requests: Vec<ItemRequest> = items
        .iter()
        .map(|i| ItemRequest {
            artwork_id: i.artwork_id,
            variant_id: i.variant_id,
            quantity: u32::try_from(i.quantity).unwrap_or(0),
        })
        .collect();
    let mut conn = state.db.acquire().await?;
    let (cart, _) = price_items(&mut conn, &requests, &state.config.pricing.currency, false).await?;
    Ok(Json(CartView { items, cart: Some(cart) }))
}

/// POST /api/cart/:session
///
/// Adds to the line for the same artwork and variant when one exists. The
/// merged line is checked against stock and the per-line cap.
pub async fn add_item(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(input): Json<AddItemRequest>,
) -> Result<impl IntoResponse> {
    check_session(&session)?;
    input.validate()?;

    let mut tx = state.db.begin().await?;
    let artwork = ArtworkRepo::find_by_id(&mut *tx, input.artwork_id)
        .await?
        .ok_or(StoreError::not_found("Artwork"))?;
    let existing = CartRepo::find_line(&mut *tx, &session, input.artwork_id, input.variant_id).await?;
    let merged = merged_quantity(existing.map(|line| line.quantity), input.quantity)?;
    artwork
        .stock_level()
        .ensure_available(merged)
        .map_err(|source| StoreError::Artwork { title: artwork.title.clone(), source })?;

    let cap = i32::try_from(MAX_LINE_QUANTITY).unwrap_or(i32::MAX);
    let item = CartRepo::add(&mut *tx, &session, input.artwork_id, input.variant_id, input.quantity, cap).await?;
    tx.commit().await?;
    tracing::debug!(artwork_id = %input.artwork_id, quantity = item.quantity, "Cart item added");
    Ok((StatusCode::CREATED, Json(item)))
}

/// PATCH /api/cart/:session/items/:item_id
pub async fn update_item(
    State(state): State<AppState>,
    Path((session, item_id)): Path<(String, Uuid)>,
    Json(input): Json<QuantityRequest>,
) -> Result<Json<CartItem>> {
    check_session(&session)?;
    input.validate()?;
    let item = CartRepo::set_quantity(&state.db, &session, item_id, input.quantity)
        .await?
        .ok_or(StoreError::not_found("Cart item"))?;
    Ok(Json(item))
}

/// DELETE /api/cart/:session/items/:item_id
pub async fn remove_item(
    State(state): State<AppState>,
    Path((session, item_id)): Path<(String, Uuid)>,
) -> Result<StatusCode> {
    check_session(&session)?;
    if !CartRepo::remove(&state.db, &session, item_id).await? {
        return Err(StoreError::not_found("Cart item"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/cart/:session
pub async fn clear_cart(State(state): State<AppState>, Path(session): Path<String>) -> Result<StatusCode> {
    check_session(&session)?;
    CartRepo::clear(&state.db, &session).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_opaque_tokens() {
        assert!(check_session("b3f1c2d4-5e6f").is_ok());
        assert!(check_session("short").is_err());
        assert!(check_session("has spaces in it").is_err());
        assert!(check_session(&"x".repeat(129)).is_err());
    }

    #[test]
    fn merged_line_is_capped() {
        assert_eq!(merged_quantity(None, 60).unwrap(), 60);
        assert_eq!(merged_quantity(Some(40), 60).unwrap(), 100);
        assert!(matches!(merged_quantity(Some(60), 60), Err(StoreError::Validation(_))));
    }
}
