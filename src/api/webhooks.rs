//! Payment provider webhooks.
//!
//! The raw body is verified before it is parsed. Deliveries for unknown
//! orders or already-recorded payments are acknowledged with 200 so the
//! provider stops retrying.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::domain::aggregates::PaymentProvider;
use crate::error::{Result, StoreError};
use crate::payments::{stripe, yoco};
use crate::services::fulfilment;
use crate::state::AppState;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn parse_event(body: &[u8]) -> Result<Value> {
    serde_json::from_slice(body).map_err(|e| StoreError::Validation(format!("Invalid webhook payload: {e}")))
}

/// POST /api/webhooks/stripe
pub async fn stripe_webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<Json<Value>> {
    state
        .payments
        .stripe
        .verify_webhook(&body, header(&headers, "stripe-signature"), Utc::now().timestamp())?;

    let event = parse_event(&body)?;
    tracing::info!(event_id = ?event["id"].as_str(), event_type = ?event["type"].as_str(), "Stripe webhook received");
    fulfilment::apply_outcome(&state, PaymentProvider::Stripe, stripe::interpret_event(&event)).await?;
    Ok(Json(json!({"received": true})))
}

/// POST /api/webhooks/yoco
pub async fn yoco_webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<Json<Value>> {
    let signed = yoco::WebhookHeaders {
        id: header(&headers, "webhook-id"),
        timestamp: header(&headers, "webhook-timestamp"),
        signature: header(&headers, "webhook-signature"),
    };
    state.payments.yoco.verify_webhook(&body, signed, Utc::now().timestamp())?;

    let event = parse_event(&body)?;
    tracing::info!(event_id = ?event["id"].as_str(), event_type = ?event["type"].as_str(), "Yoco webhook received");
    fulfilment::apply_outcome(&state, PaymentProvider::Yoco, yoco::interpret_event(&event)).await?;
    Ok(Json(json!({"received": true})))
}
