//! Card payments via Stripe Checkout and Yoco Checkout (REST, no SDKs).
//!
//! Both providers follow the same shape: the store creates a hosted checkout
//! for one amount, redirects the customer, and later learns the outcome from a
//! signed webhook. `metadata.order_id` and `metadata.payment_kind` travel with
//! every checkout so the webhook can find the order again.

pub mod stripe;
pub mod yoco;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{StripeConfig, YocoConfig};
use crate::domain::aggregates::{PaymentKind, PaymentProvider};

/// Webhooks older or newer than this are rejected.
pub const WEBHOOK_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("{0} payments are not configured")]
    Disabled(&'static str),

    #[error("{provider} request failed: {source}")]
    Http {
        provider: &'static str,
        source: reqwest::Error,
    },

    #[error("{provider} rejected the request: {message}")]
    Rejected {
        provider: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),
    #[error("malformed signature header")]
    Malformed,
    #[error("webhook secret is not configured")]
    NoSecret,
    #[error("signature mismatch")]
    Mismatch,
    #[error("webhook timestamp outside tolerance")]
    Stale,
}

/// One hosted checkout to create at a provider.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub order_id: Uuid,
    pub order_number: String,
    pub kind: PaymentKind,
    pub amount: i64,
    pub currency: String,
    pub customer_email: String,
    pub description: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentSession {
    pub provider: PaymentProvider,
    /// Provider-side id of the checkout (Stripe session id, Yoco checkout id).
    pub reference: String,
    pub redirect_url: String,
}

/// What a verified webhook means for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Succeeded { order_id: Uuid, kind: PaymentKind, reference: String },
    Failed { order_id: Uuid, reference: String },
    Ignored(String),
}

/// Reads `order_id` / `payment_kind` from a provider metadata object.
pub(crate) fn order_metadata(metadata: &serde_json::Value) -> Option<(Uuid, PaymentKind)> {
    let order_id = metadata.get("order_id")?.as_str()?.parse().ok()?;
    let kind = metadata
        .get("payment_kind")
        .and_then(|k| k.as_str())
        .and_then(|k| k.parse().ok())
        .unwrap_or(PaymentKind::Full);
    Some((order_id, kind))
}

#[derive(Clone)]
pub struct PaymentGateways {
    pub stripe: stripe::StripeClient,
    pub yoco: yoco::YocoClient,
}

impl PaymentGateways {
    pub fn new(http: reqwest::Client, stripe: &StripeConfig, yoco: &YocoConfig) -> Self {
        Self {
            stripe: stripe::StripeClient::new(http.clone(), stripe),
            yoco: yoco::YocoClient::new(http, yoco),
        }
    }

    pub fn is_enabled(&self, provider: PaymentProvider) -> bool {
        match provider {
            PaymentProvider::Stripe => self.stripe.is_enabled(),
            PaymentProvider::Yoco => self.yoco.is_enabled(),
        }
    }

    pub async fn create_checkout(
        &self,
        provider: PaymentProvider,
        request: &CheckoutRequest,
    ) -> Result<PaymentSession, PaymentError> {
        tracing::info!(
            provider = %provider,
            order_id = %request.order_id,
            kind = %request.kind,
            amount = request.amount,
            "Creating provider checkout",
        );
        match provider {
            PaymentProvider::Stripe => self.stripe.create_checkout(request).await,
            PaymentProvider::Yoco => self.yoco.create_checkout(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_order_metadata() {
        let id = Uuid::now_v7();
        let meta = json!({"order_id": id.to_string(), "payment_kind": "deposit"});
        assert_eq!(order_metadata(&meta), Some((id, PaymentKind::Deposit)));
        let no_kind = json!({"order_id": id.to_string()});
        assert_eq!(order_metadata(&no_kind), Some((id, PaymentKind::Full)));
        assert_eq!(order_metadata(&json!({"order_id": "nope"})), None);
    }
}
