//! Yoco Checkout API and webhook verification.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use super::{order_metadata, CheckoutRequest, PaymentError, PaymentSession, SignatureError, WebhookOutcome, WEBHOOK_TOLERANCE_SECS};
use crate::config::YocoConfig;
use crate::domain::aggregates::PaymentProvider;

const CHECKOUT_URL: &str = "https://payments.yoco.com/api/checkouts";
const PROVIDER: &str = "yoco";

/// Headers carried by a Yoco webhook delivery.
#[derive(Debug, Clone, Copy)]
pub struct WebhookHeaders<'a> {
    pub id: Option<&'a str>,
    pub timestamp: Option<&'a str>,
    pub signature: Option<&'a str>,
}

#[derive(Clone)]
pub struct YocoClient {
    http: reqwest::Client,
    secret_key: String,
    webhook_secret: String,
}

impl YocoClient {
    pub fn new(http: reqwest::Client, config: &YocoConfig) -> Self {
        Self {
            http,
            secret_key: config.secret_key.clone(),
            webhook_secret: config.webhook_secret.clone(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.secret_key.is_empty()
    }

    pub async fn create_checkout(&self, request: &CheckoutRequest) -> Result<PaymentSession, PaymentError> {
        if !self.is_enabled() {
            return Err(PaymentError::Disabled(PROVIDER));
        }

        let resp: serde_json::Value = self
            .http
            .post(CHECKOUT_URL)
            .bearer_auth(&self.secret_key)
            .header("Idempotency-Key", format!("{}-{}", request.order_id, request.kind))
            .json(&checkout_body(request))
            .send()
            .await
            .map_err(|source| PaymentError::Http { provider: PROVIDER, source })?
            .json()
            .await
            .map_err(|source| PaymentError::Http { provider: PROVIDER, source })?;

        match (resp["id"].as_str(), resp["redirectUrl"].as_str()) {
            (Some(id), Some(url)) => Ok(PaymentSession {
                provider: PaymentProvider::Yoco,
                reference: id.to_string(),
                redirect_url: url.to_string(),
            }),
            _ => Err(PaymentError::Rejected {
                provider: PROVIDER,
                message: resp["description"]
                    .as_str()
                    .or_else(|| resp["message"].as_str())
                    .unwrap_or("no checkout in response")
                    .to_string(),
            }),
        }
    }

    pub fn verify_webhook(&self, payload: &[u8], headers: WebhookHeaders<'_>, now: i64) -> Result<(), SignatureError> {
        if self.webhook_secret.is_empty() {
            return Err(SignatureError::NoSecret);
        }
        verify_signature(payload, headers, &self.webhook_secret, now)
    }
}

fn checkout_body(request: &CheckoutRequest) -> serde_json::Value {
    json!({
        "amount": request.amount,
        "currency": request.currency.to_uppercase(),
        "successUrl": request.success_url,
        "cancelUrl": request.cancel_url,
        "failureUrl": request.cancel_url,
        "metadata": {
            "order_id": request.order_id.to_string(),
            "order_number": request.order_number,
            "payment_kind": request.kind.as_str(),
            "customer_email": request.customer_email,
        },
    })
}

/// Signed content is `"{webhook-id}.{webhook-timestamp}.{body}"`, keyed with the
/// base64 part of the `whsec_` secret; the header holds space-separated `v1,<base64>` entries.
pub fn verify_signature(payload: &[u8], headers: WebhookHeaders<'_>, secret: &str, now: i64) -> Result<(), SignatureError> {
    let id = headers.id.ok_or(SignatureError::MissingHeader("webhook-id"))?;
    let timestamp = headers.timestamp.ok_or(SignatureError::MissingHeader("webhook-timestamp"))?;
    let signature = headers.signature.ok_or(SignatureError::MissingHeader("webhook-signature"))?;

    let key = STANDARD
        .decode(secret.strip_prefix("whsec_").unwrap_or(secret))
        .map_err(|_| SignatureError::NoSecret)?;

    let matched = signature
        .split_whitespace()
        .filter_map(|entry| entry.strip_prefix("v1,"))
        .filter_map(|sig| STANDARD.decode(sig).ok())
        .any(|sig_bytes| {
            let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&key) else { return false };
            mac.update(id.as_bytes());
            mac.update(b".");
            mac.update(timestamp.as_bytes());
            mac.update(b".");
            mac.update(payload);
            mac.verify_slice(&sig_bytes).is_ok()
        });
    if !matched {
        return Err(SignatureError::Mismatch);
    }

    let ts: i64 = timestamp.parse().map_err(|_| SignatureError::Malformed)?;
    if (now - ts).abs() > WEBHOOK_TOLERANCE_SECS {
        return Err(SignatureError::Stale);
    }
    Ok(())
}

/// Map a verified Yoco event to a store outcome.
pub fn interpret_event(event: &serde_json::Value) -> WebhookOutcome {
    let event_type = event["type"].as_str().unwrap_or_default();
    let payload = &event["payload"];
    let reference = payload["metadata"]["checkoutId"]
        .as_str()
        .or_else(|| payload["id"].as_str())
        .unwrap_or_default()
        .to_string();
    let Some((order_id, kind)) = order_metadata(&payload["metadata"]) else {
        return WebhookOutcome::Ignored(format!("{event_type} without order metadata"));
    };

    match event_type {
        "payment.succeeded" => WebhookOutcome::Succeeded { order_id, kind, reference },
        "payment.failed" => WebhookOutcome::Failed { order_id, reference },
        other => WebhookOutcome::Ignored(other.to_string()),
    }
}
