//! Stripe Checkout Sessions and webhook verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::{order_metadata, CheckoutRequest, PaymentError, PaymentSession, SignatureError, WebhookOutcome, WEBHOOK_TOLERANCE_SECS};
use crate::config::StripeConfig;
use crate::domain::aggregates::PaymentProvider;

const API_BASE: &str = "https://api.stripe.com/v1";
const PROVIDER: &str = "stripe";

#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    webhook_secret: String,
}

impl StripeClient {
    pub fn new(http: reqwest::Client, config: &StripeConfig) -> Self {
        Self {
            http,
            secret_key: config.secret_key.clone(),
            webhook_secret: config.webhook_secret.clone(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.secret_key.is_empty()
    }

    /// Create a one-line Checkout Session in payment mode.
    pub async fn create_checkout(&self, request: &CheckoutRequest) -> Result<PaymentSession, PaymentError> {
        if !self.is_enabled() {
            return Err(PaymentError::Disabled(PROVIDER));
        }

        let resp: serde_json::Value = self
            .http
            .post(format!("{API_BASE}/checkout/sessions"))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&checkout_form(request))
            .send()
            .await
            .map_err(|source| PaymentError::Http { provider: PROVIDER, source })?
            .json()
            .await
            .map_err(|source| PaymentError::Http { provider: PROVIDER, source })?;

        match (resp["id"].as_str(), resp["url"].as_str()) {
            (Some(id), Some(url)) => Ok(PaymentSession {
                provider: PaymentProvider::Stripe,
                reference: id.to_string(),
                redirect_url: url.to_string(),
            }),
            _ => Err(PaymentError::Rejected {
                provider: PROVIDER,
                message: resp["error"]["message"].as_str().unwrap_or("no session in response").to_string(),
            }),
        }
    }

    pub fn verify_webhook(&self, payload: &[u8], sig_header: Option<&str>, now: i64) -> Result<(), SignatureError> {
        if self.webhook_secret.is_empty() {
            return Err(SignatureError::NoSecret);
        }
        let header = sig_header.ok_or(SignatureError::MissingHeader("Stripe-Signature"))?;
        verify_signature(payload, header, &self.webhook_secret, now)
    }
}

fn checkout_form(request: &CheckoutRequest) -> Vec<(&'static str, String)> {
    vec![
        ("mode", "payment".to_string()),
        ("customer_email", request.customer_email.clone()),
        ("client_reference_id", request.order_number.clone()),
        ("line_items[0][quantity]", "1".to_string()),
        ("line_items[0][price_data][currency]", request.currency.to_lowercase()),
        ("line_items[0][price_data][unit_amount]", request.amount.to_string()),
        ("line_items[0][price_data][product_data][name]", request.description.clone()),
        ("success_url", request.success_url.clone()),
        ("cancel_url", request.cancel_url.clone()),
        ("metadata[order_id]", request.order_id.to_string()),
        ("metadata[payment_kind]", request.kind.as_str().to_string()),
        ("payment_intent_data[metadata][order_id]", request.order_id.to_string()),
    ]
}

/// Verify a `Stripe-Signature: t=...,v1=...` header (HMAC-SHA256 over `"{t}.{body}"`).
pub fn verify_signature(payload: &[u8], sig_header: &str, secret: &str, now: i64) -> Result<(), SignatureError> {
    let mut timestamp = "";
    let mut signatures = Vec::new();
    for part in sig_header.split(',') {
        if let Some(t) = part.trim().strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.trim().strip_prefix("v1=") {
            signatures.push(v);
        }
    }
    if timestamp.is_empty() || signatures.is_empty() {
        return Err(SignatureError::Malformed);
    }

    let matched = signatures.iter().any(|sig| {
        let Ok(sig_bytes) = hex::decode(sig) else { return false };
        let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else { return false };
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

/// Map a verified Stripe event to a store outcome.
pub fn interpret_event(event: &serde_json::Value) -> WebhookOutcome {
    let event_type = event["type"].as_str().unwrap_or_default();
    let object = &event["data"]["object"];
    let reference = object["id"].as_str().unwrap_or_default().to_string();
    let Some((order_id, kind)) = order_metadata(&object["metadata"]) else {
        return WebhookOutcome::Ignored(format!("{event_type} without order metadata"));
    };

    match event_type {
        "checkout.session.completed" if object["payment_status"].as_str() == Some("paid") => {
            WebhookOutcome::Succeeded { order_id, kind, reference }
        }
        "checkout.session.async_payment_succeeded" => WebhookOutcome::Succeeded { order_id, kind, reference },
        "checkout.session.expired" | "checkout.session.async_payment_failed" => {
            WebhookOutcome::Failed { order_id, reference }
        }
        other => WebhookOutcome::Ignored(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::PaymentKind;
    use serde_json::json;
    use uuid::Uuid;

    fn sign(payload: &[u8], secret: &str, ts: i64) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{ts}.").as_bytes());
        mac.update(payload);
        format!("t={ts},v1={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn accepts_valid_signature() {
        let body = br#"{"id":"evt_1"}"#;
        let header = sign(body, "whsec_test", 1_700_000_000);
        assert_eq!(verify_signature(body, &header, "whsec_test", 1_700_000_100), Ok(()));
    }

    #[test]
    fn rejects_tampered_body() {
        let header = sign(br#"{"id":"evt_1"}"#, "whsec_test", 1_700_000_000);
        assert_eq!(
            verify_signature(br#"{"id":"evt_2"}"#, &header, "whsec_test", 1_700_000_000),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_stale_timestamp() {
        let body = br#"{"id":"evt_1"}"#;
        let header = sign(body, "whsec_test", 1_700_000_000);
        assert_eq!(verify_signature(body, &header, "whsec_test", 1_700_000_301), Err(SignatureError::Stale));
    }

    #[test]
    fn rejects_malformed_header() {
        assert_eq!(verify_signature(b"{}", "v0=abc", "whsec_test", 0), Err(SignatureError::Malformed));
    }

    #[test]
    fn completed_paid_session_succeeds() {
        let order_id = Uuid::now_v7();
        let event = json!({
            "type": "checkout.session.completed",
            "data": {"object": {
                "id": "cs_test_1",
                "payment_status": "paid",
                "metadata": {"order_id": order_id.to_string(), "payment_kind": "balance"}
            }}
        });
        assert_eq!(
            interpret_event(&event),
            WebhookOutcome::Succeeded { order_id, kind: PaymentKind::Balance, reference: "cs_test_1".into() }
        );
    }

    #[test]
    fn completed_unpaid_session_is_ignored() {
        let event = json!({
            "type": "checkout.session.completed",
            "data": {"object": {"id": "cs_1", "payment_status": "unpaid",
                "metadata": {"order_id": Uuid::now_v7().to_string()}}}
        });
        assert!(matches!(interpret_event(&event), WebhookOutcome::Ignored(_)));
    }

    #[test]
    fn expired_session_fails() {
        let order_id = Uuid::now_v7();
        let event = json!({
            "type": "checkout.session.expired",
            "data": {"object": {"id": "cs_2", "metadata": {"order_id": order_id.to_string()}}}
        });
        assert_eq!(interpret_event(&event), WebhookOutcome::Failed { order_id, reference: "cs_2".into() });
    }

    #[test]
    fn checkout_form_carries_metadata() {
        let request = CheckoutRequest {
            order_id: Uuid::now_v7(),
            order_number: "ORD-20260301-0001".into(),
            kind: PaymentKind::Deposit,
            amount: 74_175,
            currency: "ZAR".into(),
            customer_email: "buyer@example.com".into(),
            description: "Deposit for ORD-20260301-0001".into(),
            success_url: "https://gallery.test/success".into(),
            cancel_url: "https://gallery.test/cancel".into(),
        };
        let form = checkout_form(&request);
        assert!(form.contains(&("line_items[0][price_data][unit_amount]", "74175".to_string())));
        assert!(form.contains(&("line_items[0][price_data][currency]", "zar".to_string())));
        assert!(form.contains(&("metadata[payment_kind]", "deposit".to_string())));
    }
}
