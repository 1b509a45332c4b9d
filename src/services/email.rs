//! Transactional email via the Resend REST API.
//!
//! Sends are best effort: callers use [`Mailer::send_or_log`] so an email
//! failure is logged and never turns a successful request into an error.

use serde::Serialize;

use crate::config::EmailConfig;
use crate::domain::value_objects::format_cents;

const RESEND_URL: &str = "https://api.resend.com/emails";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Clone)]
pub struct Mailer {
    http: reqwest::Client,
    config: EmailConfig,
}

impl Mailer {
    pub fn new(http: reqwest::Client, config: EmailConfig) -> Self {
        Self { http, config }
    }

    pub fn is_enabled(&self) -> bool {
        !self.config.resend_api_key.is_empty()
    }

    pub fn gallery_inbox(&self) -> Option<&str> {
        Some(self.config.gallery_inbox.as_str()).filter(|s| !s.is_empty())
    }

    pub async fn send(&self, email: &Email) -> Result<(), BoxError> {
        let resp = self
            .http
            .post(RESEND_URL)
            .bearer_auth(&self.config.resend_api_key)
            .json(&serde_json::json!({
                "from": self.config.from,
                "to": [email.to],
                "subject": email.subject,
                "html": email.html,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("Resend returned {status}: {body}").into());
        }
        Ok(())
    }

    pub async fn send_or_log(&self, email: Email) {
        if !self.is_enabled() {
            tracing::debug!(to = %email.to, subject = %email.subject, "Email disabled, skipping send");
            return;
        }
        match self.send(&email).await {
            Ok(()) => tracing::info!(to = %email.to, subject = %email.subject, "Email sent"),
            Err(e) => tracing::warn!(error = %e, to = %email.to, subject = %email.subject, "Email send failed"),
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

pub fn order_received(gallery: &str, to: &str, order_number: &str, total: i64, currency: &str, track_url: &str) -> Email {
    Email {
        to: to.to_string(),
        subject: format!("{gallery}: payment received for order {order_number}"),
        html: format!(
            "<p>Thank you for your order <strong>{}</strong>.</p>\
             <p>Order total: {}</p>\
             <p>You can follow its progress at <a href=\"{}\">{}</a>.</p>",
            escape(order_number),
            format_cents(total, currency),
            escape(track_url),
            escape(track_url),
        ),
    }
}

pub fn order_status_changed(gallery: &str, to: &str, order_number: &str, status: &str, message: Option<&str>, tracking_number: Option<&str>) -> Email {
    let mut html = format!("<p>Your order <strong>{}</strong> is now <strong>{}</strong>.</p>", escape(order_number), escape(status));
    if let Some(message) = message {
        html.push_str(&format!("<p>{}</p>", escape(message)));
    }
    if let Some(tracking) = tracking_number {
        html.push_str(&format!("<p>Tracking number: {}</p>", escape(tracking)));
    }
    Email { to: to.to_string(), subject: format!("{gallery}: order {order_number} {status}"), html }
}

pub fn inquiry_received(to: &str, kind: &str, name: &str, email: &str, message: &str, artwork: Option<&str>) -> Email {
    let artwork_line = artwork.map(|a| format!("<p>Artwork: {}</p>", escape(a))).unwrap_or_default();
    Email {
        to: to.to_string(),
        subject: format!("New {kind} inquiry from {name}"),
        html: format!(
            "<p>From: {} &lt;{}&gt;</p>{}<p>{}</p>",
            escape(name),
            escape(email),
            artwork_line,
            escape(message).replace('\n', "<br>"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inquiry_email_escapes_customer_text() {
        let email = inquiry_received("gallery@example.com", "preorder", "Ana", "ana@example.com", "<b>hi</b>\nthere", Some("Dusk"));
        assert_eq!(email.subject, "New preorder inquiry from Ana");
        assert!(email.html.contains("&lt;b&gt;hi&lt;/b&gt;<br>there"));
        assert!(email.html.contains("Artwork: Dusk"));
    }

    #[test]
    fn status_email_includes_tracking() {
        let email = order_status_changed("Gallery", "a@b.c", "ORD-1", "shipped", None, Some("TRK123"));
        assert!(email.html.contains("TRK123"));
        assert_eq!(email.subject, "Gallery: order ORD-1 shipped");
    }

    #[tokio::test]
    async fn disabled_mailer_skips_quietly() {
        let mailer = Mailer::new(reqwest::Client::new(), EmailConfig::default());
        assert!(!mailer.is_enabled());
        mailer.send_or_log(order_received("G", "a@b.c", "ORD-1", 100, "ZAR", "http://x")).await;
    }
}
