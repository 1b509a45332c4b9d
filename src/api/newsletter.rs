//! Newsletter subscription.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::NewsletterRepo;
use crate::error::{Result, StoreError};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct SubscriptionRequest {
    #[validate(email)]
    pub email: String,
}

impl SubscriptionRequest {
    fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub email: String,
    pub subscribed: bool,
}

/// POST /api/newsletter/subscribe
///
/// 201 for a new address, 200 when a previous unsubscribe is reversed, 409
/// when the address is already subscribed.
pub async fn subscribe(
    State(state): State<AppState>,
    Json(input): Json<SubscriptionRequest>,
) -> Result<(StatusCode, Json<SubscriptionResponse>)> {
    input.validate()?;
    let email = input.normalized_email();

    let status = match NewsletterRepo::find_by_email(&state.db, &email).await? {
        None => {
            NewsletterRepo::insert(&state.db, &email).await?;
            StatusCode::CREATED
        }
        Some(existing) if existing.is_active() => {
            return Err(StoreError::Conflict("Email is already subscribed".into()));
        }
        Some(existing) => {
            NewsletterRepo::resubscribe(&state.db, existing.id).await?;
            StatusCode::OK
        }
    };

    tracing::info!(resubscribed = status == StatusCode::OK, "Newsletter subscription");
    Ok((status, Json(SubscriptionResponse { email, subscribed: true })))
}

/// POST /api/newsletter/unsubscribe
pub async fn unsubscribe(
    State(state): State<AppState>,
    Json(input): Json<SubscriptionRequest>,
) -> Result<Json<SubscriptionResponse>> {
    input.validate()?;
    let email = input.normalized_email();
    NewsletterRepo::unsubscribe(&state.db, &email)
        .await?
        .ok_or(StoreError::not_found("Subscriber"))?;
    tracing::info!("Newsletter unsubscribe");
    Ok(Json(SubscriptionResponse { email, subscribed: false }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_normalized() {
        let req = SubscriptionRequest { email: "  Collector@Example.COM ".into() };
        assert_eq!(req.normalized_email(), "collector@example.com");
    }

    #[test]
    fn invalid_email_is_rejected() {
        assert!(SubscriptionRequest { email: "not-an-email".into() }.validate().is_err());
    }
}
