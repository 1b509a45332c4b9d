//! Crate error type and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::checkout::PricingError;
use crate::domain::aggregates::{ArtworkError, OrderError};
use crate::domain::UnknownVariant;
use crate::payments::{PaymentError, SignatureError};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("{title}: {source}")]
    Artwork { title: String, source: ArtworkError },

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("Invalid webhook signature: {0}")]
    Signature(#[from] SignatureError),

    #[error("Too many requests, try again later")]
    RateLimited,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }
}

impl From<validator::ValidationErrors> for StoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl From<UnknownVariant> for StoreError {
    fn from(err: UnknownVariant) -> Self {
        Self::Validation(err.to_string())
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            StoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            StoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            StoreError::Pricing(err) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string()),
            StoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            StoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            StoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            StoreError::Order(err) => (StatusCode::CONFLICT, "CONFLICT", err.to_string()),
            StoreError::Artwork { .. } => (StatusCode::CONFLICT, "UNAVAILABLE", self.to_string()),
            StoreError::Signature(err) => {
                tracing::warn!(error = %err, "Rejected webhook delivery");
                (StatusCode::BAD_REQUEST, "INVALID_SIGNATURE", self.to_string())
            }
            StoreError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", self.to_string()),
            StoreError::Payment(err) => match err {
                PaymentError::Disabled(_) => (StatusCode::BAD_REQUEST, "PROVIDER_DISABLED", err.to_string()),
                _ => {
                    tracing::error!(error = %err, "Payment provider error");
                    (StatusCode::BAD_GATEWAY, "PAYMENT_PROVIDER_ERROR", "Payment provider unavailable".to_string())
                }
            },
            StoreError::Database(err) => classify_sqlx_error(err),
            StoreError::Storage(msg) | StoreError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "An internal error occurred".to_string())
            }
        };

        (status, axum::Json(json!({ "error": message, "code": code }))).into_response()
    }
}

/// `RowNotFound` → 404, unique (23505) and foreign key (23503) violations → 409,
/// everything else → 500.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found".to_string()),
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            let constraint = db_err.constraint().unwrap_or("unknown");
            (StatusCode::CONFLICT, "CONFLICT", format!("Duplicate value violates unique constraint: {constraint}"))
        }
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23503") => {
            (StatusCode::CONFLICT, "CONFLICT", "Record is still referenced by other records".to_string())
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "An internal error occurred".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::OrderStatus;

    fn status_of(err: StoreError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn maps_to_fixed_status_codes() {
        assert_eq!(status_of(StoreError::Validation("bad".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(StoreError::Unauthorized("no token".into())), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(StoreError::not_found("Order")), StatusCode::NOT_FOUND);
        assert_eq!(status_of(StoreError::Order(OrderError::Terminal(OrderStatus::Delivered))), StatusCode::CONFLICT);
        assert_eq!(status_of(StoreError::Database(sqlx::Error::RowNotFound)), StatusCode::NOT_FOUND);
        assert_eq!(status_of(StoreError::Internal("boom".into())), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_of(StoreError::Pricing(PricingError::EmptyCart)), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(StoreError::Signature(SignatureError::Mismatch)), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(StoreError::RateLimited), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn body_carries_error_and_code() {
        let resp = StoreError::not_found("Artwork").into_response();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["error"], "Artwork not found");
    }

    #[test]
    fn provider_failure_is_bad_gateway() {
        let err = StoreError::Payment(PaymentError::Rejected { provider: "yoco", message: "declined".into() });
        assert_eq!(status_of(err), StatusCode::BAD_GATEWAY);
    }
}
