//! Admin authentication with Supabase access tokens.
//!
//! The storefront's admin UI signs in through Supabase Auth and sends the
//! resulting access token as `Authorization: Bearer <jwt>`. Tokens are HS256
//! signed with the project's JWT secret; admins are the emails listed in
//! `ADMIN_EMAILS`.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::state::AppState;

const SUPABASE_AUDIENCE: &str = "authenticated";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct AdminUser {
    pub user_id: String,
    pub email: String,
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, StoreError> {
    if secret.is_empty() {
        return Err(StoreError::Unauthorized("Admin authentication is not configured".into()));
    }
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[SUPABASE_AUDIENCE]);
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "Rejected access token");
            StoreError::Unauthorized("Invalid or expired token".into())
        })
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Requires a valid Supabase session whose email is an admin. 401 without a
/// valid token, 403 for non-admins.
pub struct RequireAdmin(pub AdminUser);

#[async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = StoreError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| StoreError::Unauthorized("Missing bearer token".into()))?;
        let claims = verify_token(token, &state.config.supabase.jwt_secret)?;
        let email = claims.email.unwrap_or_default();
        if !state.config.is_admin_email(&email) {
            tracing::warn!(user_id = %claims.sub, "Non-admin attempted admin access");
            return Err(StoreError::Forbidden("Admin access required".into()));
        }
        Ok(RequireAdmin(AdminUser { user_id: claims.sub, email }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, aud: &str, exp: i64) -> String {
        let claims = serde_json::json!({
            "sub": "user-1",
            "email": "curator@gallery.test",
            "role": "authenticated",
            "aud": aud,
            "exp": exp,
        });
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn future() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn accepts_supabase_token() {
        let claims = verify_token(&token("s3cret", "authenticated", future()), "s3cret").unwrap();
        assert_eq!(claims.email.as_deref(), Some("curator@gallery.test"));
    }

    #[test]
    fn rejects_wrong_secret_audience_or_expiry() {
        assert!(verify_token(&token("other", "authenticated", future()), "s3cret").is_err());
        assert!(verify_token(&token("s3cret", "anon", future()), "s3cret").is_err());
        assert!(verify_token(&token("s3cret", "authenticated", 1_000), "s3cret").is_err());
    }

    #[test]
    fn rejects_when_unconfigured() {
        assert!(matches!(verify_token("x", ""), Err(StoreError::Unauthorized(_))));
    }
}
