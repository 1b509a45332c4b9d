//! Service configuration loaded from environment variables.

use anyhow::{anyhow, Context};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;

use crate::checkout::PricingConfig;
use crate::domain::value_objects::CountryCode;
use crate::rate_limit::RateLimitPolicy;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Storefront base URL, used for payment redirect targets.
    pub public_site_url: String,
    /// Empty means permissive CORS.
    pub cors_origins: Vec<String>,
    pub gallery_name: String,
    pub pricing: PricingConfig,
    pub stripe: StripeConfig,
    pub yoco: YocoConfig,
    pub supabase: SupabaseConfig,
    pub email: EmailConfig,
    pub admin_emails: Vec<String>,
    pub nats_url: Option<String>,
    pub rate_limits: RateLimits,
}

#[derive(Debug, Clone, Default)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
}

#[derive(Debug, Clone, Default)]
pub struct YocoConfig {
    pub secret_key: String,
    pub webhook_secret: String,
}

#[derive(Debug, Clone, Default)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_role_key: String,
    pub jwt_secret: String,
    pub invoice_bucket: String,
    pub artwork_bucket: String,
}

#[derive(Debug, Clone, Default)]
pub struct EmailConfig {
    /// Resend API key; email is disabled when empty.
    pub resend_api_key: String,
    pub from: String,
    /// Inbox that receives inquiry and order notifications.
    pub gallery_inbox: String,
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimits {
    pub checkout: RateLimitPolicy,
    pub inquiries: RateLimitPolicy,
    pub newsletter: RateLimitPolicy,
    pub tracking: RateLimitPolicy,
    pub sweep_interval: Duration,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            checkout: RateLimitPolicy::per_minute(10),
            inquiries: RateLimitPolicy::per_minute(5),
            newsletter: RateLimitPolicy::per_minute(5),
            tracking: RateLimitPolicy::per_minute(20),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty()).unwrap_or_else(|| default.to_string())
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse::<T>().map_err(|e| anyhow!("{name} is invalid: {e}")),
        _ => Ok(default),
    }
}

fn list_var(name: &str) -> Vec<String> {
    std::env::var(name)
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn per_minute_var(name: &str, default: u32) -> anyhow::Result<RateLimitPolicy> {
    Ok(RateLimitPolicy::per_minute(parse_var(name, default)?))
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// Only `DATABASE_URL` is mandatory. Providers whose keys are missing are
    /// reported as disabled at start-up and rejected at checkout.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let home_country = var_or("HOME_COUNTRY", "ZA");
        let pricing = PricingConfig {
            currency: var_or("STORE_CURRENCY", "ZAR").to_uppercase(),
            home_country: CountryCode::new(&home_country)
                .ok_or_else(|| anyhow!("HOME_COUNTRY '{home_country}' is not a two-letter code"))?,
            domestic_shipping: parse_var("DOMESTIC_SHIPPING_CENTS", 15_000)?,
            free_shipping_threshold: parse_var("FREE_SHIPPING_THRESHOLD_CENTS", 500_000)?,
            international_shipping: parse_var("INTERNATIONAL_SHIPPING_CENTS", 85_000)?,
            vat_rate: parse_var("VAT_RATE", Decimal::new(15, 2))?,
            vat_exempt_international: parse_var("VAT_EXEMPT_INTERNATIONAL", true)?,
            deposit_balance_due_days: parse_var("DEPOSIT_BALANCE_DUE_DAYS", 30)?,
        };

        let rate_limits = RateLimits {
            checkout: per_minute_var("RATE_LIMIT_CHECKOUT_PER_MIN", 10)?,
            inquiries: per_minute_var("RATE_LIMIT_INQUIRIES_PER_MIN", 5)?,
            newsletter: per_minute_var("RATE_LIMIT_NEWSLETTER_PER_MIN", 5)?,
            tracking: per_minute_var("RATE_LIMIT_TRACKING_PER_MIN", 20)?,
            sweep_interval: Duration::from_secs(parse_var("RATE_LIMIT_SWEEP_SECS", 60)?),
        };

        Ok(Self {
            database_url,
            host: var_or("HOST", "0.0.0.0"),
            port: parse_var("PORT", 8083)?,
            public_site_url: var_or("PUBLIC_SITE_URL", "http://localhost:3000").trim_end_matches('/').to_string(),
            cors_origins: list_var("CORS_ORIGINS").into_iter().filter(|o| o != "*").collect(),
            gallery_name: var_or("GALLERY_NAME", "The Gallery"),
            pricing,
            stripe: StripeConfig {
                secret_key: var_or("STRIPE_SECRET_KEY", ""),
                webhook_secret: var_or("STRIPE_WEBHOOK_SECRET", ""),
            },
            yoco: YocoConfig {
                secret_key: var_or("YOCO_SECRET_KEY", ""),
                webhook_secret: var_or("YOCO_WEBHOOK_SECRET", ""),
            },
            supabase: SupabaseConfig {
                url: var_or("SUPABASE_URL", "").trim_end_matches('/').to_string(),
                service_role_key: var_or("SUPABASE_SERVICE_ROLE_KEY", ""),
                jwt_secret: var_or("SUPABASE_JWT_SECRET", ""),
                invoice_bucket: var_or("INVOICE_BUCKET", "invoices"),
                artwork_bucket: var_or("ARTWORK_BUCKET", "artworks"),
            },
            email: EmailConfig {
                resend_api_key: var_or("RESEND_API_KEY", ""),
                from: var_or("EMAIL_FROM", "Gallery <orders@localhost>"),
                gallery_inbox: var_or("GALLERY_EMAIL", ""),
            },
            admin_emails: list_var("ADMIN_EMAILS").into_iter().map(|e| e.to_lowercase()).collect(),
            nats_url: std::env::var("NATS_URL").ok().filter(|u| !u.trim().is_empty()),
            rate_limits,
        })
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|a| *a == email)
    }
}
