use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::payments::PaymentGateways;
use crate::rate_limit::RateLimiter;
use crate::services::email::Mailer;
use crate::services::events::EventPublisher;
use crate::services::storage::StorageClient;

/// Shared state handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub payments: PaymentGateways,
    pub mailer: Mailer,
    pub storage: StorageClient,
    pub events: EventPublisher,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(db: PgPool, config: AppConfig, events: EventPublisher) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;

        Ok(Self {
            payments: PaymentGateways::new(http.clone(), &config.stripe, &config.yoco),
            mailer: Mailer::new(http.clone(), config.email.clone()),
            storage: StorageClient::new(http, &config.supabase),
            db,
            config: Arc::new(config),
            events,
            rate_limiter: RateLimiter::new(),
        })
    }
}
