//! Gallery Commerce - storefront and admin API

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gallery_commerce::domain::aggregates::PaymentProvider;
use gallery_commerce::rate_limit::spawn_sweeper;
use gallery_commerce::services::events::EventPublisher;
use gallery_commerce::{api, db, AppConfig, AppState};

const REQUEST_ID: &str = "x-request-id";

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    if origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }
    let origins = origins
        .iter()
        .map(|o| HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin '{o}'")))
        .collect::<Result<Vec<_>>>()?;
    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers(Any))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let pool = db::connect(&config.database_url, 10).await.context("connecting to Postgres")?;
    db::run_migrations(&pool).await.context("running migrations")?;
    tracing::info!("Database ready");

    let events = EventPublisher::connect(config.nats_url.as_deref()).await;
    let addr = format!("{}:{}", config.host, config.port);
    let cors = cors_layer(&config.cors_origins)?;
    let sweep_every = config.rate_limits.sweep_interval;

    let state = AppState::new(pool, config, events).context("building HTTP client")?;
    for provider in PaymentProvider::ALL {
        tracing::info!(provider = %provider, enabled = state.payments.is_enabled(*provider), "Payment provider");
    }
    if !state.mailer.is_enabled() {
        tracing::warn!("RESEND_API_KEY not set, emails will be skipped");
    }
    spawn_sweeper(state.rate_limiter.clone(), sweep_every, sweep_every.max(Duration::from_secs(60)) * 2);

    let request_id = HeaderName::from_static(REQUEST_ID);
    let app = api::router(state)
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "Gallery Commerce listening");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
