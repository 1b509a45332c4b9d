//! Fixed-window rate limiting keyed by client IP, per route scope.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::StoreError;
use crate::state::AppState;

struct IpEntry {
    count: u32,
    window_start: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub const fn per_minute(max_requests: u32) -> Self {
        Self { max_requests, window: Duration::from_secs(60) }
    }
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    /// scope -> (IP -> entry)
    inner: Arc<Mutex<HashMap<&'static str, HashMap<String, IpEntry>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the request is allowed, `false` if rate-limited.
    pub async fn check(&self, scope: &'static str, ip: &str, policy: RateLimitPolicy) -> bool {
        self.check_at(scope, ip, policy, Instant::now()).await
    }

    pub async fn check_at(&self, scope: &'static str, ip: &str, policy: RateLimitPolicy, now: Instant) -> bool {
        let mut map = self.inner.lock().await;
        let entry = map
            .entry(scope)
            .or_default()
            .entry(ip.to_owned())
            .or_insert_with(|| IpEntry { count: 0, window_start: now });

        if now.saturating_duration_since(entry.window_start) >= policy.window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count = entry.count.saturating_add(1);
        entry.count <= policy.max_requests
    }

    /// Drops entries whose window opened more than `max_age` before `now`.
    pub async fn sweep_at(&self, max_age: Duration, now: Instant) -> usize {
        let mut map = self.inner.lock().await;
        let mut removed = 0;
        for scope_map in map.values_mut() {
            let before = scope_map.len();
            scope_map.retain(|_, entry| now.saturating_duration_since(entry.window_start) < max_age);
            removed += before - scope_map.len();
        }
        map.retain(|_, scope_map| !scope_map.is_empty());
        removed
    }

    pub async fn tracked(&self) -> usize {
        self.inner.lock().await.values().map(HashMap::len).sum()
    }
}

/// Sweeps the limiter every `every`, dropping entries older than `max_age`.
pub fn spawn_sweeper(limiter: RateLimiter, every: Duration, max_age: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let removed = limiter.sweep_at(max_age, Instant::now()).await;
            if removed > 0 {
                tracing::debug!(removed, "Swept rate limiter entries");
            }
        }
    })
}

/// X-Forwarded-For first entry, then the peer address.
pub fn client_ip(request: &Request) -> String {
    if let Some(first) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
    {
        let ip = first.trim();
        if !ip.is_empty() {
            return ip.to_owned();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

async fn limit(state: &AppState, scope: &'static str, policy: RateLimitPolicy, request: Request, next: Next) -> Response {
    let ip = client_ip(&request);
    if !state.rate_limiter.check(scope, &ip, policy).await {
        tracing::warn!(scope, ip = %ip, "Rate limit exceeded");
        return StoreError::RateLimited.into_response();
    }
    next.run(request).await
}

pub async fn checkout_rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let policy = state.config.rate_limits.checkout;
    limit(&state, "checkout", policy, request, next).await
}

pub async fn inquiry_rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let policy = state.config.rate_limits.inquiries;
    limit(&state, "inquiries", policy, request, next).await
}

pub async fn newsletter_rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let policy = state.config.rate_limits.newsletter;
    limit(&state, "newsletter", policy, request, next).await
}

pub async fn tracking_rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let policy = state.config.rate_limits.tracking;
    limit(&state, "tracking", policy, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: RateLimitPolicy = RateLimitPolicy { max_requests: 3, window: Duration::from_secs(60) };

    #[tokio::test]
    async fn nth_request_allowed_next_rejected() {
        let limiter = RateLimiter::new();
        let t0 = Instant::now();
        for _ in 0..3 {
            assert!(limiter.check_at("inquiries", "10.0.0.1", POLICY, t0).await);
        }
        assert!(!limiter.check_at("inquiries", "10.0.0.1", POLICY, t0 + Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn window_resets() {
        let limiter = RateLimiter::new();
        let t0 = Instant::now();
        for _ in 0..4 {
            limiter.check_at("inquiries", "10.0.0.1", POLICY, t0).await;
        }
        assert!(limiter.check_at("inquiries", "10.0.0.1", POLICY, t0 + Duration::from_secs(60)).await);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = RateLimiter::new();
        let t0 = Instant::now();
        for _ in 0..3 {
            limiter.check_at("inquiries", "10.0.0.1", POLICY, t0).await;
        }
        assert!(limiter.check_at("inquiries", "10.0.0.2", POLICY, t0).await);
        assert!(limiter.check_at("newsletter", "10.0.0.1", POLICY, t0).await);
    }

    #[tokio::test]
    async fn sweep_drops_stale_entries() {
        let limiter = RateLimiter::new();
        let t0 = Instant::now();
        limiter.check_at("checkout", "10.0.0.1", POLICY, t0).await;
        limiter.check_at("checkout", "10.0.0.2", POLICY, t0 + Duration::from_secs(200)).await;
        let removed = limiter.sweep_at(Duration::from_secs(300), t0 + Duration::from_secs(301)).await;
        assert_eq!(removed, 1);
        assert_eq!(limiter.tracked().await, 1);
    }
}
