//! HTTP surface tests that run without a database.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use hmac::{Hmac, Mac};
use sqlx::PgPool;
use sha2::Sha256;
use tower::ServiceExt;
use uuid::Uuid;

use common::{body_json, build_test_app, build_test_app_with, token_for, ADMIN_EMAIL, STRIPE_WEBHOOK_SECRET};

fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn stripe_signature(payload: &[u8], ts: i64) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(STRIPE_WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(format!("{ts}.").as_bytes());
    mac.update(payload);
    format!("t={ts},v1={}", hex::encode(mac.finalize().into_bytes()))
}

#[tokio::test]
async fn health_is_ok() {
    let app = build_test_app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let app = build_test_app();
    let response = app
        .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_route_without_token_is_401() {
    let app = build_test_app();
    let response = app
        .oneshot(Request::builder().uri("/api/admin/orders").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn admin_route_for_non_admin_is_403() {
    let app = build_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/inquiries")
                .header(header::AUTHORIZATION, format!("Bearer {}", token_for("visitor@example.com")))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_upload_rejects_non_images() {
    let app = build_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/admin/uploads/portraits")
                .header(header::AUTHORIZATION, format!("Bearer {}", token_for(ADMIN_EMAIL)))
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("hello"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn unsigned_webhooks_are_400() {
    let app = build_test_app();
    let body = serde_json::json!({"type": "checkout.session.completed"});

    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/webhooks/stripe", body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_SIGNATURE");

    let response = app.oneshot(json_request(Method::POST, "/api/webhooks/yoco", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tampered_stripe_webhook_is_400() {
    let app = build_test_app();
    let signature = stripe_signature(br#"{"type":"a"}"#, chrono::Utc::now().timestamp());
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/webhooks/stripe")
                .header("stripe-signature", signature)
                .body(Body::from(r#"{"type":"b"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signed_event_without_order_is_acknowledged() {
    let app = build_test_app();
    let payload = br#"{"id":"evt_1","type":"customer.created","data":{"object":{"id":"cus_1"}}}"#;
    let signature = stripe_signature(payload, chrono::Utc::now().timestamp());
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/webhooks/stripe")
                .header("stripe-signature", signature)
                .body(Body::from(&payload[..]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["received"], true);
}

fn signed_stripe_request(payload: String) -> Request<Body> {
    let signature = stripe_signature(payload.as_bytes(), chrono::Utc::now().timestamp());
    Request::builder()
        .method(Method::POST)
        .uri("/api/webhooks/stripe")
        .header("stripe-signature", signature)
        .body(Body::from(payload))
        .unwrap()
}

#[sqlx::test]
#[ignore = "needs Postgres at DATABASE_URL"]
async fn paid_session_for_unknown_order_is_acknowledged(pool: PgPool) {
    let app = build_test_app_with(pool.clone());
    let order_id = Uuid::now_v7();
    let event = serde_json::json!({
        "id": "evt_unknown",
        "type": "checkout.session.completed",
        "data": {"object": {
            "id": "cs_test_unknown",
            "payment_status": "paid",
            "metadata": {"order_id": order_id.to_string(), "payment_kind": "full"}
        }}
    });

    let response = app.clone().oneshot(signed_stripe_request(event.to_string())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["received"], true);

    let expired = serde_json::json!({
        "id": "evt_expired",
        "type": "checkout.session.expired",
        "data": {"object": {"id": "cs_test_unknown", "metadata": {"order_id": order_id.to_string()}}}
    });
    let response = app.oneshot(signed_stripe_request(expired.to_string())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let updates: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_updates WHERE order_id = $1")
        .bind(order_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(updates, 0);
}

#[tokio::test]
async fn checkout_with_disabled_provider_is_400() {
    let app = build_test_app();
    let body = serde_json::json!({
        "customer_name": "Thandi Nkosi",
        "customer_email": "thandi@example.com",
        "country": "ZA",
        "items": [{"artwork_id": "0190f0e0-0000-7000-8000-000000000001", "quantity": 1}],
        "payment_provider": "yoco"
    });
    let response = app.oneshot(json_request(Method::POST, "/api/checkout", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "PROVIDER_DISABLED");
}

#[tokio::test]
async fn tracking_requires_both_fields() {
    let app = build_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/orders/track?order_number=&email=buyer@example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn newsletter_is_rate_limited_per_ip() {
    let app = build_test_app();
    let request = |ip: &str| {
        Request::builder()
            .method(Method::POST)
            .uri("/api/newsletter/subscribe")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", ip)
            .body(Body::from(r#"{"email":"not-an-email"}"#))
            .unwrap()
    };

    // invalid emails are rejected before the database, so each allowed call is a 400
    for _ in 0..3 {
        let response = app.clone().oneshot(request("203.0.113.7")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
    let response = app.clone().oneshot(request("203.0.113.7")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(response).await["code"], "RATE_LIMITED");

    let response = app.oneshot(request("203.0.113.8")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
