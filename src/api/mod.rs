//! HTTP surface: JSON route handlers and the router that mounts them.
//!
//! Public storefront routes live under `/api`, admin routes under
//! `/api/admin` behind [`RequireAdmin`](crate::auth::RequireAdmin). Checkout,
//! inquiries, the newsletter and order tracking are rate limited per client IP.

pub mod artworks;
pub mod cart;
pub mod checkout;
pub mod inquiries;
pub mod newsletter;
pub mod orders;
pub mod updates;
pub mod uploads;
pub mod videos;
pub mod webhooks;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};

use crate::rate_limit::{checkout_rate_limit, inquiry_rate_limit, newsletter_rate_limit, tracking_rate_limit};
use crate::state::AppState;

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Builds the full application router.
///
/// ```text
/// GET  /health
/// GET  /api/artworks, /api/artworks/:id, /api/artworks/:id/variants
/// GET  /api/videos
/// *    /api/cart/:session[/items/:item_id]
/// POST /api/checkout/quote, /api/checkout, /api/orders/:id/balance
/// GET  /api/orders/track
/// POST /api/inquiries
/// GET  /api/updates, /api/updates/:slug
/// POST /api/newsletter/subscribe, /api/newsletter/unsubscribe
/// POST /api/webhooks/stripe, /api/webhooks/yoco
/// *    /api/admin/...
/// ```
pub fn router(state: AppState) -> Router {
    let checkout = Router::new()
        .route("/api/checkout", post(checkout::place_order))
        .route("/api/orders/:id/balance", post(checkout::pay_balance))
        .route_layer(middleware::from_fn_with_state(state.clone(), checkout_rate_limit));

    let inquiries = Router::new()
        .route("/api/inquiries", post(inquiries::create_inquiry))
        .route_layer(middleware::from_fn_with_state(state.clone(), inquiry_rate_limit));

    let newsletter = Router::new()
        .route("/api/newsletter/subscribe", post(newsletter::subscribe))
        .route("/api/newsletter/unsubscribe", post(newsletter::unsubscribe))
        .route_layer(middleware::from_fn_with_state(state.clone(), newsletter_rate_limit));

    let tracking = Router::new()
        .route("/api/orders/track", get(orders::track_order))
        .route_layer(middleware::from_fn_with_state(state.clone(), tracking_rate_limit));

    let public = Router::new()
        .route("/health", get(health))
        .route("/api/artworks", get(artworks::list_artworks))
        .route("/api/artworks/:id", get(artworks::get_artwork))
        .route("/api/artworks/:id/variants", get(artworks::list_variants))
        .route("/api/videos", get(videos::list_videos))
        .route("/api/cart/:session", get(cart::get_cart).post(cart::add_item).delete(cart::clear_cart))
        .route("/api/cart/:session/items/:item_id", patch(cart::update_item).delete(cart::remove_item))
        .route("/api/checkout/quote", post(checkout::quote))
        .route("/api/updates", get(updates::list_published))
        .route("/api/updates/:slug", get(updates::get_published))
        .route("/api/webhooks/stripe", post(webhooks::stripe_webhook))
        .route("/api/webhooks/yoco", post(webhooks::yoco_webhook));

    Router::new()
        .merge(public)
        .merge(checkout)
        .merge(inquiries)
        .merge(newsletter)
        .merge(tracking)
        .nest("/api/admin", admin_router())
        .with_state(state)
}

fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/artworks", get(artworks::admin_list_artworks).post(artworks::create_artwork))
        .route("/artworks/:id", put(artworks::update_artwork).delete(artworks::delete_artwork))
        .route("/artworks/:id/variants", get(artworks::admin_list_variants).post(artworks::create_variant))
        .route("/variants/:id", put(artworks::update_variant).delete(artworks::delete_variant))
        .route("/videos", get(videos::admin_list_videos).post(videos::create_video))
        .route("/videos/:id", put(videos::update_video).delete(videos::delete_video))
        .route("/orders", get(orders::list_orders))
        .route("/orders/:id", get(orders::get_order))
        .route("/orders/:id/status", patch(orders::update_status))
        .route("/orders/:id/invoice", post(orders::generate_invoice))
        .route("/orders/:id/invoices", get(orders::list_invoices))
        .route("/inquiries", get(inquiries::list_inquiries))
        .route("/inquiries/:id/status", patch(inquiries::update_status))
        .route("/updates", get(updates::admin_list).post(updates::create_update))
        .route("/updates/:id", get(updates::admin_get).put(updates::edit_update).delete(updates::delete_update))
        .route(
            "/uploads/:folder",
            post(uploads::upload_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy", "service": "gallery-commerce"}))
}
