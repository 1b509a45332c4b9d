//! Gallery Commerce
//!
//! Storefront and admin backend for a contemporary art gallery.
//!
//! ## Features
//! - Artwork catalogue with priced variants and videos
//! - Session carts and checkout with Stripe or Yoco, in full or by deposit
//! - Webhook-driven payment status, stock and order updates
//! - Order tracking and admin order management
//! - Invoice PDFs stored in Supabase Storage
//! - Inquiries and preorders, news updates, newsletter

pub mod api;
pub mod auth;
pub mod checkout;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod invoice;
pub mod payments;
pub mod rate_limit;
pub mod services;
pub mod state;

pub use config::AppConfig;
pub use error::{Result, StoreError};
pub use state::AppState;
