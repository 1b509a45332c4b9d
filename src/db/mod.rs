//! Repository layer.
//!
//! Each repository is a zero-sized struct with async functions that take any
//! Postgres executor (`&PgPool` or `&mut PgConnection` inside a transaction)
//! as the first argument. Row types live next to the repository that reads them.

pub mod artworks;
pub mod cart;
pub mod inquiries;
pub mod invoices;
pub mod newsletter;
pub mod orders;
pub mod updates;
pub mod variants;
pub mod videos;

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub use artworks::ArtworkRepo;
pub use cart::CartRepo;
pub use inquiries::InquiryRepo;
pub use invoices::InvoiceRepo;
pub use newsletter::NewsletterRepo;
pub use orders::OrderRepo;
pub use updates::UpdateRepo;
pub use variants::VariantRepo;
pub use videos::VideoRepo;

pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new().max_connections(max_connections).connect(database_url).await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

const DEFAULT_PER_PAGE: u32 = 20;
const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageParams {
    pub fn page(&self) -> u32 { self.page.unwrap_or(1).max(1) }
    pub fn per_page(&self) -> u32 { self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE) }
    pub fn limit(&self) -> i64 { i64::from(self.per_page()) }
    pub fn offset(&self) -> i64 { i64::from(self.page() - 1) * self.limit() }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: i64, params: PageParams) -> Self {
        Self { data, total, page: params.page(), per_page: params.per_page() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_params_clamp() {
        let p = PageParams { page: Some(0), per_page: Some(500) };
        assert_eq!((p.page(), p.per_page(), p.offset()), (1, 100, 0));
        let p = PageParams { page: Some(3), per_page: None };
        assert_eq!((p.limit(), p.offset()), (20, 40));
    }
}
