//! Repository for the `artworks` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::{ArtworkStatus, Scale, StockLevel};

const COLUMNS: &str = "\
    id, title, slug, description, medium, dimensions, year, scale, price, stock, \
    images, status, featured, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Artwork {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub medium: Option<String>,
    pub dimensions: Option<String>,
    pub year: Option<i32>,
    pub scale: String,
    pub price: i64,
    pub stock: i32,
    pub images: Vec<String>,
    pub status: String,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Artwork {
    /// Unknown status text is treated as unavailable.
    pub fn stock_level(&self) -> StockLevel {
        StockLevel::new(self.stock, self.status.parse().unwrap_or(ArtworkStatus::Sold))
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ArtworkInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 120))]
    pub slug: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 200))]
    pub medium: Option<String>,
    #[validate(length(max = 120))]
    pub dimensions: Option<String>,
    #[validate(range(min = 1000, max = 3000))]
    pub year: Option<i32>,
    pub scale: Scale,
    #[validate(range(min = 0))]
    pub price: i64,
    #[validate(range(min = 0))]
    pub stock: i32,
    #[serde(default)]
    pub images: Vec<String>,
    pub status: Option<ArtworkStatus>,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ArtworkFilter {
    pub status: Option<ArtworkStatus>,
    pub scale: Option<Scale>,
    pub featured: Option<bool>,
    pub search: Option<String>,
}

const FILTER: &str = "\
    WHERE ($1::text IS NULL OR status = $1) \
      AND ($2::text IS NULL OR scale = $2) \
      AND ($3::boolean IS NULL OR featured = $3) \
      AND ($4::text IS NULL OR title ILIKE '%' || $4 || '%' OR medium ILIKE '%' || $4 || '%')";

pub struct ArtworkRepo;

impl ArtworkRepo {
    pub async fn list(
        db: impl PgExecutor<'_>,
        filter: &ArtworkFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Artwork>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM artworks {FILTER} \
             ORDER BY featured DESC, created_at DESC LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, Artwork>(&query)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.scale.map(|s| s.as_str()))
            .bind(filter.featured)
            .bind(filter.search.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(db)
            .await
    }

    pub async fn count(db: impl PgExecutor<'_>, filter: &ArtworkFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM artworks {FILTER}");
        let (total,): (i64,) = sqlx::query_as(&query)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.scale.map(|s| s.as_str()))
            .bind(filter.featured)
            .bind(filter.search.as_deref())
            .fetch_one(db)
            .await?;
        Ok(total)
    }

    pub async fn find_by_id(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<Artwork>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM artworks WHERE id = $1");
        sqlx::query_as::<_, Artwork>(&query).bind(id).fetch_optional(db).await
    }

    pub async fn find_by_slug(db: impl PgExecutor<'_>, slug: &str) -> Result<Option<Artwork>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM artworks WHERE slug = $1");
        sqlx::query_as::<_, Artwork>(&query).bind(slug).fetch_optional(db).await
    }

    pub async fn find_many(db: impl PgExecutor<'_>, ids: &[Uuid]) -> Result<Vec<Artwork>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM artworks WHERE id = ANY($1)");
        sqlx::query_as::<_, Artwork>(&query).bind(ids).fetch_all(db).await
    }

    /// Row-locks the artworks for the rest of the transaction.
    pub async fn lock_many(db: impl PgExecutor<'_>, ids: &[Uuid]) -> Result<Vec<Artwork>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM artworks WHERE id = ANY($1) ORDER BY id FOR UPDATE");
        sqlx::query_as::<_, Artwork>(&query).bind(ids).fetch_all(db).await
    }

    pub async fn create(db: impl PgExecutor<'_>, slug: &str, input: &ArtworkInput) -> Result<Artwork, sqlx::Error> {
        let query = format!(
            "INSERT INTO artworks \
                 (id, title, slug, description, medium, dimensions, year, scale, price, stock, images, status, featured) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Artwork>(&query)
            .bind(Uuid::now_v7())
            .bind(&input.title)
            .bind(slug)
            .bind(&input.description)
            .bind(&input.medium)
            .bind(&input.dimensions)
            .bind(input.year)
            .bind(input.scale.as_str())
            .bind(input.price)
            .bind(input.stock)
            .bind(&input.images)
            .bind(input.status.unwrap_or(ArtworkStatus::Available).as_str())
            .bind(input.featured)
            .fetch_one(db)
            .await
    }

    pub async fn update(
        db: impl PgExecutor<'_>,
        id: Uuid,
        slug: &str,
        input: &ArtworkInput,
    ) -> Result<Option<Artwork>, sqlx::Error> {
        let query = format!(
            "UPDATE artworks SET \
                 title = $2, slug = $3, description = $4, medium = $5, dimensions = $6, year = $7, \
                 scale = $8, price = $9, stock = $10, images = $11, status = COALESCE($12, status), \
                 featured = $13, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Artwork>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(slug)
            .bind(&input.description)
            .bind(&input.medium)
            .bind(&input.dimensions)
            .bind(input.year)
            .bind(input.scale.as_str())
            .bind(input.price)
            .bind(input.stock)
            .bind(&input.images)
            .bind(input.status.map(|s| s.as_str()))
            .bind(input.featured)
            .fetch_optional(db)
            .await
    }

    pub async fn set_stock(db: impl PgExecutor<'_>, id: Uuid, level: StockLevel) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE artworks SET stock = $2, status = $3, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(level.stock)
            .bind(level.status.as_str())
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn delete(db: impl PgExecutor<'_>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM artworks WHERE id = $1").bind(id).execute(db).await?;
        Ok(result.rows_affected() > 0)
    }
}
