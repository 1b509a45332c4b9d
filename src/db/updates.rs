//! Repository for the `updates` table (gallery news posts).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;
use validator::Validate;

const COLUMNS: &str = "\
    id, title, slug, excerpt, body, cover_image, published, published_at, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Update {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub body: String,
    pub cover_image: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 120))]
    pub slug: Option<String>,
    #[validate(length(max = 500))]
    pub excerpt: Option<String>,
    #[validate(length(min = 1))]
    pub body: String,
    pub cover_image: Option<String>,
    #[serde(default)]
    pub published: bool,
}

pub struct UpdateRepo;

impl UpdateRepo {
    pub async fn list_published(db: impl PgExecutor<'_>, limit: i64, offset: i64) -> Result<Vec<Update>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM updates WHERE published \
             ORDER BY published_at DESC NULLS LAST, created_at DESC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Update>(&query).bind(limit).bind(offset).fetch_all(db).await
    }

    pub async fn count_published(db: impl PgExecutor<'_>) -> Result<i64, sqlx::Error> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM updates WHERE published").fetch_one(db).await?;
        Ok(total)
    }

    pub async fn list_all(db: impl PgExecutor<'_>) -> Result<Vec<Update>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM updates ORDER BY created_at DESC");
        sqlx::query_as::<_, Update>(&query).fetch_all(db).await
    }

    pub async fn find_published_by_slug(db: impl PgExecutor<'_>, slug: &str) -> Result<Option<Update>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM updates WHERE slug = $1 AND published");
        sqlx::query_as::<_, Update>(&query).bind(slug).fetch_optional(db).await
    }

    pub async fn find_by_id(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<Update>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM updates WHERE id = $1");
        sqlx::query_as::<_, Update>(&query).bind(id).fetch_optional(db).await
    }

    pub async fn create(db: impl PgExecutor<'_>, slug: &str, input: &UpdateInput) -> Result<Update, sqlx::Error> {
        let query = format!(
            "INSERT INTO updates (id, title, slug, excerpt, body, cover_image, published, published_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, CASE WHEN $7 THEN NOW() END) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Update>(&query)
            .bind(Uuid::now_v7())
            .bind(&input.title)
            .bind(slug)
            .bind(&input.excerpt)
            .bind(&input.body)
            .bind(&input.cover_image)
            .bind(input.published)
            .fetch_one(db)
            .await
    }

    /// `published_at` is stamped the first time a post is published and kept after that.
    pub async fn update(db: impl PgExecutor<'_>, id: Uuid, slug: &str, input: &UpdateInput) -> Result<Option<Update>, sqlx::Error> {
        let query = format!(
            "UPDATE updates SET \
                 title = $2, slug = $3, excerpt = $4, body = $5, cover_image = $6, published = $7, \
                 published_at = CASE WHEN $7 THEN COALESCE(published_at, NOW()) ELSE published_at END, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Update>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(slug)
            .bind(&input.excerpt)
            .bind(&input.body)
            .bind(&input.cover_image)
            .bind(input.published)
            .fetch_optional(db)
            .await
    }

    pub async fn delete(db: impl PgExecutor<'_>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM updates WHERE id = $1").bind(id).execute(db).await?;
        Ok(result.rows_affected() > 0)
    }
}
