//! Repository for the `videos` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;
use validator::Validate;

const COLUMNS: &str = "id, title, url, thumbnail_url, artwork_id, position, published, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Video {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub artwork_id: Option<Uuid>,
    pub position: i32,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VideoInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(url)]
    pub url: String,
    #[validate(url)]
    pub thumbnail_url: Option<String>,
    pub artwork_id: Option<Uuid>,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub published: bool,
}

pub struct VideoRepo;

impl VideoRepo {
    pub async fn list(db: impl PgExecutor<'_>, include_unpublished: bool) -> Result<Vec<Video>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM videos WHERE published OR $1 ORDER BY position, created_at DESC"
        );
        sqlx::query_as::<_, Video>(&query).bind(include_unpublished).fetch_all(db).await
    }

    pub async fn create(db: impl PgExecutor<'_>, input: &VideoInput) -> Result<Video, sqlx::Error> {
        let query = format!(
            "INSERT INTO videos (id, title, url, thumbnail_url, artwork_id, position, published) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(Uuid::now_v7())
            .bind(&input.title)
            .bind(&input.url)
            .bind(&input.thumbnail_url)
            .bind(input.artwork_id)
            .bind(input.position)
            .bind(input.published)
            .fetch_one(db)
            .await
    }

    pub async fn update(db: impl PgExecutor<'_>, id: Uuid, input: &VideoInput) -> Result<Option<Video>, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET \
                 title = $2, url = $3, thumbnail_url = $4, artwork_id = $5, position = $6, published = $7, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.url)
            .bind(&input.thumbnail_url)
            .bind(input.artwork_id)
            .bind(input.position)
            .bind(input.published)
            .fetch_optional(db)
            .await
    }

    pub async fn delete(db: impl PgExecutor<'_>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1").bind(id).execute(db).await?;
        Ok(result.rows_affected() > 0)
    }
}
