//! Repository for the `artwork_variants` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::VariantKind;

const COLUMNS: &str = "\
    id, artwork_id, name, kind, price_adjustment, processing_days, active, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ArtworkVariant {
    pub id: Uuid,
    pub artwork_id: Uuid,
    pub name: String,
    pub kind: String,
    pub price_adjustment: i64,
    pub processing_days: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VariantInput {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub kind: VariantKind,
    #[serde(default)]
    pub price_adjustment: i64,
    #[serde(default)]
    #[validate(range(min = 0, max = 365))]
    pub processing_days: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

pub struct VariantRepo;

impl VariantRepo {
    pub async fn list_for_artwork(
        db: impl PgExecutor<'_>,
        artwork_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<ArtworkVariant>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM artwork_variants \
             WHERE artwork_id = $1 AND (active OR $2) \
             ORDER BY price_adjustment, name"
        );
        sqlx::query_as::<_, ArtworkVariant>(&query)
            .bind(artwork_id)
            .bind(include_inactive)
            .fetch_all(db)
            .await
    }

    pub async fn find_many(db: impl PgExecutor<'_>, ids: &[Uuid]) -> Result<Vec<ArtworkVariant>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM artwork_variants WHERE id = ANY($1)");
        sqlx::query_as::<_, ArtworkVariant>(&query).bind(ids).fetch_all(db).await
    }

    pub async fn create(
        db: impl PgExecutor<'_>,
        artwork_id: Uuid,
        input: &VariantInput,
    ) -> Result<ArtworkVariant, sqlx::Error> {
        let query = format!(
            "INSERT INTO artwork_variants (id, artwork_id, name, kind, price_adjustment, processing_days, active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ArtworkVariant>(&query)
            .bind(Uuid::now_v7())
            .bind(artwork_id)
            .bind(&input.name)
            .bind(input.kind.as_str())
            .bind(input.price_adjustment)
            .bind(input.processing_days)
            .bind(input.active)
            .fetch_one(db)
            .await
    }

    pub async fn update(
        db: impl PgExecutor<'_>,
        id: Uuid,
        input: &VariantInput,
    ) -> Result<Option<ArtworkVariant>, sqlx::Error> {
        let query = format!(
            "UPDATE artwork_variants SET \
                 name = $2, kind = $3, price_adjustment = $4, processing_days = $5, active = $6, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ArtworkVariant>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.kind.as_str())
            .bind(input.price_adjustment)
            .bind(input.processing_days)
            .bind(input.active)
            .fetch_optional(db)
            .await
    }

    pub async fn delete(db: impl PgExecutor<'_>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM artwork_variants WHERE id = $1").bind(id).execute(db).await?;
        Ok(result.rows_affected() > 0)
    }
}
